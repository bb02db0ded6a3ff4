//! Contact data structures shared by the manifold kernel and the contact constraint.

use glam::Vec3;

use super::math::RigidTransform;

/// A contact candidate produced by narrow-phase testing for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactData {
    /// Contact position in world space.
    pub position: Vec3,
    /// Contact normal (unit, from shape A outward toward shape B).
    pub normal: Vec3,
    /// Penetration depth. Positive when overlapping.
    pub penetration_depth: f32,
    /// Feature id used to match contacts across frames, if the test provides one.
    pub id: Option<u32>,
}

impl ContactData {
    pub fn new(position: Vec3, normal: Vec3, penetration_depth: f32) -> Self {
        Self {
            position,
            normal,
            penetration_depth,
            id: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }
}

/// A persistent contact point stored in a manifold across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Contact position in world space.
    pub position: Vec3,
    /// Contact normal (unit, from shape A outward toward shape B).
    pub normal: Vec3,
    /// Penetration depth. Positive when overlapping.
    pub penetration_depth: f32,
    /// Feature id, if any.
    pub id: Option<u32>,
    /// Accumulated normal impulse.
    pub normal_impulse: f32,
    /// Accumulated tangent impulses (two friction directions).
    pub tangent_impulse: [f32; 2],
}

impl Contact {
    /// Whether `candidate` describes the same contact feature.
    ///
    /// Ids decide when both sides carry one; otherwise the points must be
    /// closer than `threshold_squared`.
    #[inline]
    pub fn matches(&self, candidate: &ContactData, threshold_squared: f32) -> bool {
        match (self.id, candidate.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.position.distance_squared(candidate.position) < threshold_squared,
        }
    }

    /// Take the geometry of `data`, keeping the accumulated impulses.
    pub fn set_geometry(&mut self, data: &ContactData) {
        self.position = data.position;
        self.normal = data.normal;
        self.penetration_depth = data.penetration_depth;
        self.id = data.id;
    }
}

impl From<&ContactData> for Contact {
    fn from(data: &ContactData) -> Self {
        Self {
            position: data.position,
            normal: data.normal,
            penetration_depth: data.penetration_depth,
            id: data.id,
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
        }
    }
}

/// Per-contact state cached when a contact is created, used by refresh.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactSupplementData {
    /// Contact point in body A's local frame.
    pub local_offset_a: Vec3,
    /// Contact point in body B's local frame.
    pub local_offset_b: Vec3,
    /// Penetration depth at creation.
    pub base_penetration_depth: f32,
}

impl ContactSupplementData {
    /// Anchor `position` in both bodies' local frames.
    pub fn new(
        position: Vec3,
        penetration_depth: f32,
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
    ) -> Self {
        Self {
            local_offset_a: transform_a.inverse_transform_point(position),
            local_offset_b: transform_b.inverse_transform_point(position),
            base_penetration_depth: penetration_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_by_id() {
        let contact = Contact::from(&ContactData::new(Vec3::ZERO, Vec3::Y, 0.1).with_id(3));
        let far_same_id = ContactData::new(Vec3::splat(5.0), Vec3::Y, 0.1).with_id(3);
        let near_other_id = ContactData::new(Vec3::ZERO, Vec3::Y, 0.1).with_id(4);

        assert!(contact.matches(&far_same_id, 0.001));
        assert!(!contact.matches(&near_other_id, 0.001));
    }

    #[test]
    fn test_match_by_proximity_without_id() {
        let contact = Contact::from(&ContactData::new(Vec3::ZERO, Vec3::Y, 0.1));
        let near = ContactData::new(Vec3::new(0.01, 0.0, 0.0), Vec3::Y, 0.1).with_id(9);
        let far = ContactData::new(Vec3::new(0.1, 0.0, 0.0), Vec3::Y, 0.1);

        assert!(contact.matches(&near, 0.001));
        assert!(!contact.matches(&far, 0.001));
    }

    #[test]
    fn test_set_geometry_keeps_impulses() {
        let mut contact = Contact::from(&ContactData::new(Vec3::ZERO, Vec3::Y, 0.1));
        contact.normal_impulse = 2.0;
        contact.tangent_impulse = [0.5, -0.5];

        contact.set_geometry(&ContactData::new(Vec3::X, Vec3::Z, 0.3));
        assert_eq!(contact.position, Vec3::X);
        assert_eq!(contact.normal, Vec3::Z);
        assert_eq!(contact.normal_impulse, 2.0);
        assert_eq!(contact.tangent_impulse, [0.5, -0.5]);
    }

    #[test]
    fn test_supplement_local_offsets() {
        let ta = RigidTransform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let tb = RigidTransform::from_position(Vec3::new(0.0, 2.0, 0.0));
        let supplement = ContactSupplementData::new(Vec3::new(1.0, 1.0, 0.0), 0.05, &ta, &tb);

        assert_eq!(supplement.local_offset_a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(supplement.local_offset_b, Vec3::new(1.0, -1.0, 0.0));
        assert_eq!(supplement.base_penetration_depth, 0.05);
    }
}
