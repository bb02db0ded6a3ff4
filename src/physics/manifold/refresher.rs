//! Frame-to-frame refresh of persistent contacts.

use crate::config::CollisionDetectionSettings;
use crate::physics::contact::{Contact, ContactSupplementData};
use crate::physics::math::RigidTransform;

/// Refresh `contacts` against the bodies' current transforms.
///
/// Each contact's anchors are rebuilt from the local offsets cached in
/// `supplement_data`. A contact whose anchors slid apart laterally by more
/// than the invalidation length, or separated beyond the maximum contact
/// distance, is reported for removal; every other contact gets its position
/// moved to the anchors' midpoint and its depth recomputed. Normals are left
/// untouched.
///
/// Returns the indices to remove in ascending order. Compacting the arrays is
/// up to the caller.
pub fn contact_refresh(
    contacts: &mut [Contact],
    supplement_data: &[ContactSupplementData],
    transform_a: &RigidTransform,
    transform_b: &RigidTransform,
    settings: &CollisionDetectionSettings,
) -> Vec<usize> {
    let mut to_remove = Vec::new();
    contact_refresh_into(
        contacts,
        supplement_data,
        transform_a,
        transform_b,
        settings,
        &mut to_remove,
    );
    to_remove
}

/// Same as [`contact_refresh`], appending removal indices to `to_remove`.
pub fn contact_refresh_into(
    contacts: &mut [Contact],
    supplement_data: &[ContactSupplementData],
    transform_a: &RigidTransform,
    transform_b: &RigidTransform,
    settings: &CollisionDetectionSettings,
    to_remove: &mut Vec<usize>,
) {
    debug_assert_eq!(contacts.len(), supplement_data.len());

    for (i, (contact, supplement)) in contacts.iter_mut().zip(supplement_data).enumerate() {
        let anchor_a = transform_a.transform_point(supplement.local_offset_a);
        let anchor_b = transform_b.transform_point(supplement.local_offset_b);

        let ab = anchor_b - anchor_a;
        let along_normal = ab.dot(contact.normal);
        let lateral = ab - contact.normal * along_normal;
        if lateral.length_squared() > settings.contact_invalidation_length_squared {
            to_remove.push(i);
            continue;
        }

        let depth = supplement.base_penetration_depth - along_normal;
        if depth < -settings.maximum_contact_distance {
            to_remove.push(i);
            continue;
        }

        contact.position = (anchor_a + anchor_b) * 0.5;
        contact.penetration_depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::contact::ContactData;
    use glam::{Quat, Vec3};

    fn single_contact(depth: f32) -> (Vec<Contact>, Vec<ContactSupplementData>) {
        let contact = Contact::from(&ContactData::new(Vec3::ZERO, Vec3::Y, depth));
        let supplement = ContactSupplementData {
            local_offset_a: Vec3::ZERO,
            local_offset_b: Vec3::ZERO,
            base_penetration_depth: depth,
        };
        (vec![contact], vec![supplement])
    }

    #[test]
    fn test_refresh_lateral_slide_invalidates() {
        let settings = CollisionDetectionSettings::default();
        let (mut contacts, supplement) = single_contact(0.01);

        let slide = settings.contact_invalidation_length_squared.sqrt() * 1.5;
        let ta = RigidTransform::IDENTITY;
        let tb = RigidTransform::from_position(Vec3::new(slide, 0.0, 0.0));

        let removed = contact_refresh(&mut contacts, &supplement, &ta, &tb, &settings);
        assert_eq!(removed, vec![0]);
    }

    #[test]
    fn test_refresh_depth_follows_normal_motion() {
        let settings = CollisionDetectionSettings::default();
        let (mut contacts, supplement) = single_contact(0.01);

        let delta = 0.004;
        let ta = RigidTransform::IDENTITY;
        let tb = RigidTransform::from_position(Vec3::new(0.0, delta, 0.0));

        let removed = contact_refresh(&mut contacts, &supplement, &ta, &tb, &settings);
        assert!(removed.is_empty());
        assert!(
            (contacts[0].penetration_depth - (0.01 - delta)).abs() < 1e-6,
            "depth = {}",
            contacts[0].penetration_depth
        );
        assert!((contacts[0].position - Vec3::new(0.0, delta * 0.5, 0.0)).length() < 1e-6);
        assert_eq!(contacts[0].normal, Vec3::Y);
    }

    #[test]
    fn test_refresh_separation_beyond_max_distance() {
        let settings = CollisionDetectionSettings::default();
        let (mut contacts, supplement) = single_contact(0.0);

        let ta = RigidTransform::IDENTITY;
        let tb = RigidTransform::from_position(Vec3::new(
            0.0,
            settings.maximum_contact_distance + 0.05,
            0.0,
        ));

        let removed = contact_refresh(&mut contacts, &supplement, &ta, &tb, &settings);
        assert_eq!(removed, vec![0]);
    }

    #[test]
    fn test_refresh_uses_rotated_offsets() {
        let settings = CollisionDetectionSettings::default();
        let mut contacts = vec![Contact::from(&ContactData::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::Y,
            0.02,
        ))];
        let supplement = vec![ContactSupplementData {
            local_offset_a: Vec3::new(1.0, 0.0, 0.0),
            local_offset_b: Vec3::new(1.0, 0.0, 0.0),
            base_penetration_depth: 0.02,
        }];

        // Both bodies rotate together about Y; the contact travels with them.
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let ta = RigidTransform::new(Vec3::ZERO, rotation);
        let tb = RigidTransform::new(Vec3::ZERO, rotation);

        let removed = contact_refresh(&mut contacts, &supplement, &ta, &tb, &settings);
        assert!(removed.is_empty());
        assert!((contacts[0].position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!((contacts[0].penetration_depth - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_refresh_reports_ascending_indices() {
        let settings = CollisionDetectionSettings::default();
        let mut contacts = Vec::new();
        let mut supplement = Vec::new();
        for x in [0.0, 1.0, 2.0] {
            let p = Vec3::new(x, 0.0, 0.0);
            contacts.push(Contact::from(&ContactData::new(p, Vec3::Y, 0.01)));
            supplement.push(ContactSupplementData {
                local_offset_a: p,
                local_offset_b: p,
                base_penetration_depth: 0.01,
            });
        }

        // Tilting B moves its far anchors laterally more than its near one.
        let tb = RigidTransform::new(Vec3::ZERO, Quat::from_rotation_y(0.2));
        let removed = contact_refresh(
            &mut contacts,
            &supplement,
            &RigidTransform::IDENTITY,
            &tb,
            &settings,
        );
        assert_eq!(removed, vec![1, 2]);
    }
}
