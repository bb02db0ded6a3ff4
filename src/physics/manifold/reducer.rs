//! Reduction of oversized contact sets to at most four extremal points.
//!
//! Both entry points run the same extremal search over a virtual point list
//! (existing contacts first, then candidates): the deepest point, the point
//! farthest from it, and the two points with minimum and maximum projection on
//! the axis perpendicular to both the deepest-farthest span and the reference
//! normal. Those points keep the manifold's torque-relevant extent.
//!
//! The reference normal is the deepest point's normal. A summed normal that
//! cancels out falls back to the first usable normal, then `+Y`.

use glam::Vec3;

use crate::error::SolverError;
use crate::physics::contact::{Contact, ContactData};

/// Squared length under which a summed normal counts as cancelled out.
const NORMAL_EPSILON: f32 = 1e-7;
/// Squared distance under which two points count as coincident.
const COINCIDENT_EPSILON: f32 = 1e-9;

/// Outcome of [`reduce_contacts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactReduction {
    /// Indices of existing contacts to drop, in descending order so they can
    /// be removed one after another without invalidating the rest.
    pub to_remove: Vec<usize>,
    /// Candidates to add to the manifold.
    pub to_add: Vec<ContactData>,
    /// Normal the extremal search was performed against.
    pub reference_normal: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct ManifoldPoint {
    position: Vec3,
    normal: Vec3,
    depth: f32,
}

impl From<&Contact> for ManifoldPoint {
    fn from(contact: &Contact) -> Self {
        Self {
            position: contact.position,
            normal: contact.normal,
            depth: contact.penetration_depth,
        }
    }
}

impl From<&ContactData> for ManifoldPoint {
    fn from(data: &ContactData) -> Self {
        Self {
            position: data.position,
            normal: data.normal,
            depth: data.penetration_depth,
        }
    }
}

/// Indices of the retained points within a virtual point list.
#[derive(Debug, Clone, Copy)]
struct Extremes {
    deepest: usize,
    /// `None` when every point coincides with the deepest one.
    farthest: Option<usize>,
    min_y: usize,
    max_y: usize,
    normal: Vec3,
}

impl Extremes {
    #[inline]
    fn contains(&self, index: usize) -> bool {
        match self.farthest {
            Some(farthest) => {
                index == self.deepest
                    || index == farthest
                    || index == self.min_y
                    || index == self.max_y
            }
            None => index == self.deepest,
        }
    }
}

/// Extremal search shared by both reducers. `points` must not be empty.
/// Ties go to the lowest index.
fn find_extremes(points: &[ManifoldPoint]) -> Extremes {
    let mut deepest = 0;
    let mut normal_sum = Vec3::ZERO;
    for (i, point) in points.iter().enumerate() {
        normal_sum += point.normal;
        if point.depth > points[deepest].depth {
            deepest = i;
        }
    }

    // The deepest point always survives, so its normal keeps the axes stable
    // when a reduced set is reduced again.
    let deepest_normal = points[deepest].normal;
    let normal = if normal_sum.length_squared() > NORMAL_EPSILON {
        if deepest_normal.length_squared() > NORMAL_EPSILON {
            deepest_normal.normalize()
        } else {
            normal_sum.normalize()
        }
    } else {
        // Opposing normals cancelled; any real normal still gives a usable axis.
        let fallback = points
            .iter()
            .map(|point| point.normal)
            .find(|n| n.length_squared() > NORMAL_EPSILON)
            .map_or(Vec3::Y, Vec3::normalize);
        tracing::trace!(?fallback, "contact normals cancelled, using fallback normal");
        fallback
    };

    let origin = points[deepest].position;
    let mut farthest = None;
    let mut farthest_distance = COINCIDENT_EPSILON;
    for (i, point) in points.iter().enumerate() {
        let distance = point.position.distance_squared(origin);
        if distance > farthest_distance {
            farthest_distance = distance;
            farthest = Some(i);
        }
    }

    let Some(farthest_index) = farthest else {
        return Extremes {
            deepest,
            farthest: None,
            min_y: deepest,
            max_y: deepest,
            normal,
        };
    };

    let x_axis = points[farthest_index].position - origin;
    let y_axis = x_axis.cross(normal);

    let mut min_y = 0;
    let mut max_y = 0;
    let mut min_dot = points[0].position.dot(y_axis);
    let mut max_dot = min_dot;
    for (i, point) in points.iter().enumerate().skip(1) {
        let dot = point.position.dot(y_axis);
        if dot < min_dot {
            min_dot = dot;
            min_y = i;
        }
        if dot > max_dot {
            max_dot = dot;
            max_y = i;
        }
    }

    Extremes {
        deepest,
        farthest,
        min_y,
        max_y,
        normal,
    }
}

/// Reduce `contacts` plus `candidates` to their extremal points.
///
/// Existing contacts that are not extremal are listed for removal and
/// extremal candidates are listed for addition; the retained set never holds
/// more than four points. When all points coincide only the deepest one
/// survives.
///
/// Returns [`SolverError::EmptyContactSet`] when both inputs are empty.
pub fn reduce_contacts(
    contacts: &[Contact],
    candidates: &[ContactData],
) -> Result<ContactReduction, SolverError> {
    if contacts.is_empty() && candidates.is_empty() {
        return Err(SolverError::EmptyContactSet);
    }

    let points: Vec<ManifoldPoint> = contacts
        .iter()
        .map(ManifoldPoint::from)
        .chain(candidates.iter().map(ManifoldPoint::from))
        .collect();
    let extremes = find_extremes(&points);

    let to_remove = (0..contacts.len())
        .rev()
        .filter(|&i| !extremes.contains(i))
        .collect();
    let to_add = candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| extremes.contains(contacts.len() + i))
        .map(|(_, candidate)| *candidate)
        .collect();

    Ok(ContactReduction {
        to_remove,
        to_add,
        reference_normal: extremes.normal,
    })
}

/// Decide whether `candidate` earns a place in a full four-contact manifold.
///
/// Returns the index of the contact the candidate replaces, or `None` if the
/// candidate is not extremal and the manifold stays as it is. Selection is
/// identical to [`reduce_contacts`] over the same five points; when several
/// existing contacts lose their extremal status, the lowest-index one is
/// replaced.
pub fn reduce_contacts_with_candidate(
    contacts: &[Contact; 4],
    candidate: &ContactData,
) -> Option<usize> {
    let points = [
        ManifoldPoint::from(&contacts[0]),
        ManifoldPoint::from(&contacts[1]),
        ManifoldPoint::from(&contacts[2]),
        ManifoldPoint::from(&contacts[3]),
        ManifoldPoint::from(candidate),
    ];
    let extremes = find_extremes(&points);

    if !extremes.contains(4) {
        return None;
    }
    (0..4).find(|&i| !extremes.contains(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(position: Vec3, depth: f32) -> Contact {
        Contact::from(&ContactData::new(position, Vec3::Y, depth))
    }

    fn square_manifold() -> Vec<Contact> {
        vec![
            contact(Vec3::new(-1.0, 0.0, -1.0), 0.05),
            contact(Vec3::new(1.0, 0.0, -1.0), 0.02),
            contact(Vec3::new(1.0, 0.0, 1.0), 0.02),
            contact(Vec3::new(-1.0, 0.0, 1.0), 0.02),
        ]
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let result = reduce_contacts(&[], &[]);
        assert!(matches!(result, Err(SolverError::EmptyContactSet)));
    }

    #[test]
    fn test_interior_candidate_is_rejected() {
        let contacts = square_manifold();
        let interior = ContactData::new(Vec3::new(0.1, 0.0, 0.2), Vec3::Y, 0.01);

        let reduction = reduce_contacts(&contacts, &[interior]).unwrap();
        assert!(reduction.to_add.is_empty());
        assert!(reduction.to_remove.is_empty());
    }

    #[test]
    fn test_reduction_is_bounded() {
        // Ring of points: at most four may survive.
        let candidates: Vec<ContactData> = (0..12)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 12.0;
                ContactData::new(
                    Vec3::new(angle.cos(), 0.0, angle.sin()),
                    Vec3::Y,
                    0.01 + i as f32 * 0.001,
                )
            })
            .collect();
        let contacts = vec![
            contact(Vec3::new(0.2, 0.0, 0.1), 0.0),
            contact(Vec3::new(-0.3, 0.0, 0.0), 0.0),
        ];

        let reduction = reduce_contacts(&contacts, &candidates).unwrap();
        let retained = contacts.len() - reduction.to_remove.len() + reduction.to_add.len();
        assert!(retained >= 2 && retained <= 4, "retained = {retained}");
        assert_eq!(reduction.to_remove, vec![1, 0], "Interior contacts dropped");
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let candidates: Vec<ContactData> = [
            (Vec3::new(0.0, 0.0, 0.0), 0.04),
            (Vec3::new(2.0, 0.0, 0.1), 0.01),
            (Vec3::new(1.0, 0.0, 1.5), 0.02),
            (Vec3::new(1.0, 0.0, -1.2), 0.01),
            (Vec3::new(0.8, 0.0, 0.2), 0.03),
            (Vec3::new(1.2, 0.0, -0.3), 0.0),
        ]
        .into_iter()
        .map(|(p, d)| ContactData::new(p, Vec3::Y, d))
        .collect();

        let first = reduce_contacts(&[], &candidates).unwrap();
        assert_eq!(first.to_add.len(), 4);

        let reduced: Vec<Contact> = first.to_add.iter().map(Contact::from).collect();
        let second = reduce_contacts(&reduced, &[]).unwrap();
        assert!(second.to_remove.is_empty(), "Nothing further removed");
        assert!(second.to_add.is_empty());
    }

    #[test]
    fn test_reduction_is_idempotent_with_tilted_normals() {
        let candidates: Vec<ContactData> = [
            (Vec3::new(0.0, 0.1, 0.0), Vec3::new(0.3, 1.0, 0.0), 0.02),
            (Vec3::new(1.5, -0.2, 0.3), Vec3::new(-0.5, 1.0, 0.2), 0.01),
            (Vec3::new(0.7, 0.3, 1.2), Vec3::new(0.0, 1.0, 0.6), 0.05),
            (Vec3::new(0.9, -0.3, -1.0), Vec3::new(0.4, 1.0, -0.4), 0.03),
            (Vec3::new(0.4, 0.2, 0.1), Vec3::new(-0.6, 1.0, -0.1), 0.0),
            (Vec3::new(1.1, 0.0, -0.2), Vec3::new(0.2, 1.0, 0.5), 0.04),
        ]
        .into_iter()
        .map(|(p, n, d)| ContactData::new(p, n.normalize(), d))
        .collect();

        let first = reduce_contacts(&[], &candidates).unwrap();
        let kept = first.to_add.len();
        assert!((2..=4).contains(&kept), "kept = {kept}");
        assert!(
            (first.reference_normal - candidates[2].normal).length() < 1e-6,
            "Deepest point's normal is the reference"
        );

        let reduced: Vec<Contact> = first.to_add.iter().map(Contact::from).collect();
        let second = reduce_contacts(&reduced, &[]).unwrap();
        assert!(second.to_remove.is_empty(), "removed {:?}", second.to_remove);
        assert!(second.to_add.is_empty());
        assert!((second.reference_normal - first.reference_normal).length() < 1e-6);
    }

    #[test]
    fn test_coincident_points_keep_deepest() {
        let contacts = vec![contact(Vec3::ONE, 0.01), contact(Vec3::ONE, 0.03)];
        let candidates = vec![
            ContactData::new(Vec3::ONE, Vec3::Y, 0.02),
            ContactData::new(Vec3::ONE, Vec3::Y, 0.05),
        ];

        let reduction = reduce_contacts(&contacts, &candidates).unwrap();
        assert_eq!(reduction.to_remove, vec![1, 0]);
        assert_eq!(reduction.to_add, vec![candidates[1]]);
    }

    #[test]
    fn test_single_point_kept() {
        let reduction = reduce_contacts(&[contact(Vec3::ZERO, 0.01)], &[]).unwrap();
        assert!(reduction.to_remove.is_empty());
        assert!(reduction.to_add.is_empty());
    }

    #[test]
    fn test_cancelling_normals_fall_back() {
        let contacts = vec![
            Contact::from(&ContactData::new(Vec3::new(0.0, 0.0, 0.0), Vec3::Y, 0.01)),
            Contact::from(&ContactData::new(Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_Y, 0.02)),
        ];
        let candidate = ContactData::new(Vec3::new(0.5, 0.0, 1.0), Vec3::X, 0.01);

        let reduction = reduce_contacts(&contacts, &[candidate]).unwrap();
        assert!(reduction.reference_normal.length_squared() > 0.5);
        assert!(reduction.reference_normal.is_finite());

        // Fully cancelled sum: the first real normal is used.
        let candidates = vec![
            ContactData::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X, 0.0),
            ContactData::new(Vec3::new(1.0, 0.0, 1.0), Vec3::NEG_X, 0.0),
        ];
        let reduction = reduce_contacts(&contacts, &candidates).unwrap();
        assert_eq!(reduction.reference_normal, Vec3::Y);
        let retained = contacts.len() - reduction.to_remove.len() + reduction.to_add.len();
        assert!(retained <= 4);
    }

    #[test]
    fn test_zero_normals_use_up_axis() {
        let candidates = vec![
            ContactData::new(Vec3::ZERO, Vec3::ZERO, 0.0),
            ContactData::new(Vec3::X, Vec3::ZERO, 0.0),
        ];
        let reduction = reduce_contacts(&[], &candidates).unwrap();
        assert_eq!(reduction.reference_normal, Vec3::Y);
        assert_eq!(reduction.to_add.len(), 2);
    }

    #[test]
    fn test_specialized_accepts_outlying_candidate() {
        let contacts: [Contact; 4] = [
            contact(Vec3::new(0.0, 0.0, 0.0), 0.05),
            contact(Vec3::new(1.0, 0.0, 0.0), 0.01),
            contact(Vec3::new(0.5, 0.0, 0.1), 0.01),
            contact(Vec3::new(0.5, 0.0, -0.5), 0.01),
        ];
        let candidate = ContactData::new(Vec3::new(0.5, 0.0, 2.0), Vec3::Y, 0.0);

        let replaced = reduce_contacts_with_candidate(&contacts, &candidate);
        assert_eq!(replaced, Some(2));
    }

    #[test]
    fn test_specialized_rejects_interior_candidate() {
        let contacts: [Contact; 4] = square_manifold().try_into().unwrap();
        let candidate = ContactData::new(Vec3::new(0.0, 0.0, 0.3), Vec3::Y, 0.0);
        assert_eq!(reduce_contacts_with_candidate(&contacts, &candidate), None);
    }

    #[test]
    fn test_specialized_matches_general() {
        let layouts: [[(Vec3, f32); 5]; 4] = [
            [
                (Vec3::new(0.0, 0.0, 0.0), 0.05),
                (Vec3::new(1.0, 0.0, 0.0), 0.01),
                (Vec3::new(0.5, 0.0, 0.1), 0.01),
                (Vec3::new(0.5, 0.0, -0.5), 0.01),
                (Vec3::new(0.5, 0.0, 2.0), 0.0),
            ],
            [
                (Vec3::new(-1.0, 0.0, -1.0), 0.02),
                (Vec3::new(1.0, 0.0, -1.0), 0.02),
                (Vec3::new(1.0, 0.0, 1.0), 0.02),
                (Vec3::new(-1.0, 0.0, 1.0), 0.02),
                (Vec3::new(0.0, 0.0, 0.0), 0.08),
            ],
            // Ties everywhere: equal depths and symmetric spread.
            [
                (Vec3::new(0.0, 0.0, 0.0), 0.01),
                (Vec3::new(1.0, 0.0, 0.0), 0.01),
                (Vec3::new(0.0, 0.0, 1.0), 0.01),
                (Vec3::new(1.0, 0.0, 1.0), 0.01),
                (Vec3::new(0.5, 0.0, 0.5), 0.01),
            ],
            [
                (Vec3::new(0.0, 0.0, 0.0), 0.01),
                (Vec3::new(0.0, 0.0, 0.0), 0.02),
                (Vec3::new(0.0, 0.0, 0.0), 0.03),
                (Vec3::new(0.0, 0.0, 0.0), 0.04),
                (Vec3::new(0.0, 0.0, 0.0), 0.05),
            ],
        ];

        for layout in layouts {
            let contacts: [Contact; 4] = [
                contact(layout[0].0, layout[0].1),
                contact(layout[1].0, layout[1].1),
                contact(layout[2].0, layout[2].1),
                contact(layout[3].0, layout[3].1),
            ];
            let candidate = ContactData::new(layout[4].0, Vec3::Y, layout[4].1);

            let general = reduce_contacts(&contacts, &[candidate]).unwrap();
            let specialized = reduce_contacts_with_candidate(&contacts, &candidate);

            match specialized {
                Some(replaced) => {
                    assert_eq!(general.to_add, vec![candidate]);
                    assert!(general.to_remove.contains(&replaced));
                    assert_eq!(replaced, *general.to_remove.last().unwrap());
                }
                None => assert!(general.to_add.is_empty()),
            }
        }
    }
}
