//! Persistent contact manifolds.
//!
//! A manifold owns the contacts of one shape pair together with their
//! supplement data, index for index. Each frame it refreshes the existing
//! contacts against the bodies' new transforms, merges the narrow phase's
//! candidates in, and reduces the result back to a bounded set.

mod reducer;
mod refresher;

pub use reducer::{reduce_contacts, reduce_contacts_with_candidate, ContactReduction};
pub use refresher::{contact_refresh, contact_refresh_into};

use crate::config::CollisionDetectionSettings;
use crate::error::SolverError;
use crate::physics::contact::{Contact, ContactData, ContactSupplementData};
use crate::physics::math::RigidTransform;
use crate::pool::ResourcePool;

/// What one manifold update did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifoldChange {
    pub added: usize,
    pub removed: usize,
}

/// Persistent contacts between two shapes.
#[derive(Debug, Clone, Default)]
pub struct ContactManifold {
    contacts: Vec<Contact>,
    supplement_data: Vec<ContactSupplementData>,
}

impl ContactManifold {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Mutable access to the contacts. The slice cannot change length, so
    /// supplement data stays aligned.
    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }

    pub fn supplement_data(&self) -> &[ContactSupplementData] {
        &self.supplement_data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
        self.supplement_data.clear();
    }

    /// Refresh every contact and drop the invalidated ones.
    ///
    /// Returns the number of contacts removed.
    pub fn refresh(
        &mut self,
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
        settings: &CollisionDetectionSettings,
        pool: &ResourcePool,
    ) -> usize {
        let mut to_remove: Vec<usize> = pool.acquire();
        contact_refresh_into(
            &mut self.contacts,
            &self.supplement_data,
            transform_a,
            transform_b,
            settings,
            &mut to_remove,
        );
        for &index in to_remove.iter().rev() {
            self.remove_at(index);
        }
        let removed = to_remove.len();
        pool.release(to_remove);
        removed
    }

    /// Merge `candidates` into the manifold without refreshing first.
    ///
    /// Candidates matching an existing contact overwrite its geometry and
    /// keep its accumulated impulses. The rest are appended while the
    /// manifold has room, and reduced otherwise. Feature ids stay unique:
    /// a candidate always goes to the contact already holding its id, and
    /// a later candidate in the batch replaces an earlier one with the same id.
    pub fn add_candidates(
        &mut self,
        candidates: &[ContactData],
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
        settings: &CollisionDetectionSettings,
        pool: &ResourcePool,
    ) -> Result<ManifoldChange, SolverError> {
        let mut unmatched: Vec<ContactData> = pool.acquire();
        let threshold_squared = settings.contact_minimum_separation_distance_squared;

        for candidate in candidates {
            match self.find_match(candidate, threshold_squared) {
                Some(index) => {
                    self.contacts[index].set_geometry(candidate);
                    self.supplement_data[index] = ContactSupplementData::new(
                        candidate.position,
                        candidate.penetration_depth,
                        transform_a,
                        transform_b,
                    );
                    if let Some(id) = candidate.id {
                        unmatched.retain(|other| other.id != Some(id));
                    }
                }
                None => {
                    let pending = candidate
                        .id
                        .and_then(|id| unmatched.iter().position(|other| other.id == Some(id)));
                    match pending {
                        Some(index) => unmatched[index] = *candidate,
                        None => unmatched.push(*candidate),
                    }
                }
            }
        }

        let result = self.insert_unmatched(&unmatched, transform_a, transform_b, settings);
        pool.release(unmatched);
        result
    }

    /// Refresh, then merge `candidates`. The full per-frame maintenance step.
    pub fn update(
        &mut self,
        candidates: &[ContactData],
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
        settings: &CollisionDetectionSettings,
        pool: &ResourcePool,
    ) -> Result<ManifoldChange, SolverError> {
        let refreshed_away = self.refresh(transform_a, transform_b, settings, pool);
        let mut change =
            self.add_candidates(candidates, transform_a, transform_b, settings, pool)?;
        change.removed += refreshed_away;
        Ok(change)
    }

    /// Contact `candidate` belongs to. The holder of its id wins over any
    /// contact that is merely close.
    fn find_match(&self, candidate: &ContactData, threshold_squared: f32) -> Option<usize> {
        if let Some(id) = candidate.id {
            if let Some(index) = self.contacts.iter().position(|c| c.id == Some(id)) {
                return Some(index);
            }
        }
        self.contacts
            .iter()
            .position(|contact| contact.matches(candidate, threshold_squared))
    }

    fn insert_unmatched(
        &mut self,
        unmatched: &[ContactData],
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
        settings: &CollisionDetectionSettings,
    ) -> Result<ManifoldChange, SolverError> {
        let mut change = ManifoldChange::default();
        if unmatched.is_empty() {
            return Ok(change);
        }

        if self.contacts.len() + unmatched.len() <= settings.max_contacts {
            for candidate in unmatched {
                self.push(candidate, transform_a, transform_b);
            }
            change.added = unmatched.len();
            return Ok(change);
        }

        let full = <&[Contact; 4]>::try_from(self.contacts.as_slice());
        if let (Ok(full), [candidate]) = (full, unmatched) {
            if let Some(index) = reduce_contacts_with_candidate(full, candidate) {
                self.remove_at(index);
                self.push(candidate, transform_a, transform_b);
                change.added = 1;
                change.removed = 1;
            }
            return Ok(change);
        }

        let reduction = reduce_contacts(&self.contacts, unmatched)?;
        tracing::trace!(
            removed = reduction.to_remove.len(),
            added = reduction.to_add.len(),
            "reduced contact manifold"
        );
        for &index in &reduction.to_remove {
            self.remove_at(index);
        }
        for candidate in &reduction.to_add {
            self.push(candidate, transform_a, transform_b);
        }
        change.added = reduction.to_add.len();
        change.removed = reduction.to_remove.len();
        Ok(change)
    }

    fn push(
        &mut self,
        data: &ContactData,
        transform_a: &RigidTransform,
        transform_b: &RigidTransform,
    ) {
        self.contacts.push(Contact::from(data));
        self.supplement_data.push(ContactSupplementData::new(
            data.position,
            data.penetration_depth,
            transform_a,
            transform_b,
        ));
    }

    fn remove_at(&mut self, index: usize) {
        self.contacts.remove(index);
        self.supplement_data.remove(index);
    }
}
