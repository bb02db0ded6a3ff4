//! Non-penetration and friction between two bodies sharing a contact manifold.

use glam::Vec3;

use crate::config::CollisionDetectionSettings;
use crate::error::SolverError;
use crate::physics::contact::ContactData;
use crate::physics::manifold::{ContactManifold, ManifoldChange};
use crate::physics::math::tangent_basis;
use crate::physics::rigid_body::{apply_pair_impulse, RbData, SharedBody};
use crate::physics::solver::SolverUpdateable;
use crate::pool::ResourcePool;

/// Baumgarte stabilization parameter.
const BAUMGARTE_BETA: f32 = 0.2;
/// Penetration slop (allowed penetration before position correction).
const PENETRATION_SLOP: f32 = 0.005;
/// Approach speed above which restitution kicks in.
const RESTITUTION_THRESHOLD: f32 = 1.0;

/// Per-contact quantities fixed for one step.
#[derive(Debug, Clone, Copy, Default)]
struct ContactRow {
    r_a: Vec3,
    r_b: Vec3,
    normal: Vec3,
    tangents: [Vec3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    /// Separating velocity the normal row aims for.
    target_velocity: f32,
}

/// Contact constraint for one body pair.
///
/// Owns the pair's [`ContactManifold`]; the accumulated impulses stored on the
/// manifold's contacts carry over between steps for warm starting.
pub struct ContactConstraint {
    body_a: SharedBody,
    body_b: SharedBody,
    manifold: ContactManifold,
    /// Combined friction coefficient.
    pub friction: f32,
    /// Combined coefficient of restitution.
    pub restitution: f32,
    rows: Vec<ContactRow>,
}

impl ContactConstraint {
    /// Constraint between `body_a` and `body_b`, mixing their materials.
    pub fn new(body_a: SharedBody, body_b: SharedBody) -> Self {
        let a = RbData::read(&body_a);
        let b = RbData::read(&body_b);
        Self {
            body_a,
            body_b,
            manifold: ContactManifold::new(),
            friction: (a.friction + b.friction) * 0.5,
            restitution: (a.restitution + b.restitution) * 0.5,
            rows: Vec::new(),
        }
    }

    pub fn bodies(&self) -> (&SharedBody, &SharedBody) {
        (&self.body_a, &self.body_b)
    }

    pub fn manifold(&self) -> &ContactManifold {
        &self.manifold
    }

    /// Refresh the manifold against the bodies' current transforms and merge
    /// this step's narrow-phase `candidates`.
    pub fn update_contacts(
        &mut self,
        candidates: &[ContactData],
        settings: &CollisionDetectionSettings,
        pool: &ResourcePool,
    ) -> Result<ManifoldChange, SolverError> {
        let transform_a = self.body_a.lock().transform();
        let transform_b = self.body_b.lock().transform();
        self.manifold
            .update(candidates, &transform_a, &transform_b, settings, pool)
    }

    fn apply(&self, impulse: Vec3, row: &ContactRow) {
        apply_pair_impulse(&self.body_a, &self.body_b, impulse, row.r_a, row.r_b);
    }

    fn relative_velocity(&self, row: &ContactRow) -> Vec3 {
        let velocity_a = self.body_a.lock().velocity_at(row.r_a);
        let velocity_b = self.body_b.lock().velocity_at(row.r_b);
        velocity_b - velocity_a
    }
}

/// Inverse effective mass of a pair along `direction`.
#[inline]
fn inverse_mass_along(a: &RbData, b: &RbData, r_a: Vec3, r_b: Vec3, direction: Vec3) -> f32 {
    let ra_d = r_a.cross(direction);
    let rb_d = r_b.cross(direction);
    a.inv_mass + b.inv_mass + (a.inv_inertia * ra_d).dot(ra_d) + (b.inv_inertia * rb_d).dot(rb_d)
}

#[inline]
fn reciprocal_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

impl SolverUpdateable for ContactConstraint {
    fn update(&mut self, dt: f32) {
        let a = RbData::read(&self.body_a);
        let b = RbData::read(&self.body_b);

        self.rows.clear();
        for contact in self.manifold.contacts() {
            let normal = contact.normal;
            let r_a = contact.position - a.position;
            let r_b = contact.position - b.position;
            let (t1, t2) = tangent_basis(normal);

            let approach = (b.velocity_at(r_b) - a.velocity_at(r_a)).dot(normal);
            let mut target_velocity = if contact.penetration_depth < 0.0 {
                // Speculative: allow closing the gap within this step, no more.
                contact.penetration_depth / dt
            } else {
                BAUMGARTE_BETA / dt * (contact.penetration_depth - PENETRATION_SLOP).max(0.0)
            };
            if contact.penetration_depth >= 0.0 && approach < -RESTITUTION_THRESHOLD {
                target_velocity = target_velocity.max(-self.restitution * approach);
            }

            self.rows.push(ContactRow {
                r_a,
                r_b,
                normal,
                tangents: [t1, t2],
                normal_mass: reciprocal_or_zero(inverse_mass_along(&a, &b, r_a, r_b, normal)),
                tangent_mass: [
                    reciprocal_or_zero(inverse_mass_along(&a, &b, r_a, r_b, t1)),
                    reciprocal_or_zero(inverse_mass_along(&a, &b, r_a, r_b, t2)),
                ],
                target_velocity,
            });
        }
    }

    fn exclusive_update(&mut self) {
        for (contact, row) in self.manifold.contacts().iter().zip(&self.rows) {
            let impulse = row.normal * contact.normal_impulse
                + row.tangents[0] * contact.tangent_impulse[0]
                + row.tangents[1] * contact.tangent_impulse[1];
            if impulse != Vec3::ZERO {
                self.apply(impulse, row);
            }
        }
    }

    fn solve_iteration(&mut self) -> f32 {
        let mut total = 0.0;
        for i in 0..self.rows.len() {
            let row = self.rows[i];

            // Normal impulse
            let normal_velocity = self.relative_velocity(&row).dot(row.normal);
            let lambda = row.normal_mass * (row.target_velocity - normal_velocity);

            let contact = &mut self.manifold.contacts_mut()[i];
            let old_impulse = contact.normal_impulse;
            contact.normal_impulse = (old_impulse + lambda).max(0.0);
            let applied_normal = contact.normal_impulse - old_impulse;
            let max_friction = self.friction * contact.normal_impulse;
            self.apply(row.normal * applied_normal, &row);

            // Friction impulse
            let relative_velocity = self.relative_velocity(&row);
            let tangent_lambda = [
                -row.tangent_mass[0] * relative_velocity.dot(row.tangents[0]),
                -row.tangent_mass[1] * relative_velocity.dot(row.tangents[1]),
            ];

            let contact = &mut self.manifold.contacts_mut()[i];
            let old = contact.tangent_impulse;
            let mut next = [old[0] + tangent_lambda[0], old[1] + tangent_lambda[1]];
            // Coulomb friction: |Jt| <= mu * Jn
            let length = (next[0] * next[0] + next[1] * next[1]).sqrt();
            if length > max_friction && length > 0.0 {
                let scale = max_friction / length;
                next = [next[0] * scale, next[1] * scale];
            }
            contact.tangent_impulse = next;
            let applied_tangent = [next[0] - old[0], next[1] - old[1]];
            let friction_impulse =
                row.tangents[0] * applied_tangent[0] + row.tangents[1] * applied_tangent[1];
            self.apply(friction_impulse, &row);

            total += applied_normal.abs() + friction_impulse.length();
        }
        total
    }

    fn involved_bodies(&self) -> Vec<SharedBody> {
        vec![self.body_a.clone(), self.body_b.clone()]
    }
}
