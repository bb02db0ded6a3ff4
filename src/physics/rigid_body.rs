//! Rigid body state and integration functions.
//!
//! Bodies are shared between the driver and every constraint touching them as
//! [`SharedBody`]. A body lock is a leaf lock: it is held for a single read or
//! a single impulse application and never while acquiring another lock.

use std::sync::Arc;

use glam::{Mat3, Quat, Vec3};
use parking_lot::Mutex;

use super::island::SimulationIsland;
use super::math::RigidTransform;

/// Rigid body shared between the world and the constraints acting on it.
pub type SharedBody = Arc<Mutex<RigidBody>>;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Affected by forces and collisions.
    Dynamic,
    /// Immovable.
    Static,
    /// Position controlled by user, but affects dynamic bodies.
    Kinematic,
}

/// Rigid body.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    pub mass: f32,
    /// Diagonal of the local-space inertia tensor.
    pub inertia: Vec3,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Coefficient of restitution (0.0 - 1.0).
    pub restitution: f32,
    /// Friction coefficient (0.0 - 1.0).
    pub friction: f32,
    /// Gravity scale (default: 1.0).
    pub gravity_scale: f32,
    /// Island the body sleeps with. Static and kinematic bodies have none.
    pub island: Option<Arc<SimulationIsland>>,
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        // Default inertia tensor: identity * mass (unit sphere approximation)
        Self {
            body_type: RigidBodyType::Dynamic,
            mass,
            inertia: Vec3::splat(mass),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            restitution: 0.3,
            friction: 0.5,
            gravity_scale: 1.0,
            island: None,
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            mass: 0.0,
            inertia: Vec3::ZERO,
            gravity_scale: 0.0,
            ..Self::new_dynamic(0.0)
        }
    }

    /// Create a new kinematic rigid body.
    pub fn new_kinematic() -> Self {
        Self {
            body_type: RigidBodyType::Kinematic,
            ..Self::new_static()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_island(mut self, island: Arc<SimulationIsland>) -> Self {
        self.island = Some(island);
        self
    }

    pub fn into_shared(self) -> SharedBody {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic && self.mass > 0.0
    }

    #[inline]
    pub fn transform(&self) -> RigidTransform {
        RigidTransform::new(self.position, self.orientation)
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.is_dynamic() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// World-space inverse inertia tensor.
    pub fn inverse_inertia_world(&self) -> Mat3 {
        if !self.is_dynamic() {
            return Mat3::ZERO;
        }
        let inv = |i: f32| if i > 0.0 { 1.0 / i } else { 0.0 };
        let local = Mat3::from_diagonal(Vec3::new(
            inv(self.inertia.x),
            inv(self.inertia.y),
            inv(self.inertia.z),
        ));
        let rotation = Mat3::from_quat(self.orientation);
        rotation * local * rotation.transpose()
    }

    /// Velocity of the material point at offset `r` from the center of mass.
    #[inline]
    pub fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    /// Apply `impulse` at offset `r` from the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        if !self.is_dynamic() {
            return;
        }
        self.linear_velocity += impulse * self.inverse_mass();
        self.angular_velocity += self.inverse_inertia_world() * r.cross(impulse);
    }

    /// Apply a pure angular impulse.
    pub fn apply_angular_impulse(&mut self, impulse: Vec3) {
        if !self.is_dynamic() {
            return;
        }
        self.angular_velocity += self.inverse_inertia_world() * impulse;
    }
}

/// Helper struct to cache rigid body data for solver calculations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RbData {
    pub inv_mass: f32,
    pub inv_inertia: Mat3,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub restitution: f32,
    pub friction: f32,
}

impl RbData {
    pub fn from_rb(rb: &RigidBody) -> Self {
        Self {
            inv_mass: rb.inverse_mass(),
            inv_inertia: rb.inverse_inertia_world(),
            position: rb.position,
            orientation: rb.orientation,
            linear_velocity: rb.linear_velocity,
            angular_velocity: rb.angular_velocity,
            restitution: rb.restitution,
            friction: rb.friction,
        }
    }

    pub fn read(body: &SharedBody) -> Self {
        Self::from_rb(&body.lock())
    }

    #[inline]
    pub fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }
}

/// Apply an impulse to both bodies of a pair: `-impulse` to A, `+impulse` to B.
pub(crate) fn apply_pair_impulse(
    body_a: &SharedBody,
    body_b: &SharedBody,
    impulse: Vec3,
    r_a: Vec3,
    r_b: Vec3,
) {
    body_a.lock().apply_impulse(-impulse, r_a);
    body_b.lock().apply_impulse(impulse, r_b);
}

/// Apply gravity to the velocity of all dynamic bodies.
pub fn apply_gravity(bodies: &[SharedBody], gravity: Vec3, dt: f32) {
    for body in bodies {
        let mut rb = body.lock();
        if rb.is_dynamic() && is_awake(&rb) {
            let scale = rb.gravity_scale;
            rb.linear_velocity += gravity * scale * dt;
        }
    }
}

/// Integrate positions: p += v * dt, q += 0.5 * omega * q * dt.
pub fn integrate_positions(bodies: &[SharedBody], dt: f32) {
    for body in bodies {
        let mut rb = body.lock();
        if rb.body_type == RigidBodyType::Static || !is_awake(&rb) {
            continue;
        }

        let velocity = rb.linear_velocity;
        rb.position += velocity * dt;

        let omega = rb.angular_velocity;
        if omega.length_squared() > 1e-10 {
            let omega_quat = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0);
            let q_dot = omega_quat * rb.orientation * 0.5;
            let q = rb.orientation;
            rb.orientation = Quat::from_xyzw(
                q.x + q_dot.x * dt,
                q.y + q_dot.y * dt,
                q.z + q_dot.z * dt,
                q.w + q_dot.w * dt,
            )
            .normalize();
        }
    }
}

fn is_awake(rb: &RigidBody) -> bool {
    rb.island.as_ref().map_or(true, |island| island.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_fall() {
        let body = RigidBody::new_dynamic(1.0)
            .with_position(Vec3::new(0.0, 10.0, 0.0))
            .into_shared();
        let bodies = vec![body.clone()];

        let gravity = Vec3::new(0.0, -9.81, 0.0);
        let dt = 1.0 / 60.0;

        for _ in 0..60 {
            apply_gravity(&bodies, gravity, dt);
            integrate_positions(&bodies, dt);
        }

        let rb = body.lock();
        // y = 10 - 0.5*9.81*1^2 ≈ 5.095, semi-implicit Euler lands slightly lower
        assert!(
            rb.position.y < 5.2 && rb.position.y > 4.8,
            "Body should have fallen: y = {}",
            rb.position.y
        );
        assert!(rb.position.x.abs() < 1e-5);
        assert!(rb.position.z.abs() < 1e-5);
    }

    #[test]
    fn test_static_body_unaffected() {
        let body = RigidBody::new_static().into_shared();
        let bodies = vec![body.clone()];

        for _ in 0..60 {
            apply_gravity(&bodies, Vec3::new(0.0, -9.81, 0.0), 1.0 / 60.0);
            integrate_positions(&bodies, 1.0 / 60.0);
        }

        assert_eq!(body.lock().position, Vec3::ZERO);
    }

    #[test]
    fn test_sleeping_body_not_integrated() {
        let island = Arc::new(SimulationIsland::new());
        island.set_active(false);
        let body = RigidBody::new_dynamic(1.0).with_island(island).into_shared();

        apply_gravity(&[body.clone()], Vec3::new(0.0, -9.81, 0.0), 1.0 / 60.0);
        assert_eq!(body.lock().linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_apply_impulse_off_center_spins() {
        let mut rb = RigidBody::new_dynamic(2.0);
        rb.apply_impulse(Vec3::new(0.0, 0.0, 2.0), Vec3::X);

        assert!((rb.linear_velocity - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
        // r x J = (1,0,0) x (0,0,2) = (0,-2,0); inverse inertia 1/2
        assert!((rb.angular_velocity - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_static_ignores_impulse() {
        let mut rb = RigidBody::new_static();
        rb.apply_impulse(Vec3::ONE, Vec3::X);
        rb.apply_angular_impulse(Vec3::ONE);
        assert_eq!(rb.linear_velocity, Vec3::ZERO);
        assert_eq!(rb.angular_velocity, Vec3::ZERO);
        assert_eq!(rb.inverse_inertia_world(), Mat3::ZERO);
    }
}
