//! Motor acting on the rotation of a single body.

use glam::{Mat3, Quat, Vec3};

use crate::physics::math::inverse_or_zero;
use crate::physics::rigid_body::{RbData, SharedBody};
use crate::physics::solver::SolverUpdateable;

use super::motor::{accumulate_clamped, MotorMode, MotorSettings};

/// Drives the angular velocity, or the orientation, of one body.
pub struct SingleEntityAngularMotor {
    body: SharedBody,
    pub settings: MotorSettings,
    /// Target angular velocity in velocity-motor mode.
    pub goal_velocity: Vec3,
    /// Target orientation in servo mode.
    pub goal_orientation: Quat,

    effective_mass: Mat3,
    bias_velocity: Vec3,
    softness: f32,
    maximum_impulse: f32,
    accumulated_impulse: Vec3,
}

impl SingleEntityAngularMotor {
    pub fn new(body: SharedBody, settings: MotorSettings) -> Self {
        Self {
            body,
            settings,
            goal_velocity: Vec3::ZERO,
            goal_orientation: Quat::IDENTITY,
            effective_mass: Mat3::ZERO,
            bias_velocity: Vec3::ZERO,
            softness: 0.0,
            maximum_impulse: f32::MAX,
            accumulated_impulse: Vec3::ZERO,
        }
    }

    pub fn body(&self) -> &SharedBody {
        &self.body
    }

    pub fn total_impulse(&self) -> Vec3 {
        self.accumulated_impulse
    }
}

/// Rotation taking `from` to `to`, as axis times angle along the short way.
fn orientation_error(from: Quat, to: Quat) -> Vec3 {
    let mut delta = to * from.inverse();
    if delta.w < 0.0 {
        delta = -delta;
    }
    let (axis, angle) = delta.normalize().to_axis_angle();
    if angle.abs() < 1e-7 {
        Vec3::ZERO
    } else {
        axis * angle
    }
}

impl SolverUpdateable for SingleEntityAngularMotor {
    fn update(&mut self, dt: f32) {
        let rb = RbData::read(&self.body);

        match self.settings.mode {
            MotorMode::VelocityMotor => {
                self.softness = self.settings.velocity_softness / dt;
                self.bias_velocity = self.goal_velocity;
            }
            MotorMode::Servomechanism => {
                let (error_reduction, softness) = self
                    .settings
                    .servo
                    .spring
                    .compute_error_reduction_and_softness(dt);
                self.softness = softness;
                let error = orientation_error(rb.orientation, self.goal_orientation);
                self.bias_velocity = self.settings.servo.bias_velocity(error, error_reduction);
            }
        }

        let inverse_effective_mass =
            rb.inv_inertia + Mat3::from_diagonal(Vec3::splat(self.softness));
        self.effective_mass = inverse_or_zero(inverse_effective_mass);
        self.maximum_impulse = self.settings.maximum_impulse(dt);
    }

    fn exclusive_update(&mut self) {
        self.body
            .lock()
            .apply_angular_impulse(self.accumulated_impulse);
    }

    fn solve_iteration(&mut self) -> f32 {
        let velocity = self.body.lock().angular_velocity;
        let lambda = self.effective_mass
            * (self.bias_velocity - velocity - self.accumulated_impulse * self.softness);
        let applied =
            accumulate_clamped(&mut self.accumulated_impulse, lambda, self.maximum_impulse);
        self.body.lock().apply_angular_impulse(applied);
        applied.length()
    }

    fn involved_bodies(&self) -> Vec<SharedBody> {
        vec![self.body.clone()]
    }
}
