//! Motor acting on a point attached to a single body.

use glam::{Mat3, Vec3};

use crate::physics::math::{inverse_or_zero, skew};
use crate::physics::rigid_body::{RbData, SharedBody};
use crate::physics::solver::SolverUpdateable;

use super::motor::{accumulate_clamped, MotorMode, MotorSettings};

/// Drives the velocity, or the position, of a point fixed to one body.
pub struct SingleEntityLinearMotor {
    body: SharedBody,
    /// Driven point in the body's local frame.
    pub local_point: Vec3,
    pub settings: MotorSettings,
    /// Target point velocity in velocity-motor mode.
    pub goal_velocity: Vec3,
    /// Target world position in servo mode.
    pub goal_position: Vec3,

    offset: Vec3,
    effective_mass: Mat3,
    bias_velocity: Vec3,
    softness: f32,
    maximum_impulse: f32,
    accumulated_impulse: Vec3,
}

impl SingleEntityLinearMotor {
    pub fn new(body: SharedBody, local_point: Vec3, settings: MotorSettings) -> Self {
        Self {
            body,
            local_point,
            settings,
            goal_velocity: Vec3::ZERO,
            goal_position: Vec3::ZERO,
            offset: Vec3::ZERO,
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

    /// Impulse accumulated over the current step.
    pub fn total_impulse(&self) -> Vec3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for SingleEntityLinearMotor {
    fn update(&mut self, dt: f32) {
        let rb = RbData::read(&self.body);
        self.offset = rb.orientation * self.local_point;

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
                let error = self.goal_position - (rb.position + self.offset);
                self.bias_velocity = self.settings.servo.bias_velocity(error, error_reduction);
            }
        }

        let r = skew(self.offset);
        let inverse_effective_mass = Mat3::from_diagonal(Vec3::splat(rb.inv_mass + self.softness))
            - r * rb.inv_inertia * r;
        self.effective_mass = inverse_or_zero(inverse_effective_mass);
        self.maximum_impulse = self.settings.maximum_impulse(dt);
    }

    fn exclusive_update(&mut self) {
        self.body
            .lock()
            .apply_impulse(self.accumulated_impulse, self.offset);
    }

    fn solve_iteration(&mut self) -> f32 {
        let velocity = self.body.lock().velocity_at(self.offset);
        let lambda = self.effective_mass
            * (self.bias_velocity - velocity - self.accumulated_impulse * self.softness);
        let applied =
            accumulate_clamped(&mut self.accumulated_impulse, lambda, self.maximum_impulse);
        self.body.lock().apply_impulse(applied, self.offset);
        applied.length()
    }

    fn involved_bodies(&self) -> Vec<SharedBody> {
        vec![self.body.clone()]
    }
}
