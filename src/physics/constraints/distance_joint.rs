//! Soft distance constraint between two bodies.

use glam::Vec3;

use crate::physics::rigid_body::{apply_pair_impulse, RbData, SharedBody};
use crate::physics::solver::SolverUpdateable;

use super::motor::SpringSettings;

/// Keeps two body-attached anchors at `rest_length` from each other.
pub struct DistanceJoint {
    body_a: SharedBody,
    body_b: SharedBody,
    pub local_anchor_a: Vec3,
    pub local_anchor_b: Vec3,
    pub rest_length: f32,
    pub spring: SpringSettings,

    r_a: Vec3,
    r_b: Vec3,
    direction: Vec3,
    effective_mass: f32,
    bias_velocity: f32,
    softness: f32,
    accumulated_impulse: f32,
}

impl DistanceJoint {
    /// Joint whose rest length is the anchors' current distance.
    pub fn new(
        body_a: SharedBody,
        body_b: SharedBody,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
    ) -> Self {
        let anchor_a = body_a.lock().transform().transform_point(local_anchor_a);
        let anchor_b = body_b.lock().transform().transform_point(local_anchor_b);
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            rest_length: anchor_a.distance(anchor_b),
            spring: SpringSettings::default(),
            r_a: Vec3::ZERO,
            r_b: Vec3::ZERO,
            direction: Vec3::X,
            effective_mass: 0.0,
            bias_velocity: 0.0,
            softness: 0.0,
            accumulated_impulse: 0.0,
        }
    }

    pub fn with_rest_length(mut self, rest_length: f32) -> Self {
        self.rest_length = rest_length;
        self
    }

    pub fn with_spring(mut self, spring: SpringSettings) -> Self {
        self.spring = spring;
        self
    }

    pub fn bodies(&self) -> (&SharedBody, &SharedBody) {
        (&self.body_a, &self.body_b)
    }
}

impl SolverUpdateable for DistanceJoint {
    fn update(&mut self, dt: f32) {
        let a = RbData::read(&self.body_a);
        let b = RbData::read(&self.body_b);

        self.r_a = a.orientation * self.local_anchor_a;
        self.r_b = b.orientation * self.local_anchor_b;
        let separation = (b.position + self.r_b) - (a.position + self.r_a);
        let distance = separation.length();
        if distance > 1e-6 {
            self.direction = separation / distance;
        } else {
            // Coincident anchors: keep last step's direction.
            tracing::trace!("distance joint anchors coincide");
        }

        let (error_reduction, softness) = self.spring.compute_error_reduction_and_softness(dt);
        self.softness = softness;
        self.bias_velocity = -error_reduction * (distance - self.rest_length);

        let ra_n = self.r_a.cross(self.direction);
        let rb_n = self.r_b.cross(self.direction);
        let inverse_effective_mass = a.inv_mass
            + b.inv_mass
            + (a.inv_inertia * ra_n).dot(ra_n)
            + (b.inv_inertia * rb_n).dot(rb_n)
            + softness;
        self.effective_mass = if inverse_effective_mass > 0.0 {
            1.0 / inverse_effective_mass
        } else {
            0.0
        };
    }

    fn exclusive_update(&mut self) {
        apply_pair_impulse(
            &self.body_a,
            &self.body_b,
            self.direction * self.accumulated_impulse,
            self.r_a,
            self.r_b,
        );
    }

    fn solve_iteration(&mut self) -> f32 {
        let velocity_a = self.body_a.lock().velocity_at(self.r_a);
        let velocity_b = self.body_b.lock().velocity_at(self.r_b);
        let relative_velocity = (velocity_b - velocity_a).dot(self.direction);

        let lambda = self.effective_mass
            * (self.bias_velocity - relative_velocity - self.softness * self.accumulated_impulse);
        self.accumulated_impulse += lambda;

        apply_pair_impulse(
            &self.body_a,
            &self.body_b,
            self.direction * lambda,
            self.r_a,
            self.r_b,
        );
        lambda.abs()
    }

    fn involved_bodies(&self) -> Vec<SharedBody> {
        vec![self.body_a.clone(), self.body_b.clone()]
    }
}
