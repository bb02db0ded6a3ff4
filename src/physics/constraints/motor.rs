//! Motor and spring configuration shared by the single-entity motors and joints.

use glam::Vec3;

/// How a motor chooses its target velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorMode {
    /// Drive the velocity toward a goal velocity.
    #[default]
    VelocityMotor,
    /// Drive the position or orientation toward a goal, like a spring.
    Servomechanism,
}

/// Spring stiffness and damping, converted per step into an error
/// reduction rate and a constraint softness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSettings {
    /// Default: 600000.
    pub stiffness: f32,
    /// Default: 90000.
    pub damping: f32,
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self {
            stiffness: 600_000.0,
            damping: 90_000.0,
        }
    }
}

impl SpringSettings {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self { stiffness, damping }
    }

    /// Error reduction rate (per second) and softness for a step of `dt`.
    pub fn compute_error_reduction_and_softness(&self, dt: f32) -> (f32, f32) {
        let denominator = dt * self.stiffness + self.damping;
        if denominator <= 0.0 {
            return (0.0, 0.0);
        }
        let multiplier = 1.0 / denominator;
        (self.stiffness * multiplier, multiplier / dt)
    }
}

/// Servo behavior: a spring toward the goal with bounded correction speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoSettings {
    pub spring: SpringSettings,
    /// Upper bound on the correction speed. Default: unbounded.
    pub max_correction_speed: f32,
    /// Speed added to any nonzero correction. Default: 0.
    pub base_correction_speed: f32,
}

impl Default for ServoSettings {
    fn default() -> Self {
        Self {
            spring: SpringSettings::default(),
            max_correction_speed: f32::MAX,
            base_correction_speed: 0.0,
        }
    }
}

impl ServoSettings {
    /// Bias velocity that closes `error` (goal minus current) at the spring's
    /// rate, clamped to the configured speeds.
    pub fn bias_velocity(&self, error: Vec3, error_reduction: f32) -> Vec3 {
        let bias = error * error_reduction;
        let speed = bias.length();
        if speed <= 1e-9 {
            return Vec3::ZERO;
        }
        let clamped = (speed + self.base_correction_speed).min(self.max_correction_speed);
        bias * (clamped / speed)
    }
}

/// Configuration shared by the single-entity motors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSettings {
    pub mode: MotorMode,
    /// Largest force (or torque) the motor may exert. Default: unbounded.
    pub maximum_force: f32,
    /// Softness of the velocity motor, scaled by the step rate. Default: 0.0001.
    pub velocity_softness: f32,
    pub servo: ServoSettings,
}

impl Default for MotorSettings {
    fn default() -> Self {
        Self {
            mode: MotorMode::VelocityMotor,
            maximum_force: f32::MAX,
            velocity_softness: 0.0001,
            servo: ServoSettings::default(),
        }
    }
}

impl MotorSettings {
    pub fn velocity_motor() -> Self {
        Self::default()
    }

    pub fn servo() -> Self {
        Self {
            mode: MotorMode::Servomechanism,
            ..Self::default()
        }
    }

    pub fn maximum_force(mut self, maximum_force: f32) -> Self {
        self.maximum_force = maximum_force;
        self
    }

    pub fn spring(mut self, spring: SpringSettings) -> Self {
        self.servo.spring = spring;
        self
    }

    pub fn max_correction_speed(mut self, speed: f32) -> Self {
        self.servo.max_correction_speed = speed;
        self
    }

    /// Impulse cap for one step.
    #[inline]
    pub(crate) fn maximum_impulse(&self, dt: f32) -> f32 {
        if self.maximum_force == f32::MAX {
            f32::MAX
        } else {
            self.maximum_force * dt
        }
    }
}

/// Add `delta` to `accumulated`, clamp the sum to `max_length`, and return the
/// part of `delta` that survived the clamp.
#[inline]
pub(crate) fn accumulate_clamped(accumulated: &mut Vec3, delta: Vec3, max_length: f32) -> Vec3 {
    let previous = *accumulated;
    let mut next = previous + delta;
    let length_squared = next.length_squared();
    if max_length < f32::MAX && length_squared > max_length * max_length {
        next *= max_length / length_squared.sqrt();
    }
    *accumulated = next;
    next - previous
}
