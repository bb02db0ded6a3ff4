//! Constraint types driven by the solver.
//!
//! Each type implements [`SolverUpdateable`](crate::physics::solver::SolverUpdateable)
//! and composes the shared motor and spring settings by field.

mod angular_motor;
mod contact_constraint;
mod distance_joint;
mod linear_motor;
mod motor;

pub use angular_motor::SingleEntityAngularMotor;
pub use contact_constraint::ContactConstraint;
pub use distance_joint::DistanceJoint;
pub use linear_motor::SingleEntityLinearMotor;
pub use motor::{MotorMode, MotorSettings, ServoSettings, SpringSettings};
