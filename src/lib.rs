//! Rein constraint solver
//!
//! The constraint-resolution core of the rein rigid-body pipeline: an
//! iterative impulse solver driven by fork-join passes, and the contact
//! manifold maintenance that feeds it.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **config** - Solver, collision and world configuration
//! 2. **error** - Contract-violation errors
//! 3. **pool** - Type-keyed scratch buffer recycling
//! 4. **threading** - Fork-join loop executors (sequential, rayon with feature = "parallel")
//! 5. **physics::contact** - Contact records shared by the manifold and constraints
//! 6. **physics::manifold** - Contact refresh, reduction and manifold bookkeeping
//! 7. **physics::solver** - The solvable-object contract and the iterative solver
//! 8. **physics::constraints** - Motors, contacts and joints implementing the contract
//! 9. **physics** - Rigid bodies, islands and the fixed-step `PhysicsWorld` driver

pub mod config;
pub mod error;
pub mod physics;
pub mod pool;
pub mod threading;

pub use config::{CollisionDetectionSettings, PhysicsConfig, SolverConfig};
pub use error::SolverError;

pub use physics::constraints::{
    ContactConstraint, DistanceJoint, MotorMode, MotorSettings, ServoSettings,
    SingleEntityAngularMotor, SingleEntityLinearMotor, SpringSettings,
};
pub use physics::contact::{Contact, ContactData, ContactSupplementData};
pub use physics::island::{DeactivationManager, SimulationIsland, SimulationIslandConnection};
pub use physics::manifold::{
    contact_refresh, contact_refresh_into, reduce_contacts, reduce_contacts_with_candidate,
    ContactManifold, ContactReduction, ManifoldChange,
};
pub use physics::math::RigidTransform;
pub use physics::rigid_body::{RigidBody, RigidBodyType, SharedBody};
pub use physics::solver::{
    ItemState, PermutationMapper, SharedUpdateable, Solver, SolverItem, SolverSettings,
    SolverUpdateable,
};
pub use physics::{NarrowPhase, PhysicsWorld};

pub use pool::{Poolable, ResourcePool};

#[cfg(feature = "parallel")]
pub use threading::RayonLooper;
pub use threading::{create_looper, ParallelLooper, SequentialLooper};

// Re-export glam for convenience
pub use glam;
