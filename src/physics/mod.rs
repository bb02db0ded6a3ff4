//! Rigid-body constraint pipeline and its fixed-timestep driver.
//!
//! # Architecture
//!
//! Each fixed step runs:
//!
//! 1. Apply gravity
//! 2. Narrow phase (external) produces contact candidates per registered pair
//! 3. Contact manifolds refresh and merge the candidates
//! 4. Solve constraints (prestep, then permuted iterations)
//! 5. Integrate positions

pub mod constraints;
pub mod contact;
pub mod island;
pub mod manifold;
pub mod math;
pub mod rigid_body;
pub mod solver;

use std::sync::Arc;

use crate::config::PhysicsConfig;
use crate::error::SolverError;
use crate::pool::ResourcePool;
use crate::threading::create_looper;

use self::constraints::ContactConstraint;
use self::contact::ContactData;
use self::island::{DeactivationManager, SimulationIsland};
use self::rigid_body::{RigidBody, SharedBody};
use self::solver::{SharedUpdateable, Solver, SolverItem, SolverUpdateable};

/// Produces contact candidates for a body pair.
///
/// Shapes are not modeled here; implementors know which shape each body
/// carries. Candidates are appended to `out`, which arrives empty.
pub trait NarrowPhase {
    fn collide(&self, body_a: &RigidBody, body_b: &RigidBody, out: &mut Vec<ContactData>);
}

/// The main physics world managing simulation state.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    bodies: Vec<SharedBody>,
    contact_pairs: Vec<Arc<SolverItem<ContactConstraint>>>,
    solver: Solver,
    pool: ResourcePool,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    ///
    /// Builds the solver's thread pool unless `config.solver.thread_count`
    /// is 1.
    pub fn new(config: PhysicsConfig) -> Result<Self, SolverError> {
        let looper = create_looper(config.solver.thread_count)?;
        let solver = Solver::new(&config.solver, looper, Arc::new(DeactivationManager::new()));
        tracing::debug!(
            threads = config.solver.thread_count,
            iteration_limit = config.solver.iteration_limit,
            "physics world created"
        );
        Ok(Self {
            config,
            accumulator: 0.0,
            bodies: Vec::new(),
            contact_pairs: Vec::new(),
            solver,
            pool: ResourcePool::new(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    pub fn bodies(&self) -> &[SharedBody] {
        &self.bodies
    }

    pub fn contact_pairs(&self) -> &[Arc<SolverItem<ContactConstraint>>] {
        &self.contact_pairs
    }

    /// Add a body. Dynamic bodies without an island get one of their own.
    pub fn add_body(&mut self, mut body: RigidBody) -> SharedBody {
        if body.is_dynamic() && body.island.is_none() {
            body.island = Some(Arc::new(SimulationIsland::new()));
        }
        let shared = body.into_shared();
        self.bodies.push(shared.clone());
        shared
    }

    /// Register a body pair for contact generation and solving.
    pub fn add_contact_pair(
        &mut self,
        body_a: &SharedBody,
        body_b: &SharedBody,
    ) -> Result<Arc<SolverItem<ContactConstraint>>, SolverError> {
        let constraint = ContactConstraint::new(body_a.clone(), body_b.clone());
        let item = SolverItem::new(constraint).into_shared();
        self.solver.add(item.clone())?;
        self.contact_pairs.push(item.clone());
        Ok(item)
    }

    /// Add a joint, motor or any other solver item.
    pub fn add_constraint(&mut self, item: SharedUpdateable) -> Result<(), SolverError> {
        self.solver.add(item)
    }

    /// Remove a constraint (contact pairs included).
    pub fn remove_constraint<T>(&mut self, item: &Arc<SolverItem<T>>) -> Result<(), SolverError>
    where
        T: SolverUpdateable + ?Sized,
    {
        self.solver.remove(item)?;
        self.contact_pairs
            .retain(|pair| !std::ptr::addr_eq(Arc::as_ptr(pair), Arc::as_ptr(item)));
        Ok(())
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic simulation.
    /// Returns the number of fixed steps taken.
    pub fn step(
        &mut self,
        delta_time: f64,
        narrow_phase: &dyn NarrowPhase,
    ) -> Result<u32, SolverError> {
        if delta_time <= 0.0 {
            tracing::warn!(delta_time, "ignoring non-positive physics timestep");
            return Ok(0);
        }
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(self.config.fixed_timestep as f32, narrow_phase)?;
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }
        Ok(substeps)
    }

    fn fixed_step(&mut self, dt: f32, narrow_phase: &dyn NarrowPhase) -> Result<(), SolverError> {
        // 1. Apply forces (gravity)
        rigid_body::apply_gravity(&self.bodies, self.config.gravity, dt);

        // 2-3. Narrow phase and manifold maintenance
        let mut candidates: Vec<ContactData> = self.pool.acquire();
        for pair in &self.contact_pairs {
            let mut state = pair.enter_lock();
            let constraint = &mut state.updateable;

            // Snapshots keep body locks from nesting.
            let (body_a, body_b) = constraint.bodies();
            let snapshot_a = body_a.lock().clone();
            let snapshot_b = body_b.lock().clone();

            candidates.clear();
            narrow_phase.collide(&snapshot_a, &snapshot_b, &mut candidates);
            let result =
                constraint.update_contacts(&candidates, &self.config.collision, &self.pool);
            let in_contact = !constraint.manifold().is_empty();
            drop(state);
            pair.set_active(in_contact);
            if let Err(err) = result {
                self.pool.release(candidates);
                return Err(err);
            }
        }
        self.pool.release(candidates);

        // 4. Solve constraints
        self.solver.update(dt);

        // 5. Integrate positions
        rigid_body::integrate_positions(&self.bodies, dt);
        Ok(())
    }
}
