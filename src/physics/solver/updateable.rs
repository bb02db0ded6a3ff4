//! The contract between the solver and the constraints it drives.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::physics::island::SimulationIslandConnection;
use crate::physics::rigid_body::SharedBody;

/// Owner id of an item that belongs to no solver.
pub(crate) const NO_OWNER: u64 = 0;
/// Solver index of an item that belongs to no solver.
pub(crate) const NO_INDEX: usize = usize::MAX;

/// A constraint the solver can drive.
///
/// The solver calls `update` and `exclusive_update` once per step during the
/// prestep pass, then `solve_iteration` repeatedly until the item converges
/// or runs out of iterations. Every call happens under the owning
/// [`SolverItem`]'s lock.
pub trait SolverUpdateable: Send {
    /// Compute frame-constant quantities (effective masses, biases, caps).
    fn update(&mut self, dt: f32);

    /// Warm start: apply the impulse accumulated during the previous step.
    fn exclusive_update(&mut self);

    /// Apply one corrective impulse and return its magnitude.
    fn solve_iteration(&mut self) -> f32;

    /// Bodies the constraint acts on.
    fn involved_bodies(&self) -> Vec<SharedBody>;
}

/// Per-item iteration bookkeeping and convergence thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Iterations received during the current step.
    pub current_iterations: usize,
    /// Consecutive iterations whose impulse fell below `minimum_impulse`.
    pub iterations_at_zero_impulse: usize,
    /// Consecutive small-impulse iterations required before retiring. Default: 1.
    pub minimum_iterations: usize,
    /// Hard cap on iterations per step, below the solver's own limit. Default: unbounded.
    pub maximum_iterations: usize,
    /// Impulse magnitude under which an iteration counts as converged. Default: 0.001.
    pub minimum_impulse: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            current_iterations: 0,
            iterations_at_zero_impulse: 0,
            minimum_iterations: 1,
            maximum_iterations: usize::MAX,
            minimum_impulse: 0.001,
        }
    }
}

impl SolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum_iterations(mut self, minimum_iterations: usize) -> Self {
        self.minimum_iterations = minimum_iterations;
        self
    }

    pub fn maximum_iterations(mut self, maximum_iterations: usize) -> Self {
        self.maximum_iterations = maximum_iterations;
        self
    }

    pub fn minimum_impulse(mut self, minimum_impulse: f32) -> Self {
        self.minimum_impulse = minimum_impulse;
        self
    }

    #[inline]
    pub(crate) fn reset_counters(&mut self) {
        self.current_iterations = 0;
        self.iterations_at_zero_impulse = 0;
    }
}

/// Lock-protected part of a [`SolverItem`].
pub struct ItemState<T: ?Sized> {
    pub settings: SolverSettings,
    pub updateable: T,
}

/// A constraint wrapped with the bookkeeping the solver needs.
///
/// Index, ownership and activity live in atomics so the solver can filter
/// items without locking; settings and the constraint itself sit behind the
/// per-object lock.
pub struct SolverItem<T: ?Sized> {
    solver_index: AtomicUsize,
    owner: AtomicU64,
    is_active: AtomicBool,
    is_active_in_solver: AtomicBool,
    connection: Arc<SimulationIslandConnection>,
    state: Mutex<ItemState<T>>,
}

/// Type-erased item as stored by the solver.
pub type SharedUpdateable = Arc<SolverItem<dyn SolverUpdateable>>;

impl<T: SolverUpdateable> SolverItem<T> {
    /// Wrap `updateable`, connecting it to the islands of its bodies.
    pub fn new(updateable: T) -> Self {
        Self::with_settings(updateable, SolverSettings::default())
    }

    pub fn with_settings(updateable: T, settings: SolverSettings) -> Self {
        let connection = SimulationIslandConnection::from_bodies(&updateable.involved_bodies());
        Self {
            solver_index: AtomicUsize::new(NO_INDEX),
            owner: AtomicU64::new(NO_OWNER),
            is_active: AtomicBool::new(true),
            is_active_in_solver: AtomicBool::new(false),
            connection: Arc::new(connection),
            state: Mutex::new(ItemState {
                settings,
                updateable,
            }),
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl<T: ?Sized> SolverItem<T> {
    /// Block until the item's lock is held. The lock is released when the
    /// guard drops.
    #[inline]
    pub fn enter_lock(&self) -> MutexGuard<'_, ItemState<T>> {
        self.state.lock()
    }

    /// Take the lock only if it is free.
    #[inline]
    pub fn try_enter_lock(&self) -> Option<MutexGuard<'_, ItemState<T>>> {
        self.state.try_lock()
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> SolverSettings {
        self.state.lock().settings
    }

    /// Dense index in the owning solver, `None` if unowned.
    pub fn solver_index(&self) -> Option<usize> {
        match self.solver_index.load(Ordering::Acquire) {
            NO_INDEX => None,
            index => Some(index),
        }
    }

    pub(crate) fn set_solver_index(&self, index: usize) {
        self.solver_index.store(index, Ordering::Release);
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner.load(Ordering::Acquire)
    }

    /// Claim the item for `solver_id`. Fails if some solver already owns it.
    pub(crate) fn try_claim(&self, solver_id: u64) -> bool {
        self.owner
            .compare_exchange(NO_OWNER, solver_id, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.owner.store(NO_OWNER, Ordering::Release);
        self.solver_index.store(NO_INDEX, Ordering::Release);
        self.is_active_in_solver.store(false, Ordering::Release);
    }

    /// Whether the owner wants the constraint solved.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.is_active.store(active, Ordering::Release);
    }

    /// Whether the item takes part in the current step.
    #[inline]
    pub fn is_active_in_solver(&self) -> bool {
        self.is_active_in_solver.load(Ordering::Acquire)
    }

    pub(crate) fn deactivate_in_solver(&self) {
        self.is_active_in_solver.store(false, Ordering::Release);
    }

    /// Recompute [`is_active_in_solver`](Self::is_active_in_solver): the item
    /// is active and at least one of its islands is awake.
    pub fn update_solver_activity(&self) -> bool {
        let active = self.is_active() && self.connection.any_island_active();
        self.is_active_in_solver.store(active, Ordering::Release);
        active
    }

    pub fn simulation_island_connection(&self) -> &Arc<SimulationIslandConnection> {
        &self.connection
    }
}
