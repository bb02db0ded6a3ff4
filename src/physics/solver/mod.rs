//! Iterative impulse solver.
//!
//! # Step
//!
//! 1. Prestep: every item refreshes its activity; active items reset their
//!    counters, compute frame constants and warm start.
//! 2. Iteration: `iteration_limit * count` visits, permuted by a prime
//!    stride. Items retire once their impulses stay small or they hit an
//!    iteration cap.
//!
//! Both passes run through the solver's [`ParallelLooper`]. The parallel and
//! sequential paths share the same index math.

mod permutation;
mod updateable;

pub use permutation::PermutationMapper;
pub use updateable::{ItemState, SharedUpdateable, SolverItem, SolverSettings, SolverUpdateable};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::physics::island::DeactivationManager;
use crate::threading::{ParallelLooper, SequentialLooper};

static NEXT_SOLVER_ID: AtomicU64 = AtomicU64::new(1);

/// Drives a dense set of [`SolverItem`]s to convergence each step.
pub struct Solver {
    id: u64,
    items: Vec<SharedUpdateable>,
    iteration_limit: usize,
    permutation: PermutationMapper,
    looper: Arc<dyn ParallelLooper>,
    deactivation_manager: Arc<DeactivationManager>,
}

impl Solver {
    pub fn new(
        config: &SolverConfig,
        looper: Arc<dyn ParallelLooper>,
        deactivation_manager: Arc<DeactivationManager>,
    ) -> Self {
        Self {
            id: NEXT_SOLVER_ID.fetch_add(1, Ordering::Relaxed),
            items: Vec::new(),
            iteration_limit: config.iteration_limit,
            permutation: PermutationMapper::new(config.permutation_index),
            looper,
            deactivation_manager,
        }
    }

    /// Single-threaded solver with its own deactivation manager.
    pub fn sequential(config: &SolverConfig) -> Self {
        Self::new(
            config,
            Arc::new(SequentialLooper),
            Arc::new(DeactivationManager::new()),
        )
    }

    pub fn items(&self) -> &[SharedUpdateable] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn iteration_limit(&self) -> usize {
        self.iteration_limit
    }

    pub fn set_iteration_limit(&mut self, iteration_limit: usize) {
        self.iteration_limit = iteration_limit;
    }

    /// Current position in the prime table. Save it to replay a step.
    #[inline]
    pub fn permutation_index(&self) -> usize {
        self.permutation.permutation_index()
    }

    pub fn set_permutation_index(&mut self, index: usize) {
        self.permutation.set_permutation_index(index);
    }

    pub fn deactivation_manager(&self) -> &Arc<DeactivationManager> {
        &self.deactivation_manager
    }

    /// Add `item` at the end of the dense array.
    ///
    /// Fails with [`SolverError::AlreadyOwned`] if this or another solver
    /// already owns the item.
    pub fn add(&mut self, item: SharedUpdateable) -> Result<(), SolverError> {
        if !item.try_claim(self.id) {
            return Err(SolverError::AlreadyOwned);
        }
        item.set_solver_index(self.items.len());
        self.deactivation_manager
            .add(item.simulation_island_connection());
        self.items.push(item);
        tracing::debug!(solver = self.id, count = self.items.len(), "added solver item");
        Ok(())
    }

    /// Remove `item`, moving the last item into its slot.
    ///
    /// Fails with [`SolverError::NotOwned`] if this solver does not own it.
    pub fn remove<T>(&mut self, item: &Arc<SolverItem<T>>) -> Result<(), SolverError>
    where
        T: SolverUpdateable + ?Sized,
    {
        if item.owner() != self.id {
            return Err(SolverError::NotOwned);
        }
        let index = item
            .solver_index()
            .filter(|&index| {
                self.items.get(index).is_some_and(|stored| {
                    std::ptr::addr_eq(Arc::as_ptr(stored), Arc::as_ptr(item))
                })
            })
            .ok_or(SolverError::NotOwned)?;

        self.items.swap_remove(index);
        if let Some(moved) = self.items.get(index) {
            moved.set_solver_index(index);
        }
        item.release();
        self.deactivation_manager
            .remove(item.simulation_island_connection());
        tracing::debug!(solver = self.id, count = self.items.len(), "removed solver item");
        Ok(())
    }

    /// Advance the permutation and run the prestep and iteration passes.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            tracing::warn!(dt, "ignoring non-positive solver timestep");
            return;
        }
        self.permutation.advance();

        let count = self.items.len();
        tracing::trace!(
            count,
            permutation_index = self.permutation.permutation_index(),
            "solver update"
        );
        if count == 0 {
            return;
        }

        let items = &self.items;
        let iteration_limit = self.iteration_limit;
        let permutation = self.permutation;
        let iterations = iteration_limit.saturating_mul(count);

        if self.looper.thread_count() > 1 {
            self.looper
                .for_loop(0, count, &|i| prestep(&items[i], dt));
            self.looper.for_loop(0, iterations, &|i| {
                iterate(&items[permutation.map(i, count)], iteration_limit)
            });
        } else {
            for item in items {
                prestep(item, dt);
            }
            for i in 0..iterations {
                iterate(&items[permutation.map(i, count)], iteration_limit);
            }
        }
    }
}

fn prestep(item: &SharedUpdateable, dt: f32) {
    if !item.update_solver_activity() {
        return;
    }
    let mut state = item.enter_lock();
    state.settings.reset_counters();
    state.updateable.update(dt);
    state.updateable.exclusive_update();
}

fn iterate(item: &SharedUpdateable, iteration_limit: usize) {
    if !item.is_active_in_solver() {
        return;
    }
    let mut state = item.enter_lock();
    // Another worker may have retired the item while this one waited.
    if !item.is_active_in_solver() {
        return;
    }

    state.settings.current_iterations += 1;
    if state.settings.current_iterations > iteration_limit
        || state.settings.current_iterations > state.settings.maximum_iterations
    {
        item.deactivate_in_solver();
        return;
    }

    let impulse = state.updateable.solve_iteration();
    if impulse < state.settings.minimum_impulse {
        state.settings.iterations_at_zero_impulse += 1;
        if state.settings.iterations_at_zero_impulse > state.settings.minimum_iterations {
            item.deactivate_in_solver();
        }
    } else {
        state.settings.iterations_at_zero_impulse = 0;
    }
}
