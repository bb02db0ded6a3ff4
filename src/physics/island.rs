//! Simulation island activity as seen by the solver.
//!
//! Island construction, merging and sleeping decisions belong to the
//! deactivation system. The solver only needs to know whether any island a
//! constraint touches is awake.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::rigid_body::SharedBody;

/// A connected group of bodies that sleeps and wakes as a unit.
#[derive(Debug)]
pub struct SimulationIsland {
    is_active: AtomicBool,
}

impl Default for SimulationIsland {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationIsland {
    /// Create an awake island.
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.is_active.store(active, Ordering::Release);
    }
}

/// Marks a connection as not registered with any manager.
const UNREGISTERED: usize = usize::MAX;

/// The islands a single solver updateable touches.
#[derive(Debug)]
pub struct SimulationIslandConnection {
    islands: Vec<Arc<SimulationIsland>>,
    manager_index: AtomicUsize,
}

impl SimulationIslandConnection {
    pub fn new(islands: Vec<Arc<SimulationIsland>>) -> Self {
        Self {
            islands,
            manager_index: AtomicUsize::new(UNREGISTERED),
        }
    }

    /// Collect the islands of `bodies`. Bodies without an island (static or
    /// kinematic) are skipped.
    pub fn from_bodies(bodies: &[SharedBody]) -> Self {
        let mut islands: Vec<Arc<SimulationIsland>> = Vec::with_capacity(bodies.len());
        for body in bodies {
            if let Some(island) = body.lock().island.clone() {
                if !islands.iter().any(|existing| Arc::ptr_eq(existing, &island)) {
                    islands.push(island);
                }
            }
        }
        Self::new(islands)
    }

    pub fn islands(&self) -> &[Arc<SimulationIsland>] {
        &self.islands
    }

    /// True if any connected island is awake.
    ///
    /// A constraint between an awake and a sleeping island stays live.
    #[inline]
    pub fn any_island_active(&self) -> bool {
        self.islands.iter().any(|island| island.is_active())
    }

    pub fn is_registered(&self) -> bool {
        self.manager_index.load(Ordering::Acquire) != UNREGISTERED
    }
}

/// Tracks the island connections of every updateable owned by solvers.
#[derive(Debug, Default)]
pub struct DeactivationManager {
    connections: Mutex<Vec<Arc<SimulationIslandConnection>>>,
}

impl DeactivationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection`. Registering an already-registered connection is a no-op.
    pub fn add(&self, connection: &Arc<SimulationIslandConnection>) {
        if connection.is_registered() {
            return;
        }
        let mut connections = self.connections.lock();
        connection
            .manager_index
            .store(connections.len(), Ordering::Release);
        connections.push(connection.clone());
    }

    /// Unregister `connection`. Unknown connections are ignored.
    pub fn remove(&self, connection: &Arc<SimulationIslandConnection>) {
        let mut connections = self.connections.lock();
        let index = connection.manager_index.load(Ordering::Acquire);
        let owned = connections
            .get(index)
            .is_some_and(|stored| Arc::ptr_eq(stored, connection));
        if !owned {
            return;
        }

        connections.swap_remove(index);
        if let Some(moved) = connections.get(index) {
            moved.manager_index.store(index, Ordering::Release);
        }
        connection
            .manager_index
            .store(UNREGISTERED, Ordering::Release);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }
}
