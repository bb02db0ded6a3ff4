//! Configuration for the solver, the contact manifolds and the world driver.

use glam::Vec3;

/// Configuration for the iterative solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum number of iterations any updateable receives per step. Default: 10.
    pub iteration_limit: usize,
    /// Initial permutation index. Restore a saved value for deterministic replay. Default: 0.
    pub permutation_index: usize,
    /// Worker threads for the prestep and iteration passes.
    /// `1` runs sequentially, `0` lets rayon pick. Default: 0.
    pub thread_count: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iteration_limit: 10,
            permutation_index: 0,
            thread_count: 0,
        }
    }
}

impl SolverConfig {
    /// Create a new solver configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-step iteration limit.
    pub fn iteration_limit(mut self, iteration_limit: usize) -> Self {
        self.iteration_limit = iteration_limit;
        self
    }

    /// Set the initial permutation index.
    pub fn permutation_index(mut self, permutation_index: usize) -> Self {
        self.permutation_index = permutation_index;
        self
    }

    /// Set the number of worker threads.
    pub fn thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }
}

/// Tunables for contact refresh, matching and reduction.
///
/// Passed explicitly to the manifold kernel so several worlds can run with
/// different settings side by side.
#[derive(Debug, Clone)]
pub struct CollisionDetectionSettings {
    /// Squared lateral drift after which a refreshed contact no longer
    /// represents the same feature. Default: 0.1².
    pub contact_invalidation_length_squared: f32,
    /// Separation beyond which a refreshed contact is dropped. Default: 0.1.
    pub maximum_contact_distance: f32,
    /// Squared distance under which an id-less candidate is treated as an
    /// existing contact. Default: 0.03².
    pub contact_minimum_separation_distance_squared: f32,
    /// Maximum contacts kept per manifold. Default: 4.
    pub max_contacts: usize,
}

impl Default for CollisionDetectionSettings {
    fn default() -> Self {
        Self {
            contact_invalidation_length_squared: 0.1 * 0.1,
            maximum_contact_distance: 0.1,
            contact_minimum_separation_distance_squared: 0.03 * 0.03,
            max_contacts: 4,
        }
    }
}

impl CollisionDetectionSettings {
    /// Create new collision settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lateral invalidation length (stored squared).
    pub fn contact_invalidation_length(mut self, length: f32) -> Self {
        self.contact_invalidation_length_squared = length * length;
        self
    }

    /// Set the maximum separation a refreshed contact may reach.
    pub fn maximum_contact_distance(mut self, distance: f32) -> Self {
        self.maximum_contact_distance = distance;
        self
    }

    /// Set the proximity threshold used to match id-less candidates (stored squared).
    pub fn contact_minimum_separation_distance(mut self, distance: f32) -> Self {
        self.contact_minimum_separation_distance_squared = distance * distance;
        self
    }
}

/// Configuration for the physics world driver.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81, 0).
    pub gravity: Vec3,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Solver configuration.
    pub solver: SolverConfig,
    /// Contact manifold configuration.
    pub collision: CollisionDetectionSettings,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            solver: SolverConfig::default(),
            collision: CollisionDetectionSettings::default(),
        }
    }
}
