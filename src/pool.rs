//! Type-keyed recycling of scratch buffers.
//!
//! Manifold maintenance needs a handful of short-lived lists every frame.
//! `ResourcePool` keeps released instances per concrete type and hands them
//! back out on `acquire`, so steady-state frames do not allocate.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::Mutex;

/// Instances retained per type before released values are simply dropped.
const MAX_RETAINED_PER_TYPE: usize = 64;

/// A value that can be recycled through a [`ResourcePool`].
pub trait Poolable: Default + Send + 'static {
    /// Return the value to its freshly-constructed state, keeping allocations.
    fn reset(&mut self);
}

impl<T: Send + 'static> Poolable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Free lists of reusable values keyed by type.
#[derive(Default)]
pub struct ResourcePool {
    free: Mutex<HashMap<TypeId, Vec<Box<dyn Any + Send>>>>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a recycled value of type `T`, or a default one if none is free.
    pub fn acquire<T: Poolable>(&self) -> T {
        let recycled = self
            .free
            .lock()
            .get_mut(&TypeId::of::<T>())
            .and_then(|list| list.pop());

        recycled
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Reset `value` and make it available to later `acquire` calls.
    pub fn release<T: Poolable>(&self, mut value: T) {
        value.reset();
        let mut free = self.free.lock();
        let list = free.entry(TypeId::of::<T>()).or_default();
        if list.len() < MAX_RETAINED_PER_TYPE {
            list.push(Box::new(value));
        }
    }

    /// Number of free instances currently held for type `T`.
    pub fn available<T: Poolable>(&self) -> usize {
        self.free
            .lock()
            .get(&TypeId::of::<T>())
            .map_or(0, |list| list.len())
    }
}
