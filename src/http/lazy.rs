//! Once-computed, overridable request properties.
//!
//! # Design Decisions
//! - The computation is stored as a shared `Fn` so a `&self` read can run it;
//!   `OnceLock` guarantees it runs at most once
//! - An override replaces the cell outright, so the computation never runs
//!   once a value has been assigned
//! - The cell is `Sync`, so handlers may hold a borrow across `.await`

use std::fmt;
use std::sync::OnceLock;

type Compute<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A property materialized on first read.
pub struct LazyProperty<T> {
    value: OnceLock<T>,
    compute: Compute<T>,
}

impl<T> LazyProperty<T> {
    /// Wrap a zero-argument computation.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            value: OnceLock::new(),
            compute: Box::new(compute),
        }
    }

    /// Read the value, computing it on first access.
    pub fn get(&self) -> &T {
        self.value.get_or_init(|| (self.compute)())
    }

    /// Assign a value, bypassing the computation.
    pub fn set(&mut self, value: T) {
        self.value = OnceLock::from(value);
    }

    /// Whether a value has been computed or assigned.
    pub fn is_computed(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("LazyProperty").field(value).finish(),
            None => f.write_str("LazyProperty(<pending>)"),
        }
    }
}
