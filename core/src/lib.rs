use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod api;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod search;
pub mod session;
pub mod store;

/// Lock `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
