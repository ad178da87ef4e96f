//! Tick-driven reactor core simulation.
//!
//! [`ReactorState`] is the bare state machine; [`Reactor`] shares it across
//! threads, drives it from a clock and broadcasts a change notification after
//! every tick.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod error;
pub mod observer;
pub mod perturbation;
pub mod reactor;
pub mod state;

pub use config::ReactorConfig;
pub use error::{CommandError, ConfigError};
pub use observer::{Listener, Notifier, SubscriptionId};
pub use perturbation::{Perturbation, UniformPerturbation};
pub use reactor::Reactor;
pub use state::{
    power_at, ReactorState, RodCommand, Status, MAX_POWER, MAX_TEMP, MIN_POWER_TEMP, MIN_TEMP,
    RAND_HIGH, RAND_LOW, ROD_LENGTH, TEMP_FACTOR,
};

/// State behind our mutexes is whole between statements, so a panic in a
/// listener does not leave it half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
