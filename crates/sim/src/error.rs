//! Error types for reactor construction and rod commands.

use std::time::Duration;

use thiserror::Error;

use crate::state::Status;

/// Rejected start configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial temperature {0} is outside [25, 1000]")]
    Temperature(f64),

    #[error("initial rod height {0} exceeds the rod length of 200")]
    RodsHeight(u32),

    #[error("tick interval must be positive, got {0:?}")]
    TickInterval(Duration),

    #[error("random term bounds are inverted: low {low} > high {high}")]
    DrawBounds { low: i32, high: i32 },
}

/// Why a rod or mode command did not take effect. State is unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("reactor is not operating ({0})")]
    NotOperating(Status),

    #[error("rods were already moved this tick")]
    AlreadyMoved,

    #[error("rods were dropped and are locked in place")]
    RodsDropped,

    #[error("rods are fully withdrawn")]
    FullyWithdrawn,

    #[error("rods are fully inserted")]
    FullyInserted,
}
