use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::{MAX_TEMP, MIN_TEMP, RAND_HIGH, RAND_LOW, ROD_LENGTH};

/// Start configuration of a [`crate::Reactor`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// °C, within [`MIN_TEMP`, `MAX_TEMP`]
    pub initial_temperature: f64,
    /// cm, within [0, `ROD_LENGTH`]
    pub initial_rods_height: u32,
    pub tick_interval: Duration,
    /// Inclusive bounds of the per-tick random temperature term.
    pub rand_low: i32,
    pub rand_high: i32,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 26.0,
            initial_rods_height: 0,
            tick_interval: Duration::from_millis(200),
            rand_low: RAND_LOW,
            rand_high: RAND_HIGH,
        }
    }
}

impl ReactorConfig {
    pub fn new(initial_temperature: f64, initial_rods_height: u32, tick_interval: Duration) -> Self {
        Self {
            initial_temperature,
            initial_rods_height,
            tick_interval,
            ..Default::default()
        }
    }

    pub fn with_draw_bounds(mut self, low: i32, high: i32) -> Self {
        self.rand_low = low;
        self.rand_high = high;
        self
    }

    /// Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.initial_temperature;
        if !t.is_finite() || !(MIN_TEMP..=MAX_TEMP).contains(&t) {
            return Err(ConfigError::Temperature(t));
        }
        if self.initial_rods_height > ROD_LENGTH {
            return Err(ConfigError::RodsHeight(self.initial_rods_height));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::TickInterval(self.tick_interval));
        }
        if self.rand_low > self.rand_high {
            return Err(ConfigError::DrawBounds {
                low: self.rand_low,
                high: self.rand_high,
            });
        }
        Ok(())
    }
}
