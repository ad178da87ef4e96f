//! Worst-case lookahead over the reactor's temperature update.
//!
//! Every prediction assumes the highest random term each tick. A rod setting
//! is *coolable* when, inserting one more rod step per tick from then on, the
//! temperature comes back to where it started before it reaches meltdown or
//! the rods run out of travel.

use sim::{ReactorConfig, ReactorState, RodCommand, MAX_TEMP, RAND_HIGH, ROD_LENGTH, TEMP_FACTOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RodAction {
    /// Meltdown is possible next tick even with one more insertion step.
    Drop,
    /// Withdrawing a step is still coolable.
    Raise,
    /// Holding is not coolable; insert a step.
    Lower,
    /// Holding is coolable and raising is not.
    Hold,
}

impl RodAction {
    pub fn command(self) -> Option<RodCommand> {
        match self {
            RodAction::Drop => Some(RodCommand::Drop),
            RodAction::Raise => Some(RodCommand::Raise),
            RodAction::Lower => Some(RodCommand::Lower),
            RodAction::Hold => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lookahead {
    pub temp_factor: f64,
    pub max_temp: f64,
    pub rod_length: i64,
    /// Highest random term the reactor can draw.
    pub worst_draw: i64,
}

impl Default for Lookahead {
    fn default() -> Self {
        Self {
            temp_factor: TEMP_FACTOR,
            max_temp: MAX_TEMP,
            rod_length: i64::from(ROD_LENGTH),
            worst_draw: i64::from(RAND_HIGH),
        }
    }
}

impl Lookahead {
    /// Lookahead matching a reactor's configured random term.
    pub fn for_config(config: &ReactorConfig) -> Self {
        Self {
            worst_draw: i64::from(config.rand_high),
            ..Default::default()
        }
    }

    /// Worst-case temperature one tick after `temperature` with rods at `rods`.
    pub fn next_temperature(&self, temperature: f64, rods: i64) -> f64 {
        self.temp_factor * temperature - rods as f64 + self.worst_draw as f64
    }

    pub fn may_meltdown(&self, temperature: f64, rods: i64) -> bool {
        self.next_temperature(temperature, rods + 1) >= self.max_temp
    }

    pub fn can_raise(&self, temperature: f64, rods: i64) -> bool {
        let rods = rods - 1;
        self.is_coolable(self.next_temperature(temperature, rods), temperature, rods)
    }

    pub fn can_hold(&self, temperature: f64, rods: i64) -> bool {
        self.is_coolable(self.next_temperature(temperature, rods), temperature, rods)
    }

    /// Starting from `next` with rods at `rods`, can one-step-per-tick insertion
    /// bring the temperature back to at most `temperature`?
    ///
    /// Bounded: rods grow by one per iteration and the loop ends once they
    /// pass the rod length.
    pub fn is_coolable(&self, mut next: f64, temperature: f64, mut rods: i64) -> bool {
        while next > temperature && next < self.max_temp && rods <= self.rod_length {
            rods += 1;
            next = self.next_temperature(next, rods);
        }
        next < self.max_temp && rods <= self.rod_length
    }

    pub fn assess(&self, temperature: f64, rods: i64) -> RodAction {
        if self.may_meltdown(temperature, rods) {
            RodAction::Drop
        } else if self.can_raise(temperature, rods) {
            RodAction::Raise
        } else if !self.can_hold(temperature, rods) {
            RodAction::Lower
        } else {
            RodAction::Hold
        }
    }

    pub fn assess_state(&self, state: &ReactorState) -> RodAction {
        self.assess(state.temperature(), i64::from(state.rods_height()))
    }
}
