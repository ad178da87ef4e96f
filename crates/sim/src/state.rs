use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// °C, room temperature. The core shuts down at or below it.
pub const MIN_TEMP: f64 = 25.0;
/// °C, meltdown at or above it.
pub const MAX_TEMP: f64 = 1000.0;
/// °C, no power is generated at or below it.
pub const MIN_POWER_TEMP: f64 = 100.0;
/// MW at maximum temperature.
pub const MAX_POWER: f64 = 800.0;
/// cm, full insertion depth of the control rods.
pub const ROD_LENGTH: u32 = 200;
/// Temperature multiplier per tick.
pub const TEMP_FACTOR: f64 = 1.125;
/// Default bounds of the per-tick random temperature term.
pub const RAND_LOW: i32 = 3;
pub const RAND_HIGH: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Operating,
    Shutdown,
    Meltdown,
    Finished,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Operating)
    }

    fn from_temperature(temperature: f64) -> Option<Self> {
        if temperature >= MAX_TEMP {
            Some(Status::Meltdown)
        } else if temperature <= MIN_TEMP {
            Some(Status::Shutdown)
        } else {
            None
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Operating => "Operating",
            Status::Shutdown => "Shutdown",
            Status::Meltdown => "MELTDOWN!!",
            Status::Finished => "Finished",
        })
    }
}

/// One-step rod motion. At most one is accepted per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RodCommand {
    Drop,
    Raise,
    Lower,
}

/// Power output for a core temperature, zero at or below [`MIN_POWER_TEMP`].
pub fn power_at(temperature: f64) -> f64 {
    if temperature <= MIN_POWER_TEMP {
        return 0.0;
    }
    ((temperature - MIN_POWER_TEMP) * MAX_POWER / (MAX_TEMP - MIN_POWER_TEMP)).clamp(0.0, MAX_POWER)
}

/// Physical state of the core. Single-threaded; see [`crate::Reactor`] for the
/// shared, clock-driven wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    status: Status,
    temperature: f64,
    /// 0 = fully withdrawn, [`ROD_LENGTH`] = fully inserted
    rods_height: u32,
    power: f64,
    ticks: u64,
    avg_temperature: f64,
    avg_power: f64,
    /// Set by the first accepted rod command of a tick.
    rods_moved: bool,
    /// Latched by an emergency drop.
    rods_dropped: bool,
}

impl ReactorState {
    /// Inputs are taken as given; range checks live in [`crate::ReactorConfig::validate`].
    pub fn new(initial_temperature: f64, initial_rods_height: u32) -> Self {
        let power = power_at(initial_temperature);
        Self {
            status: Status::from_temperature(initial_temperature).unwrap_or(Status::Operating),
            temperature: initial_temperature,
            rods_height: initial_rods_height,
            power,
            ticks: 0,
            avg_temperature: initial_temperature,
            avg_power: power,
            rods_moved: false,
            rods_dropped: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn rods_height(&self) -> u32 {
        self.rods_height
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn avg_temperature(&self) -> f64 {
        self.avg_temperature
    }

    pub fn avg_power(&self) -> f64 {
        self.avg_power
    }

    pub fn rods_moved(&self) -> bool {
        self.rods_moved
    }

    pub fn rods_dropped(&self) -> bool {
        self.rods_dropped
    }

    /// Advance one tick with the given random term. Returns the resulting status.
    ///
    /// Once the status is terminal the state is frozen and this does nothing.
    pub fn step(&mut self, draw: i32) -> Status {
        if self.status.is_terminal() {
            return self.status;
        }

        self.ticks += 1;

        self.temperature = (TEMP_FACTOR * self.temperature - f64::from(self.rods_height)
            + f64::from(draw))
        .clamp(MIN_TEMP, MAX_TEMP);
        self.power = power_at(self.temperature);

        if let Some(status) = Status::from_temperature(self.temperature) {
            self.status = status;
        }

        if self.status == Status::Operating {
            let n = self.ticks as f64;
            self.avg_temperature = (self.avg_temperature * n + self.temperature) / (n + 1.0);
            self.avg_power = (self.avg_power * n + self.power) / (n + 1.0);
            self.rods_moved = false;
        }

        self.status
    }

    pub fn apply(&mut self, command: RodCommand) -> Result<(), CommandError> {
        match command {
            RodCommand::Drop => self.drop_rods(),
            RodCommand::Raise => self.raise_rods(),
            RodCommand::Lower => self.lower_rods(),
        }
    }

    /// Fully insert the rods. Locks out raise/lower for the rest of the run.
    pub fn drop_rods(&mut self) -> Result<(), CommandError> {
        self.check_motion()?;
        self.rods_height = ROD_LENGTH;
        self.rods_moved = true;
        self.rods_dropped = true;
        Ok(())
    }

    /// Withdraw the rods by one step.
    pub fn raise_rods(&mut self) -> Result<(), CommandError> {
        self.check_motion()?;
        self.check_not_dropped()?;
        if self.rods_height == 0 {
            return Err(CommandError::FullyWithdrawn);
        }
        self.rods_height -= 1;
        self.rods_moved = true;
        Ok(())
    }

    /// Insert the rods by one step.
    pub fn lower_rods(&mut self) -> Result<(), CommandError> {
        self.check_motion()?;
        self.check_not_dropped()?;
        if self.rods_height >= ROD_LENGTH {
            return Err(CommandError::FullyInserted);
        }
        self.rods_height += 1;
        self.rods_moved = true;
        Ok(())
    }

    /// End the run. Returns whether the status changed.
    pub fn quit(&mut self) -> bool {
        let changed = self.status != Status::Finished;
        self.status = Status::Finished;
        changed
    }

    /// Display lines in the format of the summary panel.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Ticks", self.ticks.to_string()),
            ("Temperature", format!("{:.5}°C", self.temperature)),
            ("Power", format!("{:.5}MW", self.power)),
            ("Avg. Temperature", format!("{:.5}°C", self.avg_temperature)),
            ("Avg. Power", format!("{:.5}MW", self.avg_power)),
        ]
    }

    fn check_motion(&self) -> Result<(), CommandError> {
        if self.status != Status::Operating {
            return Err(CommandError::NotOperating(self.status));
        }
        if self.rods_moved {
            return Err(CommandError::AlreadyMoved);
        }
        Ok(())
    }

    fn check_not_dropped(&self) -> Result<(), CommandError> {
        if self.rods_dropped {
            return Err(CommandError::RodsDropped);
        }
        Ok(())
    }
}
