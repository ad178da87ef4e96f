//! Thread-safe reactor driven by a periodic tick loop.
//!
//! One mutex guards the physical state and the random source together, so
//! a tick, a rod command and a snapshot read never interleave. Listeners are
//! notified after the lock is released; they run on the tick thread and may
//! call straight back into the reactor.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace};

use crate::config::ReactorConfig;
use crate::error::{CommandError, ConfigError};
use crate::lock;
use crate::observer::{Listener, Notifier, SubscriptionId};
use crate::perturbation::{Perturbation, UniformPerturbation};
use crate::state::{ReactorState, RodCommand, Status};

struct Core {
    state: ReactorState,
    source: Box<dyn Perturbation>,
}

pub struct Reactor {
    config: ReactorConfig,
    core: Mutex<Core>,
    notifier: Notifier,
}

impl Reactor {
    /// Reactor drawing its random term from an entropy-seeded RNG.
    pub fn new(config: ReactorConfig) -> Result<Self, ConfigError> {
        Self::with_perturbation(config, UniformPerturbation::from_entropy())
    }

    pub fn with_perturbation(
        config: ReactorConfig,
        source: impl Perturbation + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = ReactorState::new(config.initial_temperature, config.initial_rods_height);
        info!(
            temperature = config.initial_temperature,
            rods_height = config.initial_rods_height,
            tick_ms = config.tick_interval.as_millis() as u64,
            status = %state.status(),
            "reactor created"
        );
        Ok(Self {
            config,
            core: Mutex::new(Core {
                state,
                source: Box::new(source),
            }),
            notifier: Notifier::new(),
        })
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Consistent copy of every state field.
    pub fn snapshot(&self) -> ReactorState {
        lock(&self.core).state
    }

    pub fn status(&self) -> Status {
        lock(&self.core).state.status()
    }

    pub fn temperature(&self) -> f64 {
        lock(&self.core).state.temperature()
    }

    pub fn rods_height(&self) -> u32 {
        lock(&self.core).state.rods_height()
    }

    pub fn power(&self) -> f64 {
        lock(&self.core).state.power()
    }

    pub fn ticks(&self) -> u64 {
        lock(&self.core).state.ticks()
    }

    pub fn avg_temperature(&self) -> f64 {
        lock(&self.core).state.avg_temperature()
    }

    pub fn avg_power(&self) -> f64 {
        lock(&self.core).state.avg_power()
    }

    /// Register a listener called after every tick and after [`Reactor::quit`].
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn drop_rods(&self) -> Result<(), CommandError> {
        self.command(RodCommand::Drop)
    }

    pub fn raise_rods(&self) -> Result<(), CommandError> {
        self.command(RodCommand::Raise)
    }

    pub fn lower_rods(&self) -> Result<(), CommandError> {
        self.command(RodCommand::Lower)
    }

    pub fn command(&self, command: RodCommand) -> Result<(), CommandError> {
        let result = lock(&self.core).state.apply(command);
        log_command(command, &result);
        result
    }

    /// Read the state, choose at most one rod command and apply it, all under
    /// one lock. Returns the chosen command and its outcome.
    pub fn respond<F>(&self, policy: F) -> Option<(RodCommand, Result<(), CommandError>)>
    where
        F: FnOnce(&ReactorState) -> Option<RodCommand>,
    {
        let (command, result) = {
            let mut core = lock(&self.core);
            let command = policy(&core.state)?;
            (command, core.state.apply(command))
        };
        log_command(command, &result);
        Some((command, result))
    }

    /// End the run. Subscribers are notified if this changed the status.
    pub fn quit(&self) {
        let changed = lock(&self.core).state.quit();
        if changed {
            info!("simulation finished by request");
            self.notifier.notify();
        }
    }

    /// Advance one tick and notify subscribers.
    ///
    /// Does nothing, and notifies no one, once the status is terminal.
    pub fn tick(&self) -> Status {
        let (before, after) = {
            let mut core = lock(&self.core);
            let before = core.state;
            if before.status().is_terminal() {
                return before.status();
            }
            let draw = core
                .source
                .draw(self.config.rand_low, self.config.rand_high);
            core.state.step(draw);
            (before, core.state)
        };

        debug!(
            tick = after.ticks(),
            temperature = after.temperature(),
            power = after.power(),
            rods_height = after.rods_height(),
            "tick"
        );
        if after.status() != before.status() {
            info!(
                tick = after.ticks(),
                temperature = after.temperature(),
                status = %after.status(),
                "reactor left operation"
            );
        }

        self.notifier.notify();
        after.status()
    }

    /// Sleep-then-tick until the status leaves [`Status::Operating`].
    pub fn run(&self) {
        while self.status() == Status::Operating {
            thread::sleep(self.config.tick_interval);
            self.tick();
        }
        let state = self.snapshot();
        info!(
            ticks = state.ticks(),
            status = %state.status(),
            avg_temperature = state.avg_temperature(),
            avg_power = state.avg_power(),
            "tick loop stopped"
        );
    }

    /// Run the tick loop on a dedicated thread.
    pub fn spawn(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let reactor = Arc::clone(self);
        thread::Builder::new()
            .name("reactor-tick".into())
            .spawn(move || reactor.run())
    }
}

fn log_command(command: RodCommand, result: &Result<(), CommandError>) {
    match result {
        Ok(()) => debug!(?command, "rods moved"),
        Err(err) => trace!(?command, %err, "rod command ignored"),
    }
}
