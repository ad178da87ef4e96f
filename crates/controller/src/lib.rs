//! Automatic rod control.
//!
//! A [`ReactorController`] listens to a reactor's change notification and,
//! unless suspended, answers each one with at most one rod command chosen by
//! the worst-case [`Lookahead`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use safety::{Lookahead, RodAction};
use sim::{CommandError, Reactor, Status, SubscriptionId};
use tracing::{debug, info};

struct Shared {
    /// Held for the whole of a reaction, so a mode switch waits for it.
    suspended: Mutex<bool>,
    lookahead: Lookahead,
}

impl Shared {
    fn suspended(&self) -> MutexGuard<'_, bool> {
        self.suspended.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn react(&self, reactor: &Reactor) -> Option<RodAction> {
        let suspended = self.suspended();
        if *suspended {
            return None;
        }

        let mut action = None;
        let outcome = reactor.respond(|state| {
            if state.status() != Status::Operating {
                return None;
            }
            let chosen = self.lookahead.assess_state(state);
            action = Some(chosen);
            chosen.command()
        });

        if let Some(chosen) = action {
            match outcome {
                Some((_, Err(err))) => debug!(action = ?chosen, %err, "controller action refused"),
                _ => debug!(action = ?chosen, "controller reacted"),
            }
        }
        action
    }
}

/// Automatic controller bound to one reactor.
///
/// Holds only a weak back-reference: the reactor's lifetime is not extended
/// by its controller. Dropping the controller unsubscribes it.
pub struct ReactorController {
    reactor: Weak<Reactor>,
    shared: Arc<Shared>,
    subscription: SubscriptionId,
}

impl ReactorController {
    /// Subscribe to `reactor`. Unless `start_suspended`, react once right away
    /// to the initial state.
    pub fn new(reactor: &Arc<Reactor>, start_suspended: bool) -> Self {
        let shared = Arc::new(Shared {
            suspended: Mutex::new(start_suspended),
            lookahead: Lookahead::for_config(reactor.config()),
        });

        let listener = {
            let shared = Arc::clone(&shared);
            let reactor = Arc::downgrade(reactor);
            Arc::new(move || {
                if let Some(reactor) = reactor.upgrade() {
                    shared.react(&reactor);
                }
            })
        };
        let subscription = reactor.subscribe(listener);

        shared.react(reactor);

        Self {
            reactor: Arc::downgrade(reactor),
            shared,
            subscription,
        }
    }

    pub fn set_suspended(&self, suspended: bool) {
        *self.shared.suspended() = suspended;
    }

    pub fn is_suspended(&self) -> bool {
        *self.shared.suspended()
    }

    /// Flip between automatic and manual control. Only allowed while the
    /// reactor is operating. Returns the new suspended state.
    pub fn switch_mode(&self) -> Result<bool, CommandError> {
        let status = self
            .reactor
            .upgrade()
            .map_or(Status::Finished, |reactor| reactor.status());
        if status != Status::Operating {
            return Err(CommandError::NotOperating(status));
        }

        let mut suspended = self.shared.suspended();
        *suspended = !*suspended;
        info!(automatic = !*suspended, "control mode switched");
        Ok(*suspended)
    }

    /// React to the current state now, as on a notification. Returns the
    /// action chosen, or `None` if suspended, not operating, or the reactor is gone.
    pub fn react(&self) -> Option<RodAction> {
        let reactor = self.reactor.upgrade()?;
        self.shared.react(&reactor)
    }
}

impl Drop for ReactorController {
    fn drop(&mut self) {
        if let Some(reactor) = self.reactor.upgrade() {
            reactor.unsubscribe(self.subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::{ReactorConfig, ROD_LENGTH};
    use std::time::Duration;

    fn reactor(temperature: f64, rods: u32) -> Arc<Reactor> {
        let cfg = ReactorConfig::new(temperature, rods, Duration::from_millis(1));
        Arc::new(Reactor::with_perturbation(cfg, |_: i32, high: i32| high).unwrap())
    }

    #[test]
    fn reacts_immediately_when_active() {
        let r = reactor(900.0, 0);
        let _c = ReactorController::new(&r, false);
        assert_eq!(r.rods_height(), ROD_LENGTH);
        assert!(r.snapshot().rods_dropped());
    }

    #[test]
    fn suspended_controller_does_nothing() {
        let r = reactor(900.0, 0);
        let c = ReactorController::new(&r, true);
        assert!(c.is_suspended());
        assert_eq!(r.rods_height(), 0);
        assert_eq!(c.react(), None);

        r.tick();
        assert_eq!(r.status(), Status::Meltdown);
    }

    #[test]
    fn resuming_reacts_on_next_notification() {
        let r = reactor(500.0, 50);
        let c = ReactorController::new(&r, true);
        r.tick();
        assert_eq!(r.rods_height(), 50);

        c.set_suspended(false);
        assert!(!c.is_suspended());
        r.tick();
        assert_eq!(r.rods_height(), 51);
    }

    #[test]
    fn one_action_per_notification() {
        let r = reactor(500.0, 50);
        let c = ReactorController::new(&r, false);
        assert_eq!(r.rods_height(), 51);

        // A second reaction in the same tick is refused by the reactor.
        assert_eq!(c.react(), Some(RodAction::Lower));
        assert_eq!(r.rods_height(), 51);
    }

    #[test]
    fn holds_without_command() {
        let r = reactor(500.0, 58);
        let c = ReactorController::new(&r, true);
        c.set_suspended(false);
        assert_eq!(c.react(), Some(RodAction::Hold));
        assert!(!r.snapshot().rods_moved());
    }

    #[test]
    fn switch_mode_only_while_operating() {
        let r = reactor(500.0, 50);
        let c = ReactorController::new(&r, true);
        assert_eq!(c.switch_mode(), Ok(false));
        assert_eq!(c.switch_mode(), Ok(true));

        r.quit();
        assert_eq!(
            c.switch_mode(),
            Err(CommandError::NotOperating(Status::Finished))
        );
        assert!(c.is_suspended());
    }

    #[test]
    fn dropped_controller_stops_reacting() {
        let r = reactor(500.0, 50);
        let c = ReactorController::new(&r, false);
        assert_eq!(r.rods_height(), 51);
        drop(c);

        r.tick();
        assert_eq!(r.rods_height(), 51);
    }

    #[test]
    fn controller_does_not_keep_reactor_alive() {
        let r = reactor(500.0, 50);
        let c = ReactorController::new(&r, false);
        let weak = Arc::downgrade(&r);
        drop(r);
        assert!(weak.upgrade().is_none());
        assert_eq!(c.react(), None);
    }

    #[test]
    fn keeps_a_cold_start_running_near_full_power() {
        let r = reactor(26.0, 0);
        let _c = ReactorController::new(&r, false);
        for _ in 0..1000 {
            r.tick();
        }
        let s = r.snapshot();
        assert_eq!(s.status(), Status::Operating);
        assert_eq!(s.ticks(), 1000);
        assert!(s.temperature() > 900.0);
        assert!(s.avg_power() > 0.0);
    }

    #[test]
    fn hot_start_drops_and_shuts_down() {
        let r = reactor(900.0, 0);
        let _c = ReactorController::new(&r, false);
        while r.tick() == Status::Operating {}
        assert_eq!(r.status(), Status::Shutdown);
        assert_eq!(r.rods_height(), ROD_LENGTH);
    }
}
