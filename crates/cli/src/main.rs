use std::io::{self, BufRead, Write};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use controller::ReactorController;
use serde::Serialize;
use sim::{Reactor, ReactorConfig, ReactorState, RodCommand, Status, UniformPerturbation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "reactor-sim",
    version,
    about = "Reactor core simulation with a predictive rod controller"
)]
struct Args {
    /// Initial core temperature (°C)
    #[arg(long, default_value_t = 26.0)]
    temperature: f64,

    /// Initial rod insertion (cm)
    #[arg(long, default_value_t = 0)]
    rods: u32,

    /// Tick interval in milliseconds (larger is slower)
    #[arg(long, default_value_t = 200)]
    tick_ms: u64,

    /// Start under automatic control
    #[arg(long)]
    automatic: bool,

    /// RNG seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// End the simulation once this many ticks have elapsed
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Lower bound of the per-tick random temperature term
    #[arg(long, default_value_t = sim::RAND_LOW, allow_hyphen_values = true)]
    rand_low: i32,

    /// Upper bound of the per-tick random temperature term
    #[arg(long, default_value_t = sim::RAND_HIGH, allow_hyphen_values = true)]
    rand_high: i32,
}

#[derive(Serialize)]
struct TraceRow {
    #[serde(flatten)]
    state: ReactorState,
    automatic: bool,
}

/// A line typed on stdin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input {
    Rods(RodCommand),
    End,
    SwitchMode,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "d" | "drop" => Some(Input::Rods(RodCommand::Drop)),
        "r" | "raise" => Some(Input::Rods(RodCommand::Raise)),
        "l" | "lower" => Some(Input::Rods(RodCommand::Lower)),
        "q" | "end" | "quit" => Some(Input::End),
        "a" | "auto" => Some(Input::SwitchMode),
        _ => None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = ReactorConfig::new(
        args.temperature,
        args.rods,
        Duration::from_millis(args.tick_ms),
    )
    .with_draw_bounds(args.rand_low, args.rand_high);
    let source = match args.seed {
        Some(seed) => UniformPerturbation::new(seed),
        None => UniformPerturbation::from_entropy(),
    };
    let reactor = Arc::new(
        Reactor::with_perturbation(config, source).context("invalid start configuration")?,
    );
    let controller = Arc::new(ReactorController::new(&reactor, !args.automatic));

    // Output JSONL trace to stdout (one object per notification)
    emit(&reactor, &controller);
    {
        let weak = Arc::downgrade(&reactor);
        let controller = Arc::clone(&controller);
        reactor.subscribe(Arc::new(move || {
            if let Some(reactor) = weak.upgrade() {
                emit(&reactor, &controller);
            }
        }));
    }

    if let Some(max_ticks) = args.max_ticks {
        let weak = Arc::downgrade(&reactor);
        reactor.subscribe(Arc::new(move || {
            if let Some(reactor) = weak.upgrade() {
                let state = reactor.snapshot();
                if state.status() == Status::Operating && state.ticks() >= max_ticks {
                    reactor.quit();
                }
            }
        }));
    }

    {
        let weak = Arc::downgrade(&reactor);
        let controller = Arc::clone(&controller);
        thread::Builder::new()
            .name("manual-input".into())
            .spawn(move || read_commands(weak, &controller))
            .context("spawning input thread")?;
    }

    reactor
        .spawn()
        .context("spawning tick thread")?
        .join()
        .map_err(|_| anyhow!("tick thread panicked"))?;

    let state = reactor.snapshot();
    info!(status = %state.status(), "simulation ended");
    for (label, value) in state.summary() {
        info!("{label}: {value}");
    }

    Ok(())
}

fn emit(reactor: &Reactor, controller: &ReactorController) {
    let row = TraceRow {
        state: reactor.snapshot(),
        automatic: !controller.is_suspended(),
    };
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer(&mut out, &row)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(out));
    if let Err(err) = written {
        warn!(%err, "failed to write trace row");
    }
}

/// Manual control from stdin. Rod commands are refused while the controller
/// is in charge.
fn read_commands(reactor: Weak<Reactor>, controller: &ReactorController) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let Some(reactor) = reactor.upgrade() else { break };
        if reactor.status().is_terminal() {
            break;
        }

        match parse_input(&line) {
            Some(Input::Rods(command)) if !controller.is_suspended() => {
                warn!(?command, "automatic control is on; switch mode first");
            }
            Some(Input::Rods(command)) => {
                if let Err(err) = reactor.command(command) {
                    warn!(?command, %err, "rod command ignored");
                }
            }
            Some(Input::End) => reactor.quit(),
            Some(Input::SwitchMode) => match controller.switch_mode() {
                Ok(suspended) => info!(automatic = !suspended, "mode switched"),
                Err(err) => warn!(%err, "cannot switch mode"),
            },
            None => warn!(input = line.trim(), "unknown command (drop, raise, lower, auto, end)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(parse_input("drop"), Some(Input::Rods(RodCommand::Drop)));
        assert_eq!(parse_input(" R \n"), Some(Input::Rods(RodCommand::Raise)));
        assert_eq!(parse_input("lower"), Some(Input::Rods(RodCommand::Lower)));
        assert_eq!(parse_input("End"), Some(Input::End));
        assert_eq!(parse_input("auto"), Some(Input::SwitchMode));
        assert_eq!(parse_input("melt"), None);
    }

    #[test]
    fn args_defaults_match_start_menu() {
        let args = Args::parse_from(["reactor-sim"]);
        assert_eq!(args.temperature, 26.0);
        assert_eq!(args.rods, 0);
        assert_eq!(args.tick_ms, 200);
        assert!(!args.automatic);
        assert_eq!((args.rand_low, args.rand_high), (3, 3));
    }

    #[test]
    fn negative_draw_bounds_parse() {
        let args = Args::parse_from(["reactor-sim", "--rand-low", "-3", "--rand-high", "3"]);
        assert_eq!(args.rand_low, -3);
    }

    #[test]
    fn trace_row_flattens_state() {
        let row = TraceRow {
            state: ReactorState::new(500.0, 50),
            automatic: true,
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["status"], "operating");
        assert_eq!(v["rods_height"], 50);
        assert_eq!(v["automatic"], true);
    }
}
