//! Reactor core simulation with a predictive rod controller.
//!
//! Re-exports the workspace crates so integration tests and embedders can
//! depend on one crate: [`sim`] for the tick-driven reactor and its change
//! notification, [`safety`] for the worst-case lookahead, [`controller`] for
//! the automatic controller that ties the two together.

pub use controller::*;
pub use safety::*;
pub use sim::*;
