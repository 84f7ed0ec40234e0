//! Simulation control.
//!
//! This module drives a built board through a workload. It includes:
//! 1. **Capabilities:** Checking a configuration's needs against the host.
//! 2. **Exit events:** Guest signals and the directives handlers return.
//! 3. **Dispatch:** Per-kind default actions and caller overrides.
//! 4. **Run loop:** The simulator, its clock, and the engine seam, with a
//!    built-in scripted guest.

/// Simulated clock.
pub mod clock;

/// Exit-event handler registry and default actions.
pub mod dispatcher;

/// Engine contract and step outcome.
pub mod engine;

/// Exit-event kinds and run directives.
pub mod exit_event;

/// Scripted guest engine.
pub mod guest;

/// Capability requirements and validation.
pub mod requires;

/// Run loop.
pub mod simulator;

pub use clock::SimulationClock;
pub use dispatcher::{ExitContext, ExitEventDispatcher};
pub use engine::{Engine, Step};
pub use exit_event::{ExitEvent, IntoDirective, RunDirective};
pub use guest::ScriptedGuest;
pub use requires::{CapabilityRequirement, HostCapabilities, validate};
pub use simulator::{RunResult, RunState, Simulator, Termination};
