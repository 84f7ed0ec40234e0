//! Phased full-system simulation controller.
//!
//! This crate assembles a simulated machine and steers it through a guest workload in
//! phases, swapping CPU core models when the guest asks. It provides:
//! 1. **Capabilities:** Validation of ISA, coherence protocol, and host acceleration
//!    before anything is built.
//! 2. **Board:** Cache hierarchy, memory, and a switchable processor assembled from
//!    independent configurations, plus the boot workload.
//! 3. **Processor:** Parallel sets of core models sharing architectural state, with
//!    a drain-checked two-phase swap between them.
//! 4. **Simulation:** Exit-event dispatch with per-kind defaults and overrides, and
//!    the run loop that advances simulated time.
//! 5. **Statistics:** Per-run counters and region-of-interest bounds.

/// Common types and constants (errors, units, tick resolution).
pub mod common;
/// Controller configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Processor, core types, and core models.
pub mod core;
/// Capability checks, exit events, dispatch, and the run loop.
pub mod sim;
/// Board, cache hierarchy, memory, workload, and builder.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Umbrella error type.
pub use crate::common::SimError;
/// Switchable processor.
pub use crate::core::Processor;
/// Run loop; construct with `Simulator::from_config` or `Simulator::new`.
pub use crate::sim::Simulator;
/// Assembled hardware platform.
pub use crate::soc::Board;
