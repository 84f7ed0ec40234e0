//! Common types shared across the controller.
//!
//! This module provides fundamental building blocks used by every component. It includes:
//! 1. **Constants:** Tick resolution, default termination reasons, register counts.
//! 2. **Error Handling:** The setup/config/switch/run error taxonomy.
//! 3. **Units:** Byte sizes and clock frequencies parsed from configuration text.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types for every failure class.
pub mod error;

/// Byte-size and frequency quantities.
pub mod units;

pub use constants::TICKS_PER_SECOND;
pub use error::{ConfigError, RunError, SetupError, SimError, SwitchError};
pub use units::{ByteSize, Frequency};
