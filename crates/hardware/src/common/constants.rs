//! System-wide constants.

/// Simulation ticks per simulated second (one tick is one picosecond).
pub const TICKS_PER_SECOND: u64 = 1_000_000_000_000;

/// Reason reported when the guest raises a plain exit with no override.
pub const REASON_GUEST_STOP: &str = "guest requested stop";

/// Reason reported when the guest raises a failure with no override.
pub const REASON_GUEST_FAIL: &str = "guest reported failure";

/// Reason reported when the configured tick limit is reached.
pub const REASON_MAX_TICK: &str = "simulation reached max tick";

/// Number of general-purpose registers carried across a core switch.
pub const NUM_GPRS: usize = 32;

/// Bytes per instruction assumed when advancing the program counter.
pub const INST_BYTES: u64 = 4;
