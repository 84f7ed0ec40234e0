//! Core-type enumeration.

use std::fmt;

use serde::Deserialize;

/// A named implementation of a CPU core's execution semantics.
///
/// Sibling core types share architectural state and can replace one another
/// through a processor switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoreType {
    /// Functional model, one instruction per cycle, no memory timing.
    Atomic,
    /// Host-accelerated virtual CPU.
    Kvm,
    /// In-order model with timing memory accesses.
    Timing,
    /// Pipelined in-order model.
    Minor,
    /// Out-of-order model.
    O3,
}

impl CoreType {
    /// Every core type, in declaration order.
    pub const ALL: [Self; 5] = [Self::Atomic, Self::Kvm, Self::Timing, Self::Minor, Self::O3];

    /// `true` if this model runs on host virtualization hardware.
    pub const fn requires_kvm(self) -> bool {
        matches!(self, Self::Kvm)
    }

    /// `true` if this model performs memory accesses that can still be in flight
    /// when execution stops, so it must be drained before a switch.
    pub const fn is_timing(self) -> bool {
        matches!(self, Self::Timing | Self::Minor | Self::O3)
    }

    /// Average cycles per instruction charged by the built-in core model.
    pub const fn cycles_per_inst(self) -> u64 {
        match self {
            Self::Atomic | Self::Kvm => 1,
            Self::O3 => 2,
            Self::Minor => 3,
            Self::Timing => 4,
        }
    }

    /// Maximum number of memory operations the built-in model keeps in flight.
    pub const fn max_in_flight(self) -> u32 {
        match self {
            Self::Atomic | Self::Kvm => 0,
            Self::Timing => 1,
            Self::Minor => 4,
            Self::O3 => 16,
        }
    }
}

impl fmt::Display for CoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Atomic => "ATOMIC",
            Self::Kvm => "KVM",
            Self::Timing => "TIMING",
            Self::Minor => "MINOR",
            Self::O3 => "O3",
        };
        f.write_str(name)
    }
}
