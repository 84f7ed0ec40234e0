//! Error taxonomy for the simulation controller.
//!
//! This module defines one error type per failure class. It provides:
//! 1. **Setup errors:** Missing capabilities, raised before any hardware object exists.
//! 2. **Config errors:** Structurally invalid hardware or workload configuration.
//! 3. **Switch errors:** Recoverable failures of a core-model swap (the processor is left untouched).
//! 4. **Run errors:** Fatal failures that stop the run loop, with the model's reason preserved verbatim.
//! 5. **Umbrella:** `SimError`, which every class converts into for end-to-end setup code.

use thiserror::Error;

use crate::config::{CoherenceProtocol, Isa};
use crate::core::CoreType;

/// Capability check failure; fatal, raised before construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// The requested instruction-set architecture is not compiled into this build.
    #[error("ISA {0} is not supported by this build")]
    UnsupportedIsa(Isa),

    /// The coherence protocol is unavailable for the requested ISA.
    #[error("coherence protocol {protocol} is not supported for ISA {isa}")]
    UnsupportedProtocol {
        /// Requested ISA.
        isa: Isa,
        /// Requested coherence protocol.
        protocol: CoherenceProtocol,
    },

    /// Hardware-accelerated execution was requested but the host cannot provide it.
    #[error("KVM acceleration is required but unavailable: {0}")]
    KvmUnavailable(String),
}

/// Structurally invalid configuration; fatal at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A size-like field was zero.
    #[error("{field} must be positive")]
    NonPositive {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// A geometry field does not divide evenly (cache sets, banks, channels).
    #[error("{field}: {detail}")]
    BadGeometry {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable description of the mismatch.
        detail: String,
    },

    /// Start and switch core types of a switchable processor are identical.
    #[error("switchable processor needs two distinct core types, got {0} twice")]
    DuplicateCoreType(CoreType),

    /// A core model could not be instantiated.
    #[error("cannot create {core_type} model for core {index}: {reason}")]
    CoreModel {
        /// Core type requested from the factory.
        core_type: CoreType,
        /// Logical core index.
        index: usize,
        /// Factory-supplied reason.
        reason: String,
    },

    /// A board already carries a workload.
    #[error("a workload is already attached to this board")]
    WorkloadAlreadyAttached,

    /// A recognized workload parameter has the wrong shape.
    #[error("workload parameter `{key}` {detail}")]
    WorkloadParameter {
        /// Parameter key.
        key: String,
        /// What was expected.
        detail: String,
    },

    /// A size or frequency string could not be parsed.
    #[error("cannot parse `{input}` as {what}")]
    Parse {
        /// Offending text.
        input: String,
        /// Kind of quantity expected.
        what: &'static str,
    },

    /// Configuration text could not be deserialized.
    #[error("invalid configuration: {0}")]
    Deserialize(String),

    /// A configuration file could not be read.
    #[error("cannot read configuration file `{path}`: {reason}")]
    Io {
        /// File path as given.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Core-model swap failure. The processor stays in its pre-switch state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// Another swap on the same processor has not finished.
    #[error("a core switch is already in progress")]
    SwitchInProgress,

    /// The swap cannot be performed for every core.
    #[error("incompatible core state: {0}")]
    IncompatibleState(String),
}

/// Fatal run-loop failure.
#[derive(Debug, Error)]
pub enum RunError {
    /// The hardware model reported an unrecoverable failure.
    #[error("hardware model failed at tick {tick}: {reason}")]
    ModelFailure {
        /// Clock value when the failure was reported.
        tick: u64,
        /// Model-supplied reason, verbatim.
        reason: String,
    },

    /// An exit event was raised that has neither a handler nor a default.
    #[error("no handler or default action for exit event `{0}`")]
    UnhandledExitEvent(String),

    /// A core switch requested during the run failed.
    #[error("core switch failed during run: {0}")]
    Switch(#[from] SwitchError),

    /// A caller-supplied handler failed.
    #[error("exit event handler failed: {0}")]
    Handler(String),

    /// `run` was invoked on a simulator that is not idle.
    #[error("simulator is {0}, expected idle")]
    NotIdle(&'static str),
}

impl From<String> for RunError {
    fn from(reason: String) -> Self {
        Self::Handler(reason)
    }
}

impl From<&str> for RunError {
    fn from(reason: &str) -> Self {
        Self::Handler(reason.to_string())
    }
}

/// Any failure of the controller, from setup through the end of a run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Capability check failed.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Standalone switch failed.
    #[error(transparent)]
    Switch(#[from] SwitchError),
    /// Run loop failed.
    #[error(transparent)]
    Run(#[from] RunError),
}
