//! Processor and core models.
//!
//! This module contains the switchable processor, the core-type enumeration, the
//! architectural state shared by sibling core models, and the pluggable core-model
//! contract.

/// Core-type enumeration (functional, KVM, timing, minor, out-of-order).
pub mod core_type;

/// Core-model contract, factory, and the built-in model.
pub mod model;

/// Switchable processor and its switch state machine.
pub mod processor;

/// Guest-visible architectural state.
pub mod state;

pub use self::core_type::CoreType;
pub use self::model::{BasicCore, BasicCoreFactory, CoreFactory, CoreModel};
pub use self::processor::{Core, Processor, SwitchState};
pub use self::state::ArchState;
