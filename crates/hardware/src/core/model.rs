//! Pluggable core models.
//!
//! The instruction-accurate cores are external collaborators. This module defines the
//! contract the processor needs from them. It provides:
//! 1. **`CoreModel`:** Execute, drain, and hand architectural state over on a switch.
//! 2. **`CoreFactory`:** Instantiates one model per (core type, logical core) pair at build time.
//! 3. **`BasicCore`:** The built-in model, charging a fixed CPI per core type.

use std::fmt;

use crate::config::Isa;
use crate::core::CoreType;
use crate::core::state::ArchState;

/// Contract between the processor and one core-model instance.
///
/// A model that is switched out must hand its architectural state to its
/// replacement through `take_state`/`load_state`; anything else it holds is
/// discarded.
pub trait CoreModel: Send + fmt::Debug {
    /// Core type implemented by this model.
    fn core_type(&self) -> CoreType;

    /// ISA executed by this model.
    fn isa(&self) -> Isa;

    /// Current architectural state.
    fn state(&self) -> &ArchState;

    /// Installs architectural state taken from a sibling model.
    fn load_state(&mut self, state: ArchState);

    /// Removes and returns the architectural state, leaving a reset state behind.
    fn take_state(&mut self) -> ArchState {
        let next = ArchState::new(self.state().pc);
        let prev = self.state().clone();
        self.load_state(next);
        prev
    }

    /// Number of memory operations issued but not yet completed.
    fn in_flight(&self) -> u32;

    /// `true` when no memory operation is in flight.
    fn is_drained(&self) -> bool {
        self.in_flight() == 0
    }

    /// Completes every in-flight operation without advancing simulated time.
    fn drain(&mut self);

    /// Executes `insts` instructions and returns the cycles they took.
    ///
    /// # Errors
    ///
    /// Returns the model's failure reason verbatim if it cannot continue.
    fn execute(&mut self, insts: u64) -> Result<u64, String>;
}

/// Creates core models for a processor.
pub trait CoreFactory {
    /// Builds the model of `core_type` for logical core `index`.
    ///
    /// # Errors
    ///
    /// Returns a reason if the combination cannot be instantiated.
    fn create(&self, core_type: CoreType, isa: Isa, index: usize) -> Result<Box<dyn CoreModel>, String>;
}

impl<F> CoreFactory for F
where
    F: Fn(CoreType, Isa, usize) -> Result<Box<dyn CoreModel>, String>,
{
    fn create(&self, core_type: CoreType, isa: Isa, index: usize) -> Result<Box<dyn CoreModel>, String> {
        self(core_type, isa, index)
    }
}

/// Factory producing [`BasicCore`] models.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCoreFactory {
    /// Program counter every core resets to.
    pub reset_pc: u64,
}

impl CoreFactory for BasicCoreFactory {
    fn create(&self, core_type: CoreType, isa: Isa, _index: usize) -> Result<Box<dyn CoreModel>, String> {
        Ok(Box::new(BasicCore::new(core_type, isa, self.reset_pc)))
    }
}

/// Built-in core model.
///
/// Retires instructions sequentially at the fixed CPI of its core type. Timing
/// types leave up to `CoreType::max_in_flight` memory operations outstanding
/// after each burst until drained.
pub struct BasicCore {
    core_type: CoreType,
    isa: Isa,
    state: ArchState,
    in_flight: u32,
}

impl BasicCore {
    /// Creates a model in reset state at `reset_pc`.
    pub const fn new(core_type: CoreType, isa: Isa, reset_pc: u64) -> Self {
        Self {
            core_type,
            isa,
            state: ArchState::new(reset_pc),
            in_flight: 0,
        }
    }
}

impl fmt::Debug for BasicCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCore")
            .field("core_type", &self.core_type)
            .field("isa", &self.isa)
            .field("pc", &format_args!("{:#x}", self.state.pc))
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl CoreModel for BasicCore {
    fn core_type(&self) -> CoreType {
        self.core_type
    }

    fn isa(&self) -> Isa {
        self.isa
    }

    fn state(&self) -> &ArchState {
        &self.state
    }

    fn load_state(&mut self, state: ArchState) {
        self.state = state;
        self.in_flight = 0;
    }

    fn in_flight(&self) -> u32 {
        self.in_flight
    }

    fn drain(&mut self) {
        self.in_flight = 0;
    }

    fn execute(&mut self, insts: u64) -> Result<u64, String> {
        self.state.retire(insts);
        if insts > 0 {
            let issued = u32::try_from(insts).unwrap_or(u32::MAX);
            self.in_flight = issued.min(self.core_type.max_in_flight());
        }
        Ok(insts.saturating_mul(self.core_type.cycles_per_inst()))
    }
}
