//! Architectural state carried across a core switch.
//!
//! Only state that is visible to the guest lives here. Micro-architectural
//! state (pipelines, predictors, in-flight memory operations) belongs to the
//! individual core model and is discarded when the model is switched out.

use crate::common::constants::{INST_BYTES, NUM_GPRS};

/// Guest-visible register state of one logical core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchState {
    /// Program counter.
    pub pc: u64,
    /// General-purpose registers.
    pub regs: [u64; NUM_GPRS],
    /// Instructions retired on this logical core since reset, across all models.
    pub insts_retired: u64,
}

impl ArchState {
    /// Reset state with the program counter at `pc`.
    pub const fn new(pc: u64) -> Self {
        Self {
            pc,
            regs: [0; NUM_GPRS],
            insts_retired: 0,
        }
    }

    /// Retires `insts` sequential instructions.
    pub fn retire(&mut self, insts: u64) {
        self.pc = self.pc.wrapping_add(insts.wrapping_mul(INST_BYTES));
        self.insts_retired = self.insts_retired.saturating_add(insts);
    }
}

impl Default for ArchState {
    fn default() -> Self {
        Self::new(0)
    }
}
