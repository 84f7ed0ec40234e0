//! Top-level `Board` type.
//!
//! A board exclusively owns one cache hierarchy, one memory, one processor, and at
//! most one workload. Construction goes through [`crate::soc::builder`].

use tracing::info;

use crate::common::{ConfigError, Frequency};
use crate::core::Processor;
use crate::soc::cache::CacheHierarchy;
use crate::soc::memory::MemorySystem;
use crate::soc::workload::Workload;

/// A fully assembled hardware platform.
#[derive(Debug)]
pub struct Board {
    pub(crate) clk_freq: Frequency,
    pub(crate) clock_period: u64,
    pub(crate) cache_hierarchy: CacheHierarchy,
    pub(crate) memory: MemorySystem,
    pub(crate) processor: Processor,
    pub(crate) workload: Option<Workload>,
}

impl Board {
    /// Core clock frequency.
    pub const fn clk_freq(&self) -> Frequency {
        self.clk_freq
    }

    /// Length of one core cycle in ticks.
    pub const fn clock_period(&self) -> u64 {
        self.clock_period
    }

    /// Cache hierarchy.
    pub const fn cache_hierarchy(&self) -> &CacheHierarchy {
        &self.cache_hierarchy
    }

    /// Main memory.
    pub const fn memory(&self) -> &MemorySystem {
        &self.memory
    }

    /// Processor.
    pub const fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Processor, for switching core models.
    pub const fn processor_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }

    /// Attached workload.
    pub const fn workload(&self) -> Option<&Workload> {
        self.workload.as_ref()
    }

    /// Attaches the boot workload.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::WorkloadAlreadyAttached` if the board already has one.
    pub fn set_workload(&mut self, workload: Workload) -> Result<(), ConfigError> {
        if self.workload.is_some() {
            return Err(ConfigError::WorkloadAlreadyAttached);
        }
        info!(
            workload = workload.name(),
            image = %workload.boot_image(),
            "workload attached"
        );
        self.workload = Some(workload);
        Ok(())
    }

    /// Converts core cycles to ticks.
    pub const fn cycles_to_ticks(&self, cycles: u64) -> u64 {
        cycles.saturating_mul(self.clock_period)
    }
}
