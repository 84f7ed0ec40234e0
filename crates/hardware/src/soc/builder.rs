//! Board construction.
//!
//! This module assembles a board from independent configurations. It performs:
//! 1. **Clock:** Derives the cycle period in ticks from the board frequency.
//! 2. **Cache hierarchy:** Checks and derives the geometry of every level.
//! 3. **Memory:** Checks size and channel split.
//! 4. **Processor:** Instantiates every core model through the core factory.
//!
//! All structural checks run before any core model is created, so a rejected
//! configuration never leaves a partially built board behind. Capability checks are
//! not repeated here; see [`crate::sim::requires`].

use tracing::info;

use crate::common::{ConfigError, Frequency};
use crate::config::{CacheHierarchyConfig, Config, MemoryConfig, ProcessorConfig};
use crate::core::{BasicCoreFactory, CoreFactory, Processor};
use crate::soc::board::Board;
use crate::soc::cache::CacheHierarchy;
use crate::soc::memory::MemorySystem;

/// Default board clock when the builder is not given one.
const DEFAULT_CLK: Frequency = Frequency::ghz(3);

/// Builds a board with the default clock and the built-in core models.
///
/// # Errors
///
/// Returns `ConfigError` if any configuration is structurally invalid.
pub fn build(
    cache: CacheHierarchyConfig,
    memory: MemoryConfig,
    processor: ProcessorConfig,
) -> Result<Board, ConfigError> {
    BoardBuilder::new(cache, memory, processor).build()
}

/// Fluent board builder.
pub struct BoardBuilder {
    cache: CacheHierarchyConfig,
    memory: MemoryConfig,
    processor: ProcessorConfig,
    clk_freq: Frequency,
    factory: Box<dyn CoreFactory>,
}

impl std::fmt::Debug for BoardBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardBuilder")
            .field("cache", &self.cache)
            .field("memory", &self.memory)
            .field("processor", &self.processor)
            .field("clk_freq", &self.clk_freq)
            .finish_non_exhaustive()
    }
}

impl BoardBuilder {
    /// Starts a builder from the three hardware configurations.
    pub fn new(cache: CacheHierarchyConfig, memory: MemoryConfig, processor: ProcessorConfig) -> Self {
        Self {
            cache,
            memory,
            processor,
            clk_freq: DEFAULT_CLK,
            factory: Box::new(BasicCoreFactory::default()),
        }
    }

    /// Starts a builder from a full configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_hierarchy.clone(),
            config.memory.clone(),
            config.processor.clone(),
        )
        .clk_freq(config.board.clk_freq)
    }

    /// Sets the core clock.
    #[must_use]
    pub fn clk_freq(mut self, freq: Frequency) -> Self {
        self.clk_freq = freq;
        self
    }

    /// Replaces the factory that creates core models.
    #[must_use]
    pub fn core_factory(mut self, factory: impl CoreFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Checks every configuration, then assembles the board.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unusable clock, cache hierarchy, memory, or
    /// processor configuration, or if the factory cannot create a model.
    pub fn build(self) -> Result<Board, ConfigError> {
        let clock_period = self.clk_freq.period_ticks().ok_or_else(|| ConfigError::BadGeometry {
            field: "board.clk_freq",
            detail: format!("{} has no whole-tick period", self.clk_freq),
        })?;
        let cache_hierarchy = CacheHierarchy::new(&self.cache)?;
        let memory = MemorySystem::new(&self.memory)?;
        let processor = Processor::new(&self.processor, self.factory.as_ref())?;

        info!(
            clk = %self.clk_freq,
            cores = processor.num_cores(),
            start = %processor.initial_core_type(),
            memory = %memory.size(),
            "board assembled"
        );

        Ok(Board {
            clk_freq: self.clk_freq,
            clock_period,
            cache_hierarchy,
            memory,
            processor,
            workload: None,
        })
    }
}

impl Board {
    /// Builds a board from a full configuration with the built-in core models.
    ///
    /// # Errors
    ///
    /// As for [`BoardBuilder::build`].
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        BoardBuilder::from_config(config).build()
    }
}
