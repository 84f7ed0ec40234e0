//! Configuration system for the simulation controller.
//!
//! This module defines all configuration structures and enums used to describe a board. It provides:
//! 1. **Defaults:** Baseline hardware constants (caches, memory, processor, clock).
//! 2. **Structures:** Hierarchical config for the board, cache hierarchy, memory, processor, and run.
//! 3. **Enums:** Instruction-set architecture, coherence protocol, cache hierarchy and memory kinds.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or built
//! from `Config::default()`, which describes a two-core x86 board booting on KVM and
//! switching to timing cores.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::common::{ByteSize, ConfigError, Frequency};
use crate::core::CoreType;
use crate::sim::requires::CapabilityRequirement;

/// Default configuration constants.
///
/// These values define the baseline board when not explicitly overridden.
mod defaults {
    use crate::common::{ByteSize, Frequency};

    /// Board clock (3 GHz).
    pub const CLK_FREQ: Frequency = Frequency::ghz(3);

    /// L1 instruction and data cache size (32 KiB each).
    pub const L1_SIZE: ByteSize = ByteSize::kib(32);

    /// L1 associativity (8 ways).
    pub const L1_ASSOC: u32 = 8;

    /// Shared L2 size (512 KiB).
    pub const L2_SIZE: ByteSize = ByteSize::kib(512);

    /// L2 associativity (16 ways).
    pub const L2_ASSOC: u32 = 16;

    /// Number of L2 banks.
    pub const L2_BANKS: u32 = 1;

    /// Cache line size (64 bytes).
    pub const CACHE_LINE: ByteSize = ByteSize(64);

    /// Main memory size (3 GiB).
    pub const MEM_SIZE: ByteSize = ByteSize::gib(3);

    /// Memory channel count.
    pub const MEM_CHANNELS: u32 = 1;

    /// Number of logical cores.
    pub const NUM_CORES: usize = 2;

    /// Instructions executed by the guest before the post-boot script starts.
    pub const BOOT_INSTRUCTIONS: u64 = 1_000_000;

    /// Instructions charged for one ordinary post-boot shell command.
    pub const COMMAND_INSTRUCTIONS: u64 = 10_000;
}

/// Instruction-set architecture of the simulated cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Isa {
    /// x86-64.
    #[default]
    X86,
    /// 64-bit Arm.
    Arm,
    /// RISC-V.
    Riscv,
    /// SPARC.
    Sparc,
    /// POWER.
    Power,
    /// MIPS.
    Mips,
}

impl Isa {
    /// Host `target_arch` name this ISA can be accelerated on, if any.
    pub const fn host_arch(self) -> Option<&'static str> {
        match self {
            Self::X86 => Some("x86_64"),
            Self::Arm => Some("aarch64"),
            Self::Riscv => Some("riscv64"),
            Self::Sparc | Self::Power | Self::Mips => None,
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X86 => "X86",
            Self::Arm => "ARM",
            Self::Riscv => "RISCV",
            Self::Sparc => "SPARC",
            Self::Power => "POWER",
            Self::Mips => "MIPS",
        };
        f.write_str(name)
    }
}

/// Cache-coherence protocol assumed by a cache hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoherenceProtocol {
    /// Two-level MESI directory protocol.
    MesiTwoLevel,
    /// Three-level MESI directory protocol.
    MesiThreeLevel,
    /// AMD Hammer-style MOESI protocol.
    MoesiHammer,
    /// MOESI CMP directory protocol.
    MoesiCmpDirectory,
    /// Minimal MI example protocol.
    MiExample,
    /// Arm CHI protocol.
    Chi,
}

impl fmt::Display for CoherenceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MesiTwoLevel => "MESI_Two_Level",
            Self::MesiThreeLevel => "MESI_Three_Level",
            Self::MoesiHammer => "MOESI_hammer",
            Self::MoesiCmpDirectory => "MOESI_CMP_directory",
            Self::MiExample => "MI_example",
            Self::Chi => "CHI",
        };
        f.write_str(name)
    }
}

/// Cache hierarchy organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CacheHierarchyKind {
    /// Ruby two-level hierarchy: private L1s, banked shared L2, MESI two-level protocol.
    #[default]
    MesiTwoLevel,
    /// Classic hierarchy: private L1s and private L2 per core, no Ruby protocol.
    PrivateL1PrivateL2,
    /// No caches; cores talk to memory directly.
    NoCache,
}

impl CacheHierarchyKind {
    /// Coherence protocol this organisation is built on, if it uses one.
    pub const fn protocol(self) -> Option<CoherenceProtocol> {
        match self {
            Self::MesiTwoLevel => Some(CoherenceProtocol::MesiTwoLevel),
            Self::PrivateL1PrivateL2 | Self::NoCache => None,
        }
    }
}

/// Memory device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryKind {
    /// DDR4-2400 DRAM channels.
    #[default]
    #[serde(alias = "DDR4_2400")]
    Ddr4_2400,
    /// Fixed-latency memory.
    Simple,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Explicit capability requirement; derived from the hardware sections when absent.
    #[serde(default)]
    pub capabilities: Option<CapabilityRequirement>,
    /// Board-level settings.
    #[serde(default)]
    pub board: BoardConfig,
    /// Cache hierarchy settings.
    #[serde(default)]
    pub cache_hierarchy: CacheHierarchyConfig,
    /// Main memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Processor settings.
    #[serde(default)]
    pub processor: ProcessorConfig,
    /// Run-loop and guest-engine settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Deserialize` if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Deserialize` if its contents are invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    /// The capability requirement for this configuration.
    ///
    /// Uses the explicit `capabilities` section if present, otherwise derives one from
    /// the processor ISA, the cache hierarchy protocol, and whether any core type needs KVM.
    pub fn requirement(&self) -> CapabilityRequirement {
        self.capabilities
            .clone()
            .unwrap_or_else(|| CapabilityRequirement::for_config(self))
    }
}

/// Board-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Core clock frequency.
    #[serde(default = "BoardConfig::default_clk_freq")]
    pub clk_freq: Frequency,
}

impl BoardConfig {
    /// Returns the default board clock.
    const fn default_clk_freq() -> Frequency {
        defaults::CLK_FREQ
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            clk_freq: defaults::CLK_FREQ,
        }
    }
}

/// Size and associativity of a single cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheLevelConfig {
    /// Capacity.
    pub size: ByteSize,
    /// Number of ways.
    pub assoc: u32,
}

impl CacheLevelConfig {
    /// Creates a level description.
    pub const fn new(size: ByteSize, assoc: u32) -> Self {
        Self { size, assoc }
    }
}

/// Cache hierarchy configuration: private L1I/L1D and a banked shared L2.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Hierarchy organisation.
    #[serde(default)]
    pub kind: CacheHierarchyKind,
    /// L1 instruction cache.
    #[serde(default = "CacheHierarchyConfig::default_l1")]
    pub l1i: CacheLevelConfig,
    /// L1 data cache.
    #[serde(default = "CacheHierarchyConfig::default_l1")]
    pub l1d: CacheLevelConfig,
    /// Shared (or, for classic hierarchies, per-core) L2.
    #[serde(default = "CacheHierarchyConfig::default_l2")]
    pub l2: CacheLevelConfig,
    /// Number of L2 banks.
    #[serde(default = "CacheHierarchyConfig::default_l2_banks")]
    pub num_l2_banks: u32,
    /// Cache line size.
    #[serde(default = "CacheHierarchyConfig::default_line")]
    pub line_size: ByteSize,
}

impl CacheHierarchyConfig {
    /// Returns the default L1 geometry.
    const fn default_l1() -> CacheLevelConfig {
        CacheLevelConfig::new(defaults::L1_SIZE, defaults::L1_ASSOC)
    }

    /// Returns the default L2 geometry.
    const fn default_l2() -> CacheLevelConfig {
        CacheLevelConfig::new(defaults::L2_SIZE, defaults::L2_ASSOC)
    }

    /// Returns the default L2 bank count.
    const fn default_l2_banks() -> u32 {
        defaults::L2_BANKS
    }

    /// Returns the default cache line size.
    const fn default_line() -> ByteSize {
        defaults::CACHE_LINE
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            kind: CacheHierarchyKind::default(),
            l1i: Self::default_l1(),
            l1d: Self::default_l1(),
            l2: Self::default_l2(),
            num_l2_banks: defaults::L2_BANKS,
            line_size: defaults::CACHE_LINE,
        }
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Device model.
    #[serde(default)]
    pub kind: MemoryKind,
    /// Total addressable size.
    #[serde(default = "MemoryConfig::default_size")]
    pub size: ByteSize,
    /// Number of channels the size is interleaved across.
    #[serde(default = "MemoryConfig::default_channels")]
    pub channels: u32,
}

impl MemoryConfig {
    /// Returns the default memory size.
    const fn default_size() -> ByteSize {
        defaults::MEM_SIZE
    }

    /// Returns the default channel count.
    const fn default_channels() -> u32 {
        defaults::MEM_CHANNELS
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            kind: MemoryKind::default(),
            size: defaults::MEM_SIZE,
            channels: defaults::MEM_CHANNELS,
        }
    }
}

/// Processor configuration.
///
/// With `switch_core_type` set the processor holds two model sets per core and can
/// swap between them; without it the processor is a plain single-type processor.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Core ISA.
    #[serde(default)]
    pub isa: Isa,
    /// Number of logical cores.
    #[serde(default = "ProcessorConfig::default_num_cores")]
    pub num_cores: usize,
    /// Core type active when simulation starts.
    #[serde(default = "ProcessorConfig::default_starting")]
    pub starting_core_type: CoreType,
    /// Alternate core type, if the processor is switchable.
    #[serde(default = "ProcessorConfig::default_switch")]
    pub switch_core_type: Option<CoreType>,
}

impl ProcessorConfig {
    /// Returns the default core count.
    const fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    /// Returns the default starting core type.
    const fn default_starting() -> CoreType {
        CoreType::Kvm
    }

    /// Returns the default switch core type.
    #[allow(clippy::unnecessary_wraps)]
    const fn default_switch() -> Option<CoreType> {
        Some(CoreType::Timing)
    }

    /// Single-type processor description.
    pub const fn simple(core_type: CoreType, isa: Isa, num_cores: usize) -> Self {
        Self {
            isa,
            num_cores,
            starting_core_type: core_type,
            switch_core_type: None,
        }
    }

    /// Two-type switchable processor description.
    pub const fn switchable(starting: CoreType, switch: CoreType, isa: Isa, num_cores: usize) -> Self {
        Self {
            isa,
            num_cores,
            starting_core_type: starting,
            switch_core_type: Some(switch),
        }
    }

    /// Every core type this processor will instantiate, starting type first.
    pub fn core_types(&self) -> Vec<CoreType> {
        let mut types = vec![self.starting_core_type];
        types.extend(self.switch_core_type);
        types
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::switchable(
            Self::default_starting(),
            CoreType::Timing,
            Isa::default(),
            defaults::NUM_CORES,
        )
    }
}

/// Run-loop and guest-engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Tick limit; reaching it raises a max-tick exit event.
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// Instructions the scripted guest executes while booting.
    #[serde(default = "SimulationConfig::default_boot_instructions")]
    pub boot_instructions: u64,
    /// Instructions the scripted guest charges per ordinary shell command.
    #[serde(default = "SimulationConfig::default_command_instructions")]
    pub command_instructions: u64,
}

impl SimulationConfig {
    /// Returns the default boot length.
    const fn default_boot_instructions() -> u64 {
        defaults::BOOT_INSTRUCTIONS
    }

    /// Returns the default per-command cost.
    const fn default_command_instructions() -> u64 {
        defaults::COMMAND_INSTRUCTIONS
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_ticks: None,
            boot_instructions: defaults::BOOT_INSTRUCTIONS,
            command_instructions: defaults::COMMAND_INSTRUCTIONS,
        }
    }
}
