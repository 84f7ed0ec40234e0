//! Cache hierarchy description.
//!
//! The coherence protocol itself is an external collaborator; this module only
//! derives and checks the geometry of each level and reports which protocol the
//! hierarchy is built on.

use crate::common::{ByteSize, ConfigError};
use crate::config::{CacheHierarchyConfig, CacheHierarchyKind, CacheLevelConfig, CoherenceProtocol};

/// Checked geometry of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    /// Capacity.
    pub size: ByteSize,
    /// Number of ways.
    pub assoc: u32,
    /// Line size in bytes.
    pub line: u64,
    /// Number of sets.
    pub sets: u64,
}

impl CacheGeometry {
    /// Derives the set count of a level.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if size or associativity is zero, or if the size is not
    /// a power-of-two number of `assoc * line` sets.
    pub fn new(field: &'static str, level: CacheLevelConfig, line: u64) -> Result<Self, ConfigError> {
        if level.size.bytes() == 0 {
            return Err(ConfigError::NonPositive { field });
        }
        if level.assoc == 0 {
            return Err(ConfigError::NonPositive { field });
        }
        let way_bytes = u64::from(level.assoc) * line;
        if level.size.bytes() % way_bytes != 0 {
            return Err(ConfigError::BadGeometry {
                field,
                detail: format!(
                    "{} is not a multiple of {} ways x {line}B lines",
                    level.size, level.assoc
                ),
            });
        }
        let sets = level.size.bytes() / way_bytes;
        if !sets.is_power_of_two() {
            return Err(ConfigError::BadGeometry {
                field,
                detail: format!("{sets} sets is not a power of two"),
            });
        }
        Ok(Self {
            size: level.size,
            assoc: level.assoc,
            line,
            sets,
        })
    }
}

/// Geometry of every level of a cached hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLevels {
    /// L1 instruction cache.
    pub l1i: CacheGeometry,
    /// L1 data cache.
    pub l1d: CacheGeometry,
    /// Whole L2.
    pub l2: CacheGeometry,
    /// Number of L2 banks.
    pub l2_banks: u32,
    /// Capacity of one L2 bank.
    pub l2_bank_size: ByteSize,
}

/// A board's cache hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHierarchy {
    kind: CacheHierarchyKind,
    levels: Option<CacheLevels>,
}

impl CacheHierarchy {
    /// Checks a configuration and derives the geometry of every level.
    ///
    /// Level sizes are ignored for `NoCache`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a zero or non power-of-two line size, an invalid
    /// level, or a bank count that does not split the L2 into whole sets.
    pub fn new(config: &CacheHierarchyConfig) -> Result<Self, ConfigError> {
        if config.kind == CacheHierarchyKind::NoCache {
            return Ok(Self {
                kind: config.kind,
                levels: None,
            });
        }

        let line = config.line_size.bytes();
        if line == 0 {
            return Err(ConfigError::NonPositive {
                field: "cache_hierarchy.line_size",
            });
        }
        if !line.is_power_of_two() {
            return Err(ConfigError::BadGeometry {
                field: "cache_hierarchy.line_size",
                detail: format!("{line}B is not a power of two"),
            });
        }

        let l1i = CacheGeometry::new("cache_hierarchy.l1i", config.l1i, line)?;
        let l1d = CacheGeometry::new("cache_hierarchy.l1d", config.l1d, line)?;
        let l2 = CacheGeometry::new("cache_hierarchy.l2", config.l2, line)?;

        if config.num_l2_banks == 0 {
            return Err(ConfigError::NonPositive {
                field: "cache_hierarchy.num_l2_banks",
            });
        }
        if l2.sets % u64::from(config.num_l2_banks) != 0 {
            return Err(ConfigError::BadGeometry {
                field: "cache_hierarchy.num_l2_banks",
                detail: format!(
                    "{} banks do not divide {} L2 sets",
                    config.num_l2_banks, l2.sets
                ),
            });
        }

        Ok(Self {
            kind: config.kind,
            levels: Some(CacheLevels {
                l1i,
                l1d,
                l2,
                l2_banks: config.num_l2_banks,
                l2_bank_size: ByteSize(l2.size.bytes() / u64::from(config.num_l2_banks)),
            }),
        })
    }

    /// Hierarchy organisation.
    pub const fn kind(&self) -> CacheHierarchyKind {
        self.kind
    }

    /// Coherence protocol the hierarchy relies on, if any.
    pub const fn protocol(&self) -> Option<CoherenceProtocol> {
        self.kind.protocol()
    }

    /// Level geometry, or `None` for a cache-less board.
    pub const fn levels(&self) -> Option<&CacheLevels> {
        self.levels.as_ref()
    }
}
