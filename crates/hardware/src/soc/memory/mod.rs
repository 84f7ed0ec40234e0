//! Main memory description.
//!
//! The memory timing model is an external collaborator. The board only owns the
//! size, the device kind, and how the address space is split across channels.

use crate::common::{ByteSize, ConfigError};
use crate::config::{MemoryConfig, MemoryKind};

/// A board's main memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySystem {
    kind: MemoryKind,
    size: ByteSize,
    channels: u32,
}

impl MemorySystem {
    /// Checks a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the size or channel count is zero, or if the size
    /// does not split evenly across channels.
    pub fn new(config: &MemoryConfig) -> Result<Self, ConfigError> {
        if config.size.bytes() == 0 {
            return Err(ConfigError::NonPositive {
                field: "memory.size",
            });
        }
        if config.channels == 0 {
            return Err(ConfigError::NonPositive {
                field: "memory.channels",
            });
        }
        if config.size.bytes() % u64::from(config.channels) != 0 {
            return Err(ConfigError::BadGeometry {
                field: "memory.channels",
                detail: format!(
                    "{} does not split evenly across {} channels",
                    config.size, config.channels
                ),
            });
        }
        Ok(Self {
            kind: config.kind,
            size: config.size,
            channels: config.channels,
        })
    }

    /// Device model.
    pub const fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Total addressable size.
    pub const fn size(&self) -> ByteSize {
        self.size
    }

    /// Channel count.
    pub const fn channels(&self) -> u32 {
        self.channels
    }

    /// Capacity of one channel.
    pub const fn channel_size(&self) -> ByteSize {
        ByteSize(self.size.0 / self.channels as u64)
    }
}
