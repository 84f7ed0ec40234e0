//! Hardware topology.
//!
//! This module organizes the components that make up the simulated platform:
//! the board, its cache hierarchy and memory, the workload it boots, and the
//! builder that assembles them.

/// Top-level board type.
pub mod board;

/// Board builder.
pub mod builder;

/// Cache hierarchy geometry.
pub mod cache;

/// Main memory description.
pub mod memory;

/// Boot workload description.
pub mod workload;

pub use board::Board;
pub use builder::{BoardBuilder, build};
pub use cache::CacheHierarchy;
pub use memory::MemorySystem;
pub use workload::{ResourceRef, Workload, WorkloadParameters};
