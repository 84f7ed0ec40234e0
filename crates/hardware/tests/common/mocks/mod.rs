//! Mock collaborators.

/// Core models with controllable drain and failure behaviour.
pub mod core;
