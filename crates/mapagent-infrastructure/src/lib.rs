//! Filesystem-backed configuration for the map agent.

pub mod config_storage;
pub mod paths;

pub use crate::config_storage::ConfigStorage;
pub use crate::paths::{MapAgentPaths, PathError};
