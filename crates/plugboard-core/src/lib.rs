//! # plugboard-core
//!
//! Core types and errors for the plugboard extension host. This crate defines
//! the shared vocabulary used by every other crate in the workspace.

pub mod error;
pub mod types;

pub use error::{PlugboardError, Result};
pub use types::{PluginId, PluginKind};
