//! # plugboard-config
//!
//! Configuration system for the plugboard host. Reads a JSON document
//! (`config/config.json` by default), interpolates `${NAME}` environment
//! references once at load time, and exposes the result through dotted-path
//! accessors. A document that fails to load is replaced by built-in defaults
//! rather than aborting startup.

pub mod store;
pub mod tree;

pub use store::ConfigStore;
pub use tree::ConfigTree;
