//! # plugboard-server
//!
//! The owning server. Constructs the facade and loader from configuration,
//! performs the startup plugin scan, and runs the serve loop: watcher
//! messages are applied to the loader on a single task, and a shutdown
//! signal unloads every active plugin so teardowns run.

pub mod server;

pub use server::Server;
