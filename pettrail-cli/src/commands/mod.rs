//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, init)
//! - [`queue`] - Offline queue inspection and manual draining
//! - [`record`] - Record a walk session until interrupted

pub mod config;
pub mod queue;
pub mod record;
