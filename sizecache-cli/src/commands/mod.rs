//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`simulate`] - Drive a layout cache through a synthetic scroll

pub mod config;
pub mod simulate;
