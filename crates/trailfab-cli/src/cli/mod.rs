//! CLI command implementations.
//!
//! This module contains the implementations for the CLI subcommands:
//! - `generate` - Build plotter/laser SVGs and a PNG preview from a GPX track
//! - `defaults` - Print the default configuration as YAML

pub mod common;
pub mod defaults;
pub mod generate;
pub mod preview;

pub use defaults::cmd_defaults;
pub use generate::cmd_generate;
