//! group-ssh CLI library
//!
//! Command handlers and output formatting behind the `group-ssh` binary.

pub mod commands;
pub mod output;
