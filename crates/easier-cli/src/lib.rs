//! easier-cli library root.
//!
//! Re-exports the command-line modules so integration tests can exercise
//! config handling and rendering without spawning the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod render;
