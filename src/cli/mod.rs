//! Command-line interface: arguments and interactive prompts.

pub mod args;
pub mod prompts;

pub use args::{Args, Command};
