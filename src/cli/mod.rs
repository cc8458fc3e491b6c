//! CLI module - terminal output for the command-line runner

pub mod progress;
