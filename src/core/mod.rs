//! Core module - shared infrastructure for form-smoke
//!
//! Configuration, error handling, and the step records every other module
//! reads or writes.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Result, SmokeError};
pub use types::*;
