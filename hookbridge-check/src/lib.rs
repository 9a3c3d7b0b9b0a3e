//! hookbridge-check library
//!
//! Configuration loading and manifest checking for the `hookbridge-check`
//! binary, exported for testing purposes.

pub mod config;
pub mod report;

pub use config::Config;
pub use report::{HookVerdict, Report, Verdict};
