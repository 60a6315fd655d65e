//! Configuration for Skitter.
//!
//! [`ScanConfig`] is the single typed value the engine consumes;
//! [`AppSettings`] supplies defaults from an optional settings file.

mod scan;
mod settings;

pub use scan::ScanConfig;
pub use settings::{AppSettings, Paths};
