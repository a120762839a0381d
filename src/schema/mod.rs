//! Schema module - Configuration and pixel payload types for OPC movies.

mod config;
mod pattern;

pub use config::*;
pub use pattern::*;
