//! Foundation module - Core utilities and types
//!
//! - Math types used by geometry tables and material colors
//! - Logging initialization

pub mod math;
pub mod logging;
