//! # Core Module
//!
//! Shared configuration for the loader and its tools.

pub mod config;

pub use config::{Config, ConfigError, DiagnosticsConfig, LoaderConfig};
