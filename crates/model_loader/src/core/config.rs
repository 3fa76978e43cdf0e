//! # Loader Configuration
//!
//! Settings that change how models are assembled and how diagnostics are
//! reported. All structures are serde-serializable and implement [`Config`], so
//! they can be kept in a `.toml` or `.ron` file next to the assets.
//!
//! ```toml
//! flip_texture_v = true
//! default_group = "default"
//!
//! [diagnostics]
//! color = "auto"
//! log_diagnostics = false
//! ```

use serde::{Deserialize, Serialize};

use crate::assets::text::diagnostics::ColorMode;

pub use crate::config::{Config, ConfigError};

/// # Diagnostics Configuration
///
/// Controls rendering of diagnostics by the stock sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Colored output for terminal renderers
    pub color: ColorMode,
    /// Mirror every diagnostic to the `log` facade as well
    pub log_diagnostics: bool,
}

impl DiagnosticsConfig {
    /// Create a diagnostics configuration with defaults
    pub const fn new() -> Self {
        Self {
            color: ColorMode::Auto,
            log_diagnostics: false,
        }
    }

    /// Set the color mode
    pub const fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Enable or disable mirroring to `log`
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.log_diagnostics = enabled;
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Loader Configuration
///
/// Behavior of the model assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Store texture V as `1 - v` (top-left origin)
    pub flip_texture_v: bool,
    /// Name of the group that collects faces before the first `g` or `o`
    pub default_group: String,
    /// Diagnostics reporting
    pub diagnostics: DiagnosticsConfig,
}

impl LoaderConfig {
    /// Create a loader configuration with defaults
    pub fn new() -> Self {
        Self {
            flip_texture_v: true,
            default_group: "default".to_string(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }

    /// Enable or disable the texture V flip
    pub const fn with_flip_texture_v(mut self, flip: bool) -> Self {
        self.flip_texture_v = flip;
        self
    }

    /// Set the implicit group name
    pub fn with_default_group(mut self, name: impl Into<String>) -> Self {
        self.default_group = name.into();
        self
    }

    /// Set diagnostics reporting
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_group.trim().is_empty() {
            return Err(ConfigError::Parse("default_group must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for LoaderConfig {}
