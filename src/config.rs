//! Engine configuration, loadable from TOML
//!
//! ```toml
//! [matcher]
//! follow_terminators = true
//! list_separator = ","
//!
//! [render]
//! quote = "\""
//! block_separator = ";"
//! collapse_whitespace = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Matcher options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Stop balanced captures at the literal that follows the marker
    pub follow_terminators: bool,

    /// Separator between elements of a list marker
    pub list_separator: char,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            follow_terminators: true,
            list_separator: ',',
        }
    }
}

/// Value shaping options used by the default shaper
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Quote character for normal result markers
    pub quote: char,

    /// Statement separator inside block captures
    pub block_separator: char,

    /// Collapse whitespace runs in dumb result markers
    pub collapse_whitespace: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quote: '"',
            block_separator: ';',
            collapse_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Enable or disable follow terminators for balanced captures
    pub fn with_follow_terminators(mut self, enabled: bool) -> Self {
        self.matcher.follow_terminators = enabled;
        self
    }

    /// Set the list marker element separator
    pub fn with_list_separator(mut self, separator: char) -> Self {
        self.matcher.list_separator = separator;
        self
    }

    /// Set the quote used by normal result markers
    pub fn with_quote(mut self, quote: char) -> Self {
        self.render.quote = quote;
        self
    }

    pub fn with_block_separator(mut self, separator: char) -> Self {
        self.render.block_separator = separator;
        self
    }

    pub fn with_collapse_whitespace(mut self, enabled: bool) -> Self {
        self.render.collapse_whitespace = enabled;
        self
    }
}
