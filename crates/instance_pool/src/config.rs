//! Configuration system
//!
//! Pool settings and the declarative pre-warm list both load through the
//! [`Config`] trait, which picks TOML or RON from the file extension.
//!
//! ```toml
//! [[elements]]
//! prototype = "bullet"
//! quantity = 64
//!
//! [[elements]]
//! prototype = "explosion"
//! quantity = 8
//! keep_across_context_reset = true
//! ```

pub use serde::{Serialize, Deserialize};

/// Default backing capacity of a freshly created pool container
pub const DEFAULT_CONTAINER_CAPACITY: usize = 8;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration parsed but holds values the pool cannot use
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Registry-wide pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Backing capacity reserved by every new container
    pub default_capacity: usize,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CONTAINER_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl Config for PoolConfig {}

/// One pre-warm request: how many instances of which prototype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializerElement {
    /// Catalog name of the prototype
    pub prototype: String,

    /// Number of instances that should exist after pre-warming
    #[serde(default = "default_quantity")]
    pub quantity: usize,

    /// Whether created instances survive a context reset
    #[serde(default)]
    pub keep_across_context_reset: bool,
}

const fn default_quantity() -> usize {
    1
}

impl InitializerElement {
    /// Create an element for `quantity` instances of `prototype`
    pub fn new(prototype: impl Into<String>, quantity: usize) -> Self {
        Self {
            prototype: prototype.into(),
            quantity,
            keep_across_context_reset: false,
        }
    }

    /// Mark the created instances as surviving a context reset
    #[must_use]
    pub fn keep_across_context_reset(mut self) -> Self {
        self.keep_across_context_reset = true;
        self
    }
}

/// Declarative list of pools to pre-warm at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializerConfig {
    /// Pre-warm requests, processed in order
    #[serde(default)]
    pub elements: Vec<InitializerElement>,
}

impl Config for InitializerConfig {}

impl InitializerConfig {
    /// Load and validate an initializer config
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject elements the initializer cannot act on
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, element) in self.elements.iter().enumerate() {
            if element.prototype.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "element {i} has an empty prototype name"
                )));
            }
            if element.quantity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "element {i} ({}) requests zero instances",
                    element.prototype
                )));
            }
        }
        Ok(())
    }

    /// Sum of all requested quantities
    pub fn total_quantity(&self) -> usize {
        self.elements.iter().map(|element| element.quantity).sum()
    }
}
