//! Configuration system for MarkForge.
//!
//! Load search configuration from TOML or YAML to choose the kernel mix,
//! their weights and the energy invariant policy without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use markforge_config::{KernelType, MarkForgeConfig};
//!
//! let config = MarkForgeConfig::from_toml_str(r#"
//!     environment_mode = "fast_assert"
//!     random_seed = 7
//!
//!     [initial_kernel]
//!     mark_count = 20
//!
//!     [[kernels]]
//!     type = "birth"
//!     weight = 2.0
//!
//!     [[kernels]]
//!     type = "death"
//!     weight = 1.0
//! "#).unwrap();
//!
//! assert_eq!(config.kernels.len(), 2);
//! assert_eq!(config.kernels[0].kernel_type, KernelType::Birth);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use markforge_config::MarkForgeConfig;
//!
//! let config = MarkForgeConfig::load("markforge.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use markforge_core::DEFAULT_TOLERANCE;

/// Default display name of the initial kernel.
pub const DEFAULT_INITIAL_KERNEL_NAME: &str = "initial";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main search configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MarkForgeConfig {
    /// Environment mode affecting reproducibility and assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Energy bookkeeping settings.
    #[serde(default)]
    pub energy: EnergyConfig,

    /// The zero-weight kernel used to seed a configuration.
    #[serde(default)]
    pub initial_kernel: InitialKernelConfig,

    /// Weighted kernels drawn from during the search.
    #[serde(default)]
    pub kernels: Vec<KernelConfig>,
}

impl MarkForgeConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    /// Sets the energy invariant tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.energy.tolerance = tolerance;
        self
    }

    /// Sets how many marks the initial kernel places.
    pub fn with_initial_mark_count(mut self, mark_count: usize) -> Self {
        self.initial_kernel.mark_count = mark_count;
        self
    }

    /// Adds a kernel configuration.
    pub fn with_kernel(mut self, kernel: KernelConfig) -> Self {
        self.kernels.push(kernel);
        self
    }

    /// Sum of all kernel weights.
    pub fn total_weight(&self) -> f64 {
        self.kernels.iter().map(|k| k.weight).sum()
    }

    /// Checks values serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an empty kernel list, a negative
    /// or non-finite weight, weights summing past `f64::MAX`, or a
    /// non-positive tolerance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one kernel must be configured".to_string(),
            ));
        }
        for kernel in &self.kernels {
            if !kernel.weight.is_finite() || kernel.weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "kernel '{}' has invalid weight {}",
                    kernel.display_name(),
                    kernel.weight
                )));
            }
        }
        if !self.total_weight().is_finite() {
            return Err(ConfigError::Invalid(
                "total kernel weight overflows".to_string(),
            ));
        }
        let tolerance = self.energy.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "energy tolerance must be positive, got {tolerance}"
            )));
        }
        Ok(())
    }
}

/// Environment mode affecting reproducibility and assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Non-reproducible mode with minimal overhead.
    #[default]
    NonReproducible,

    /// Reproducible mode with deterministic behavior.
    Reproducible,

    /// Fast assert mode: energy drift fails the mutation.
    FastAssert,

    /// Full assert mode: every mutation is re-scored from scratch.
    FullAssert,
}

impl EnvironmentMode {
    /// Returns true for the modes that turn invariant violations into errors.
    pub fn is_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    /// Returns true if runs must be repeatable given the same seed.
    pub fn is_reproducible(self) -> bool {
        !matches!(self, EnvironmentMode::NonReproducible)
    }
}

/// Energy bookkeeping settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EnergyConfig {
    /// Tolerance of the energy invariants.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Score individual energies in parallel during bulk initialization.
    #[serde(default = "default_true")]
    pub parallel_initialization: bool,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            parallel_initialization: true,
        }
    }
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_true() -> bool {
    true
}

/// The initial kernel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InitialKernelConfig {
    /// Number of marks placed when seeding an empty configuration.
    #[serde(default)]
    pub mark_count: usize,

    /// Display name; defaults to `"initial"`.
    pub name: Option<String>,
}

impl InitialKernelConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_INITIAL_KERNEL_NAME)
    }
}

/// One weighted kernel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct KernelConfig {
    /// Which move the kernel proposes.
    #[serde(rename = "type")]
    pub kernel_type: KernelType,

    /// Relative selection weight.
    pub weight: f64,

    /// Display name; defaults to the kernel type.
    pub name: Option<String>,

    /// Upper bound on configuration size for kernels that add marks.
    pub max_marks: Option<usize>,
}

impl KernelConfig {
    pub fn new(kernel_type: KernelType, weight: f64) -> Self {
        Self {
            kernel_type,
            weight,
            name: None,
            max_marks: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_max_marks(mut self, max_marks: usize) -> Self {
        self.max_marks = Some(max_marks);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.kernel_type.as_str())
    }
}

/// Kernel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    /// Adds one sampled mark.
    Birth,

    /// Removes one mark.
    Death,

    /// Replaces one mark by a perturbed version of itself.
    Exchange,

    /// Replaces two interacting marks by one.
    Merge,

    /// Replaces one mark by two.
    Split,
}

impl KernelType {
    pub fn as_str(self) -> &'static str {
        match self {
            KernelType::Birth => "birth",
            KernelType::Death => "death",
            KernelType::Exchange => "exchange",
            KernelType::Merge => "merge",
            KernelType::Split => "split",
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
