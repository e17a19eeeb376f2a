//! Factory configuration
//!
//! A process-wide [`FactoryConfig`] is read by every new
//! [`ModelFactory`](crate::factory::ModelFactory); individual factories can
//! override it with `with_config`.

use std::env;
use std::str::FromStr;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{FactoryError, FactoryResult};

/// Configuration for factory behavior
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    /// Seed for deterministic fake data generation
    pub seed: Option<u64>,
    /// Maximum number of rows a single `make_many`/`create_many` call may build
    pub max_batch_size: usize,
    /// Reject relationship kinds factories cannot wire instead of skipping them
    pub strict_relations: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_batch_size: 1000,
            strict_relations: false,
        }
    }
}

impl FactoryConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> FactoryResult<Self> {
        let defaults = Self::default();

        let config = Self {
            seed: get_env_optional("FACTORY_SEED")?,
            max_batch_size: get_env_optional("FACTORY_MAX_BATCH_SIZE")?
                .unwrap_or(defaults.max_batch_size),
            strict_relations: get_env_optional("FACTORY_STRICT_RELATIONS")?
                .unwrap_or(defaults.strict_relations),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FactoryResult<()> {
        if self.max_batch_size == 0 {
            return Err(FactoryError::configuration(
                "max_batch_size must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_strict_relations(mut self, strict: bool) -> Self {
        self.strict_relations = strict;
        self
    }
}

fn get_env_optional<T: FromStr>(key: &str) -> FactoryResult<Option<T>> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            FactoryError::configuration(format!("Invalid value '{}' for {}", value, key))
        }),
        Err(_) => Ok(None),
    }
}

/// Global factory configuration
static FACTORY_CONFIG: Lazy<RwLock<FactoryConfig>> =
    Lazy::new(|| RwLock::new(FactoryConfig::default()));

/// Snapshot of the global factory configuration
pub fn factory_config() -> FactoryConfig {
    FACTORY_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replace the global factory configuration
pub fn set_factory_config(config: FactoryConfig) {
    debug!(?config, "updated global factory config");
    *FACTORY_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
}
