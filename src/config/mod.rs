//! Configuration of a [`crate::cluster::ring_table::RingTable`].
//!
//! [`Config`] is what the ring is built from. It holds the hash function as a trait object so any
//! [`Hasher64`] can be injected. [`RingConfig`] is its serializable counterpart, read from a json file
//! by the `ringtable` binary.
use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    cluster::partitioning::hash::{HashAlgorithm, Hasher64, XxHash64Hasher},
    error::{Error, Result},
};

/// Prime numbers spread partitions more uniformly
pub const DEFAULT_KEY_COUNT: u64 = 271;
pub const DEFAULT_REPLICATION_FACTOR: usize = 20;
pub const DEFAULT_LOAD_FACTOR: f64 = 1.25;
/// Every partition has a precomputed owner, so the keyspace has to fit in memory
pub const MAX_KEY_COUNT: u64 = u32::MAX as u64;

#[derive(Clone, Debug)]
pub struct Config {
    /// Hash function used to place ring points, partitions and keys. Changing it changes the whole placement.
    pub hasher: Option<Arc<dyn Hasher64>>,
    /// Size of the fixed logical keyspace. Every key maps to one of `key_count` partitions.
    pub key_count: u64,
    /// Number of points each node owns on the ring
    pub replication_factor: usize,
    /// How far above a perfectly even share of partitions a node is allowed to go. Must be >= 1.0
    pub load_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hasher: Some(Arc::new(XxHash64Hasher)),
            key_count: DEFAULT_KEY_COUNT,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Config {
    pub fn with_hasher(mut self, hasher: Arc<dyn Hasher64>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Checks that a ring can be built from this config and returns its hash function.
    ///
    /// # Error
    /// [`Error::InvalidConfig`] if the hash function is missing, `key_count` is 0 or above
    /// [`MAX_KEY_COUNT`], `replication_factor` is 0 or `load_factor` isn't a finite number >= 1.0
    pub fn validate(&self) -> Result<Arc<dyn Hasher64>> {
        let hasher = self.hasher.clone().ok_or(Error::InvalidConfig {
            reason: "a hash function is required".to_string(),
        })?;

        if self.key_count == 0 {
            return Err(Error::InvalidConfig {
                reason: "key_count must be positive".to_string(),
            });
        }

        if self.key_count > MAX_KEY_COUNT {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "key_count must be at most {}, got {}",
                    MAX_KEY_COUNT, self.key_count
                ),
            });
        }

        if self.replication_factor == 0 {
            return Err(Error::InvalidConfig {
                reason: "replication_factor must be positive".to_string(),
            });
        }

        if !self.load_factor.is_finite() || self.load_factor < 1.0 {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "load_factor must be a finite number >= 1.0, got {}",
                    self.load_factor
                ),
            });
        }

        Ok(hasher)
    }
}

/// Json representation of a [`Config`] plus the nodes the ring starts with
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RingConfig {
    #[serde(default)]
    pub hash: HashAlgorithm,
    #[serde(default = "default_key_count")]
    pub key_count: u64,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
    #[serde(default)]
    pub nodes: Vec<String>,
}

fn default_key_count() -> u64 {
    DEFAULT_KEY_COUNT
}

fn default_replication_factor() -> usize {
    DEFAULT_REPLICATION_FACTOR
}

fn default_load_factor() -> f64 {
    DEFAULT_LOAD_FACTOR
}

impl RingConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let stringified = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&stringified)?)
    }

    pub fn to_config(&self) -> Config {
        Config {
            hasher: Some(self.hash.build()),
            key_count: self.key_count,
            replication_factor: self.replication_factor,
            load_factor: self.load_factor,
        }
    }
}
