//! This module defines the errors that can be returned by ringtable.
//!
//! Only misconfiguration and capacity problems are errors. Asking for a node that isn't
//! part of the ring, or for the owner of a key while the ring is empty, are ordinary
//! results (`bool`/[`Option`]) and never show up here.

use std::fmt::Display;

use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Serialize)]
pub enum Error {
    /// The provided [`crate::config::Config`] can't be used to build a ring (eg: no hash function).
    /// Retrying with the same configuration will always fail.
    InvalidConfig { reason: String },
    /// The bounded-load walk went around the entire ring without finding a node with spare capacity
    /// for `partition`. The operation that triggered the redistribution is refused.
    CapacityExhausted {
        partition: u64,
        average_load: f64,
        ring_points: usize,
    },
    Logic { reason: String },
    Io { reason: String },
    Json { reason: String },
}

impl Error {
    /// Returns true if this is an instance of a [`Error::InvalidConfig`] variant
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Error::InvalidConfig { .. })
    }

    /// Returns true if this is an instance of a [`Error::CapacityExhausted`] variant
    pub fn is_capacity_exhausted(&self) -> bool {
        matches!(self, Error::CapacityExhausted { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}
