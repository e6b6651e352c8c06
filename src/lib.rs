pub mod cluster;
pub mod config;
pub mod error;
pub mod telemetry;

pub use cluster::{
    member::{Member, Node},
    partitioning::hash::{HashAlgorithm, Hasher64, Murmur3Hasher, XxHash64Hasher},
    ring_table::RingTable,
};
pub use config::{Config, RingConfig};
pub use error::{Error, Result};

#[cfg(test)]
mod utils;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
