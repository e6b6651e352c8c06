//! Module that contains the building blocks of the bounded-load partitioning scheme:
//! the hash functions, the hash ring and the partition assignment algorithm.
//!
//! Moving partitions between nodes is expensive for whoever stores the data behind them.
//! For this reason, the more stable the cluster configuration is, the better.
pub mod bounded_load;
pub mod hash;
#[cfg(test)]
pub mod mock;
pub mod ring;
