//! The mock module contains [`Hasher64`] implementations with fully predictable output, used by tests
use std::collections::HashMap;

use super::hash::Hasher64;

/// Maps known inputs to known hashes. Hashing anything else is a bug in the test.
#[derive(Debug)]
pub struct TableHasher {
    table: HashMap<Vec<u8>, u64>,
}

impl TableHasher {
    pub fn new(entries: Vec<(&str, u64)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(key, hash)| (key.as_bytes().to_vec(), hash))
                .collect(),
        }
    }

    /// Adds the 8 byte little-endian partition ids from 0 to `hashes.len()`
    pub fn with_partitions(mut self, hashes: Vec<u64>) -> Self {
        for (partition, hash) in hashes.into_iter().enumerate() {
            self.table
                .insert((partition as u64).to_le_bytes().to_vec(), hash);
        }
        self
    }
}

impl Hasher64 for TableHasher {
    fn sum64(&self, bytes: &[u8]) -> u64 {
        match self.table.get(bytes) {
            Some(hash) => *hash,
            None => panic!("TableHasher doesn't know how to hash {:?}", bytes),
        }
    }
}

/// Every input collides
#[derive(Debug)]
pub struct ConstantHasher(pub u64);

impl Hasher64 for ConstantHasher {
    fn sum64(&self, _bytes: &[u8]) -> u64 {
        self.0
    }
}
