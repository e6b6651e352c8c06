//! Hash functions used to place ring points and partitions on the 64 bit hash space.
use murmur3::murmur3_x64_128;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, hash::Hasher, io::Cursor, sync::Arc};
use twox_hash::XxHash64;

/// A 64 bit hash over an opaque byte slice.
///
/// Implementations should be fast and spread their output uniformly. Collisions between ring
/// points are tolerated (the members share the point) but every collision makes the ring a
/// little less balanced.
///
/// The whole byte slice is hashed at once. We only ever hash node identities, user keys and
/// 8 byte partition ids so streaming (update/finalize) APIs are not needed.
pub trait Hasher64: Send + Sync + Debug {
    fn sum64(&self, bytes: &[u8]) -> u64;
}

/// xxHash64 with seed 0. This is the default [`Hasher64`]
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHash64Hasher;

impl Hasher64 for XxHash64Hasher {
    fn sum64(&self, bytes: &[u8]) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(bytes);
        hasher.finish()
    }
}

/// Lower 64 bits of murmur3 x64_128 with seed 0
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Hasher;

impl Hasher64 for Murmur3Hasher {
    fn sum64(&self, bytes: &[u8]) -> u64 {
        // reading from an in-memory cursor can't fail
        murmur3_x64_128(&mut Cursor::new(bytes), 0).unwrap_or_default() as u64
    }
}

/// Hash functions that can be selected through a configuration file
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Xxhash64,
    Murmur3,
}

impl HashAlgorithm {
    pub fn build(&self) -> Arc<dyn Hasher64> {
        match self {
            HashAlgorithm::Xxhash64 => Arc::new(XxHash64Hasher),
            HashAlgorithm::Murmur3 => Arc::new(Murmur3Hasher),
        }
    }
}
