//! Ring members (physical nodes)
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Anything that can own partitions on the ring.
///
/// Two members are considered the same node if their identities are equal. The identity must be
/// stable: it's hashed to place the member's points on the ring, so changing it would move them.
pub trait Member: Debug + Send + Sync {
    fn identity(&self) -> &str;
}

impl Member for String {
    fn identity(&self) -> &str {
        self
    }
}

/// A storage node identified by its address (eg: `<ip>:<port>`)
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub addr: String,
}

impl Node {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Member for Node {
    fn identity(&self) -> &str {
        &self.addr
    }
}
