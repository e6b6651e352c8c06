//! This file contains the [`RingTable`] data structure, the public entry point of ringtable.
//!
//! It composes a [`Ring`] and a [`PartitionAssigner`] behind a single [`RwLock`]:
//!  - membership changes ([`RingTable::add_node`] / [`RingTable::remove_node`]) take the write lock,
//!    mutate the ring and rebuild the whole partition assignment before releasing it.
//!  - key lookups ([`RingTable::get_node`]) take the read lock, hash the key into one of `key_count`
//!    partitions and read the precomputed owner of that partition. They never walk the ring.
//!
//! Readers can therefore never observe a half-built assignment. The price is that writes are
//! O(key_count * log(ring points)) and block everybody else while they run, so membership churn
//! should be kept low.
//!
//! If a rebuild fails (see [`Error::CapacityExhausted`]), the membership change is rolled back and the
//! previous assignment stays in place.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{event, instrument, Level};

use super::{
    member::Member,
    partitioning::{
        bounded_load::{Assignment, PartitionAssigner},
        hash::Hasher64,
        ring::Ring,
    },
};
use crate::{
    config::Config,
    error::{Error, Result},
};

/// Consistent-hashing ring with bounded-load partition assignment.
///
/// Cloning a [`RingTable`] is cheap and every clone shares the same state.
pub struct RingTable<N> {
    config: Config,
    hasher: Arc<dyn Hasher64>,
    inner: Arc<RwLock<RingTableInner<N>>>,
}

impl<N> Clone for RingTable<N> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            hasher: self.hasher.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<N: Member> std::fmt::Debug for RingTable<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(inner) => {
                write!(f, "RingTable: {:?}", inner)
            }
            Err(_) => {
                write!(f, "Unable to acquire lock for logging at this time...")
            }
        }
    }
}

struct RingTableInner<N> {
    ring: Ring<N>,
    // live members by identity
    nodes: HashMap<String, Arc<N>>,
    assigner: PartitionAssigner,
    assignment: Assignment<N>,
}

impl<N: Member> std::fmt::Debug for RingTableInner<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut identities: Vec<&String> = self.nodes.keys().collect();
        identities.sort();
        for identity in identities {
            write!(
                f,
                "\n{} -> {} partitions",
                identity,
                self.assignment.load(identity)
            )?;
        }

        Ok(())
    }
}

impl<N: Member> RingTableInner<N> {
    fn contains(&self, identity: &str) -> bool {
        self.nodes.contains_key(identity)
    }

    /// Places `node` on the ring without redistributing partitions
    fn place(&mut self, node: Arc<N>) {
        self.ring.add(node.clone());
        self.nodes.insert(node.identity().to_string(), node);
    }

    fn unplace(&mut self, identity: &str) -> Option<Arc<N>> {
        let node = self.nodes.remove(identity)?;
        self.ring.remove(identity);
        Some(node)
    }

    fn distribute(&mut self) -> Result<()> {
        self.assignment = self.assigner.assign(&self.ring, self.nodes.len())?;
        Ok(())
    }
}

impl<N: Member> RingTable<N> {
    /// Builds a ring containing `nodes`. Nodes sharing an identity are only added once.
    ///
    /// # Error
    /// Returns [`Error::InvalidConfig`] if `config` is invalid (eg: no hash function) and
    /// [`Error::CapacityExhausted`] if the initial nodes can't hold every partition.
    pub fn new(nodes: impl IntoIterator<Item = N>, config: Config) -> Result<Self> {
        let hasher = config.validate()?;

        let mut inner = RingTableInner {
            ring: Ring::new(hasher.clone(), config.replication_factor),
            nodes: HashMap::new(),
            assigner: PartitionAssigner::new(config.key_count, config.load_factor),
            assignment: Assignment::default(),
        };

        for node in nodes {
            if inner.contains(node.identity()) {
                event!(
                    Level::WARN,
                    "Ignoring duplicated initial node {}",
                    node.identity()
                );
                continue;
            }
            inner.place(Arc::new(node));
        }
        inner.distribute()?;

        Ok(Self {
            config,
            hasher,
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// Adds `node` to the ring and redistributes every partition.
    ///
    /// Returns `false` (and does nothing) if a node with the same identity is already part of the ring.
    ///
    /// # Error
    /// Returns [`Error::CapacityExhausted`] if the partitions can't be redistributed. The node is not added in that case.
    #[instrument(level = "info", skip(self, node), fields(node = node.identity()))]
    pub fn add_node(&self, node: N) -> Result<bool> {
        let mut guard = self.acquire_write_lock()?;
        if guard.contains(node.identity()) {
            return Ok(false);
        }

        let identity = node.identity().to_string();
        guard.place(Arc::new(node));
        if let Err(err) = guard.distribute() {
            event!(
                Level::ERROR,
                "Unable to add node {}, rolling back: {}",
                identity,
                err
            );
            guard.unplace(&identity);
            return Err(err);
        }

        event!(Level::INFO, "Node {} added", identity);
        Ok(true)
    }

    /// Removes the node identified by `identity` and redistributes every partition.
    ///
    /// Returns `false` (and does nothing) if no such node exists. Removing the last node leaves the table empty.
    ///
    /// # Error
    /// Returns [`Error::CapacityExhausted`] if the partitions can't be redistributed. The node is kept in that case.
    #[instrument(level = "info", skip(self))]
    pub fn remove_node(&self, identity: &str) -> Result<bool> {
        let mut guard = self.acquire_write_lock()?;
        let node = match guard.unplace(identity) {
            Some(node) => node,
            None => return Ok(false),
        };

        if guard.nodes.is_empty() {
            guard.assignment = Assignment::default();
            event!(Level::INFO, "Node {} removed, ring is now empty", identity);
            return Ok(true);
        }

        if let Err(err) = guard.distribute() {
            event!(
                Level::ERROR,
                "Unable to remove node {}, rolling back: {}",
                identity,
                err
            );
            guard.place(node);
            return Err(err);
        }

        event!(Level::INFO, "Node {} removed", identity);
        Ok(true)
    }

    /// Returns the node that owns `key`, or [`None`] if the ring is empty
    pub fn get_node(&self, key: &[u8]) -> Result<Option<Arc<N>>> {
        let partition = self.partition_id(key);
        self.partition_owner(partition)
    }

    /// Returns the node that owns `partition`, or [`None`] if the ring is empty or `partition` is out of range
    pub fn partition_owner(&self, partition: u64) -> Result<Option<Arc<N>>> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.assignment.owner(partition).cloned())
    }

    /// Maps `key` to one of the `key_count` partitions
    pub fn partition_id(&self, key: &[u8]) -> u64 {
        self.hasher.sum64(key) % self.config.key_count
    }

    /// Maximum number of partitions any node can own with the current membership. 0 if the ring is empty.
    pub fn average_load(&self) -> Result<f64> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.assigner.average_load(guard.nodes.len()))
    }

    /// Number of partitions owned by each node
    pub fn loads(&self) -> Result<HashMap<String, u64>> {
        let guard = self.acquire_read_lock()?;
        let mut loads: HashMap<String, u64> = guard
            .nodes
            .keys()
            .map(|identity| (identity.clone(), 0))
            .collect();
        loads.extend(
            guard
                .assignment
                .loads()
                .iter()
                .map(|(identity, load)| (identity.clone(), *load)),
        );
        Ok(loads)
    }

    /// Identity of the owner of every partition, indexed by partition id. Empty if the ring is empty.
    pub fn snapshot(&self) -> Result<Vec<String>> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.assignment.identities())
    }

    pub fn members(&self) -> Result<Vec<Arc<N>>> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.nodes.values().cloned().collect())
    }

    pub fn contains(&self, identity: &str) -> Result<bool> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.contains(identity))
    }

    pub fn len(&self) -> Result<usize> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.nodes.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A fail to acquire a lock is considered a [`Error::Logic`] since the only reason why
    /// an [`Error`] should be returned is in case of [`RwLock`] poisoning
    fn acquire_read_lock(&self) -> Result<RwLockReadGuard<RingTableInner<N>>> {
        match self.inner.read() {
            Ok(guard) => Ok(guard),
            Err(_) => Err(Error::Logic {
                reason: "Unable to acquire read lock for RingTable - poisoned...".to_string(),
            }),
        }
    }

    fn acquire_write_lock(&self) -> Result<RwLockWriteGuard<RingTableInner<N>>> {
        match self.inner.write() {
            Ok(guard) => Ok(guard),
            Err(_) => Err(Error::Logic {
                reason: "Unable to acquire write lock for RingTable - poisoned...".to_string(),
            }),
        }
    }
}
