//! Bounded-load assignment of a fixed set of partitions to the members of a [`Ring`].
//!
//! Plain consistent hashing gives each member whatever share of the hash space its points happen
//! to cover, which can be very uneven with few members. Here every member gets a capacity of
//! `ceil((key_count / node_count) * load_factor)` partitions, where the division is an integer
//! one. With a `load_factor` close to 1.0 the members can end up with fewer slots than there are
//! partitions, and the assignment fails. Each partition is hashed onto the
//! ring and, starting at its successor point, we walk clockwise until we find a member that still
//! has room for it. The first member with spare capacity wins, even if a less loaded one
//! exists further down the ring: locality is preferred over perfect balance.
//!
//! The assignment is always computed from scratch. There is no randomness anywhere so the same
//! ring and configuration always produce the same [`Assignment`].
use std::{collections::HashMap, sync::Arc};

use tracing::{event, instrument, Level};

use super::ring::Ring;
use crate::{
    cluster::member::Member,
    error::{Error, Result},
};

/// Maximum number of partitions a member can own. 0 when there are no members.
///
/// The even share is rounded down before `load_factor` is applied.
pub fn average_load(key_count: u64, node_count: usize, load_factor: f64) -> f64 {
    if node_count == 0 {
        return 0.0;
    }

    ((key_count / node_count as u64) as f64 * load_factor).ceil()
}

/// Result of a full distribution: owner of every partition and the number of partitions owned by
/// each member.
#[derive(Debug)]
pub struct Assignment<N> {
    /// indexed by partition id
    partitions: Vec<Arc<N>>,
    loads: HashMap<String, u64>,
}

impl<N> Default for Assignment<N> {
    fn default() -> Self {
        Self {
            partitions: Vec::new(),
            loads: HashMap::new(),
        }
    }
}

impl<N: Member> Assignment<N> {
    pub fn owner(&self, partition: u64) -> Option<&Arc<N>> {
        usize::try_from(partition)
            .ok()
            .and_then(|index| self.partitions.get(index))
    }

    /// Number of partitions owned by `identity`
    pub fn load(&self, identity: &str) -> u64 {
        self.loads.get(identity).copied().unwrap_or_default()
    }

    pub fn loads(&self) -> &HashMap<String, u64> {
        &self.loads
    }

    /// Identity of the owner of each partition, indexed by partition id
    pub fn identities(&self) -> Vec<String> {
        self.partitions
            .iter()
            .map(|owner| owner.identity().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Distributes `key_count` partitions over the members of a [`Ring`]
#[derive(Debug, Clone, Copy)]
pub struct PartitionAssigner {
    key_count: u64,
    load_factor: f64,
}

impl PartitionAssigner {
    pub fn new(key_count: u64, load_factor: f64) -> Self {
        Self {
            key_count,
            load_factor,
        }
    }

    pub fn key_count(&self) -> u64 {
        self.key_count
    }

    pub fn average_load(&self, node_count: usize) -> f64 {
        average_load(self.key_count, node_count, self.load_factor)
    }

    /// Assigns every partition to exactly one member of `ring`.
    ///
    /// `node_count` is the number of distinct members placed on the ring. With no members the
    /// assignment is empty.
    ///
    /// # Error
    /// Returns [`Error::CapacityExhausted`] if a partition can't be placed after visiting every point
    /// of the ring. No partial assignment is ever returned.
    #[instrument(level = "debug", skip(self, ring), fields(ring_points = ring.len()))]
    pub fn assign<N: Member>(&self, ring: &Ring<N>, node_count: usize) -> Result<Assignment<N>> {
        if node_count == 0 {
            return Ok(Assignment::default());
        }

        let average_load = self.average_load(node_count);
        let mut partitions = Vec::with_capacity(self.key_count as usize);
        let mut loads: HashMap<String, u64> = HashMap::with_capacity(node_count);

        for partition in 0..self.key_count {
            let hash = ring.hash(&partition.to_le_bytes());
            let owner = Self::first_with_capacity(ring, hash, average_load, &loads).ok_or(
                Error::CapacityExhausted {
                    partition,
                    average_load,
                    ring_points: ring.len(),
                },
            )?;

            *loads.entry(owner.identity().to_string()).or_default() += 1;
            partitions.push(owner.clone());
        }

        event!(
            Level::DEBUG,
            "distributed {} partitions over {} nodes (average load {})",
            self.key_count,
            node_count,
            average_load
        );

        Ok(Assignment { partitions, loads })
    }

    /// Walks the ring clockwise from the successor of `hash`, visiting each point at most once.
    fn first_with_capacity<'a, N: Member>(
        ring: &'a Ring<N>,
        hash: u64,
        average_load: f64,
        loads: &HashMap<String, u64>,
    ) -> Option<&'a Arc<N>> {
        let start = ring.successor_index(hash)?;
        (0..ring.len())
            .filter_map(|step| ring.owner_at((start + step) % ring.len()))
            .find(|owner| {
                let load = loads.get(owner.identity()).copied().unwrap_or_default();
                (load + 1) as f64 <= average_load
            })
    }
}
