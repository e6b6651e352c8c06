//! The hash ring: sorted placement of every member's virtual points.
use std::{collections::HashMap, sync::Arc};

use tracing::{event, Level};

use super::hash::Hasher64;
use crate::cluster::member::Member;

/// Hash ring with virtual-node replication.
///
/// Every member is placed `replication_factor` times on a fixed hash space, from [0, 2^64).
/// Point `i` of a member is the hash of its identity followed by the decimal replica index
/// (eg: member "80" with 3 replicas owns hash("800"), hash("801") and hash("802")).
/// Spreading a member over many points smooths out how much of the hash space each
/// member is responsible for.
///
/// A hash `h` belongs to the first point whose value is higher or equal to `h`. The hash space
/// is circular: hashes that are higher than the last point belong to the first point.
///
/// Example with 2 members (A, B) and 2 replicas each:
/// points: [10 (A), 20 (B), 30 (A), 40 (B)]
///  - hash 5  -> index 0 (A)
///  - hash 20 -> index 1 (B)
///  - hash 41 -> index 0 (A), wrapping around
///
/// `points` is kept sorted and duplicate-free. `claims` maps each point back to every member that
/// hashes onto it, sorted by identity. When points collide, the member with the smallest identity
/// owns the point and the others take it over when it leaves. The placement only depends on the
/// current set of members, never on the order they joined or left.
#[derive(Debug)]
pub struct Ring<N> {
    hasher: Arc<dyn Hasher64>,
    replication_factor: usize,
    points: Vec<u64>,
    claims: HashMap<u64, Vec<Arc<N>>>,
}

impl<N: Member> Ring<N> {
    pub fn new(hasher: Arc<dyn Hasher64>, replication_factor: usize) -> Self {
        Self {
            hasher,
            replication_factor,
            points: Vec::new(),
            claims: HashMap::new(),
        }
    }

    /// Places all points of `node` on the ring. Returns how many distinct points it claims, which
    /// is lower than the replication factor only when two of its own replicas collide.
    pub fn add(&mut self, node: Arc<N>) -> usize {
        let mut claimed = 0;
        for replica in 0..self.replication_factor {
            let point = self.point(node.identity(), replica);
            let claimants = self.claims.entry(point).or_default();
            let position = match claim_position(claimants, node.identity()) {
                Ok(_) => continue,
                Err(position) => position,
            };

            if claimants.is_empty() {
                self.points.push(point);
            } else {
                event!(
                    Level::WARN,
                    "ring point {} of {} collides with a point claimed by {}",
                    replica,
                    node.identity(),
                    claimants[0].identity()
                );
            }

            claimants.insert(position, node.clone());
            claimed += 1;
        }

        self.points.sort_unstable();
        claimed
    }

    /// Releases every point claimed by `identity`. A point only leaves the ring once nobody
    /// claims it anymore. Returns how many points were released (0 if the member wasn't part of
    /// the ring).
    pub fn remove(&mut self, identity: &str) -> usize {
        let mut released = 0;
        for replica in 0..self.replication_factor {
            let point = self.point(identity, replica);
            let claimants = match self.claims.get_mut(&point) {
                Some(claimants) => claimants,
                None => continue,
            };
            let position = match claim_position(claimants, identity) {
                Ok(position) => position,
                Err(_) => continue,
            };

            claimants.remove(position);
            released += 1;
            if claimants.is_empty() {
                self.claims.remove(&point);
                if let Ok(index) = self.points.binary_search(&point) {
                    self.points.remove(index);
                }
            }
        }

        released
    }

    /// Index of the first point that is higher or equal to `hash`, wrapping around to 0.
    /// Returns [`None`] if the ring is empty.
    pub fn successor_index(&self, hash: u64) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }

        Some(self.points.partition_point(|point| *point < hash) % self.points.len())
    }

    /// Member owning the point at `index`, if `index` is in range.
    pub fn owner_at(&self, index: usize) -> Option<&Arc<N>> {
        self.points
            .get(index)
            .and_then(|point| self.claims.get(point))
            .and_then(|claimants| claimants.first())
    }

    pub fn points(&self) -> &[u64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn hash(&self, bytes: &[u8]) -> u64 {
        self.hasher.sum64(bytes)
    }

    fn point(&self, identity: &str, replica: usize) -> u64 {
        self.hash(format!("{}{}", identity, replica).as_bytes())
    }
}

/// Position of `identity` in a claimant list sorted by identity, or where it would be inserted
fn claim_position<N: Member>(claimants: &[Arc<N>], identity: &str) -> Result<usize, usize> {
    claimants.binary_search_by(|c| c.identity().cmp(identity))
}
