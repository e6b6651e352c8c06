//! Module that contains the ring members and the data structures that decide which member owns each key
pub mod member;
pub mod partitioning;
pub mod ring_table;
