//! Core library for bounded-load consistent hashing.
//!
//! This crate provides:
//! - Ring tokens and partitioners
//! - Node and virtual node abstractions
//! - The hash ring with its per-node load table
//! - Bounded-load key resolution (`get_least`)

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod vnode;

pub use error::{Result, RingError};
pub use node::NodeId;
pub use partitioner::Partitioner;
pub use ring::{HashRing, LoadTable, Ring, RingBuilder, SharedRing};
pub use token::Token;
pub use vnode::VirtualNode;
