//! Consistent hash ring implementation.
//!
//! The ring manages token positions and per-node load, and resolves keys to
//! their native node or their bounded-load node.

pub mod bounded;
pub mod load;
pub mod ring;
pub mod shared;

pub use load::LoadTable;
pub use ring::{HashRing, RingBuilder, DEFAULT_LOAD_FACTOR, DEFAULT_POINTS_PER_NODE};
pub use shared::SharedRing;

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
