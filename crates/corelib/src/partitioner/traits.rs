//! Core partitioner trait definitions.

use crate::token::Token;

/// A partitioner converts keys into tokens for placement on the hash ring.
///
/// Partitioners are stateless and thread-safe. The ring hashes both its
/// virtual node labels and lookup keys with the same partitioner, so swapping
/// it changes every placement.
pub trait Partitioner: Send + Sync + std::fmt::Debug + 'static {
    /// Converts a key into a token.
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
