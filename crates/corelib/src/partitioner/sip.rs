//! SipHash partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Keyed SipHash-1-3 partitioner.
///
/// Slower than XXH3; useful when the key set may be adversarial. Both keys
/// default to zero, which keeps placements reproducible across processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner {
    key0: u64,
    key1: u64,
}

impl SipPartitioner {
    pub fn with_keys(key0: u64, key1: u64) -> Self {
        Self { key0, key1 }
    }
}

impl Partitioner for SipPartitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let mut hasher = SipHasher13::new_with_keys(self.key0, self.key1);
        hasher.write(key);
        Token(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}
