//! Workspace id sources.

use crate::workspace::WorkspaceId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Builder;

/// Source of unique workspace identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> WorkspaceId;
}

/// Random (v4) UUIDs drawn from a caller-supplied rng, so seeded runs are
/// reproducible.
#[derive(Debug, Clone)]
pub struct UuidGenerator<R = StdRng> {
    rng: R,
}

impl<R: Rng> UuidGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl UuidGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> IdGenerator for UuidGenerator<R> {
    fn next_id(&mut self) -> WorkspaceId {
        let bytes: [u8; 16] = self.rng.gen();
        WorkspaceId::new(Builder::from_random_bytes(bytes).into_uuid().to_string())
    }
}

/// `"{prefix}-0"`, `"{prefix}-1"`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> WorkspaceId {
        let id = WorkspaceId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
