//! Ring token type.
//!
//! Tokens are positions on a `u64` ring. Keys and virtual nodes are both
//! hashed into this space by a [`Partitioner`](crate::partitioner::Partitioner).

use std::fmt;

/// Position on the hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token(pub u64);

impl Token {
    /// Minimum token value (start of ring).
    pub const ZERO: Token = Token(0);
    /// Maximum token value (end of ring).
    pub const MAX: Token = Token(u64::MAX);

    /// Clockwise distance from `self` to `other` on the ring.
    pub fn distance_to(&self, other: &Self) -> u64 {
        other.0.wrapping_sub(self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_forward() {
        assert_eq!(Token(100).distance_to(&Token(250)), 150);
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(Token(u64::MAX - 1).distance_to(&Token(3)), 5);
        assert_eq!(Token::MAX.distance_to(&Token::ZERO), 1);
    }
}
