//! Key placement on the ring.

use crate::keyspace::RingIndex;
use primitive_types::U256;

/// Hash a raw key onto the 160-bit ring.
///
/// Uses the top 20 bytes of the BLAKE3 digest, interpreted big-endian. The
/// result is already canonical (below `2^160`).
pub fn ring_position(key: &[u8]) -> RingIndex {
    let digest = blake3::hash(key);
    RingIndex(U256::from_big_endian(&digest.as_bytes()[..20]))
}
