//! Hash functions for the Top-K sketch
//!
//! The sketch needs a family of independent row hashes plus one
//! fingerprint hash that is distinct from every row hash. All of them
//! are seeded XxHash64.

use std::hash::Hasher;
use twox_hash::XxHash64;

/// Base seed for the row hash family; row `k` uses `ROW_SEED_BASE + k`
const ROW_SEED_BASE: u64 = 0x517c_c1b7_2722_0a95;

/// Seed for the fingerprint hash, outside the row seed range
const FINGERPRINT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// XXHash 64-bit with an explicit seed
///
/// # Arguments
/// * `data` - The data to hash
/// * `seed` - The hash seed for independent hash functions
pub fn xxhash(data: &[u8], seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write(data);
    hasher.finish()
}

/// Row hash for row `row`, reduced modulo `width` by the caller
pub fn row_hash(data: &[u8], row: usize) -> u64 {
    xxhash(data, ROW_SEED_BASE.wrapping_add(row as u64))
}

/// Fingerprint hash used for bucket ownership checks
///
/// Distinct from all row hashes so a fingerprint match carries
/// information beyond landing in the same bucket.
pub fn fingerprint(data: &[u8]) -> u64 {
    xxhash(data, FINGERPRINT_SEED)
}
