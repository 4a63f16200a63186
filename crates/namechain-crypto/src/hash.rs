//! Hashing utilities for Namechain
//!
//! Consensus paths hash with SHA-256 only. BLAKE3 is used for local
//! fingerprints that never feed back into state.

use sha2::{Digest, Sha256};

/// 256-bit digest
pub type Digest32 = [u8; 32];

/// Injectable hash primitive.
///
/// Entropy and sortition take the primitive as a parameter instead of
/// calling a process-wide function.
pub trait HashPrimitive: Send + Sync {
    /// Digest an arbitrary byte buffer
    fn digest(&self, data: &[u8]) -> Digest32;
}

/// SHA-256 backed by the `sha2` crate
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Primitive;

impl HashPrimitive for Sha256Primitive {
    fn digest(&self, data: &[u8]) -> Digest32 {
        sha256(data)
    }
}

/// SHA-256 of a byte slice
pub fn sha256(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    finish(hasher)
}

fn finish(hasher: Sha256) -> Digest32 {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    bytes
}

/// BLAKE3 of a byte slice (256-bit output)
pub fn hash_blake3(data: &[u8]) -> Digest32 {
    *blake3::hash(data).as_bytes()
}
