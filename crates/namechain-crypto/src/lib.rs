//! # Namechain Crypto
//!
//! Hash primitives used by the deterministic core:
//!
//! - **SHA-256** for epoch entropy and the sortition hash chain. The primitive
//!   is injected through [`HashPrimitive`] so a host can supply its own
//!   implementation, but every replica must use the same one.
//! - **BLAKE3** for local state fingerprints compared between replicas.
//! - **base64url** decoding of historical block identifiers.

pub mod hash;
pub mod identifier;

pub use hash::{hash_blake3, sha256, Digest32, HashPrimitive, Sha256Primitive};
pub use identifier::decode_block_identifier;
