//! Execution context supplied by the host
//!
//! The core never reaches for a global height, clock, or hash function.
//! Each operation receives a `ChainContext` instead.

use async_trait::async_trait;
use namechain_core::BlockHeight;
use namechain_crypto::{Digest32, HashPrimitive, Sha256Primitive};
use std::collections::BTreeMap;

/// Read-only view of the host chain for the action being evaluated
#[async_trait]
pub trait ChainContext: HashPrimitive {
    /// Height of the block containing the current action
    fn block_height(&self) -> BlockHeight;

    /// Base64url identifier of a finalized block, if the host has it.
    ///
    /// Identifiers are content-addressed by height, so the time at which
    /// the host resolves this lookup never changes the result.
    async fn block_identifier(&self, height: BlockHeight) -> Option<String>;
}

/// Chain view backed by an in-memory identifier table
#[derive(Clone, Debug, Default)]
pub struct InMemoryChain {
    height: BlockHeight,
    identifiers: BTreeMap<BlockHeight, String>,
    fallback_identifier: Option<String>,
    hasher: Sha256Primitive,
}

impl InMemoryChain {
    /// Create an empty chain positioned at `height`
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Chain where every height resolves to the same identifier
    pub fn with_uniform_identifier(height: BlockHeight, identifier: impl Into<String>) -> Self {
        Self {
            height,
            fallback_identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    /// Record the identifier of a block
    pub fn insert_identifier(&mut self, height: BlockHeight, identifier: impl Into<String>) {
        self.identifiers.insert(height, identifier.into());
    }
}

impl HashPrimitive for InMemoryChain {
    fn digest(&self, data: &[u8]) -> Digest32 {
        self.hasher.digest(data)
    }
}

#[async_trait]
impl ChainContext for InMemoryChain {
    fn block_height(&self) -> BlockHeight {
        self.height
    }

    async fn block_identifier(&self, height: BlockHeight) -> Option<String> {
        self.identifiers
            .get(&height)
            .cloned()
            .or_else(|| self.fallback_identifier.clone())
    }
}
