//! Epoch entropy
//!
//! Several historical block identifiers are hashed together so that a
//! single block producer cannot grind the committee. Only finalized blocks
//! are sampled, so every replica reads the same bytes.

use crate::context::ChainContext;
use namechain_core::{BlockHeight, LedgerError, ObserverSettings, Result};
use namechain_crypto::{decode_block_identifier, Digest32};

/// Heights sampled for an epoch, in sampling order.
///
/// `epoch_start - offset - i` for `i in 0..num_sampled_blocks`, floored at 0.
pub fn sampled_heights(epoch_start: BlockHeight, settings: &ObserverSettings) -> Vec<BlockHeight> {
    (0..settings.num_sampled_blocks)
        .map(|i| {
            epoch_start
                .saturating_sub(settings.sampled_blocks_offset)
                .saturating_sub(i)
        })
        .collect()
}

/// Entropy for the epoch starting at `epoch_start`.
///
/// Decoded identifiers are concatenated in sampling order and digested
/// once. A block without an identifier aborts the computation.
pub async fn entropy_for_epoch<C>(
    ctx: &C,
    epoch_start: BlockHeight,
    settings: &ObserverSettings,
) -> Result<Digest32>
where
    C: ChainContext + ?Sized,
{
    let mut buffer = Vec::new();

    for height in sampled_heights(epoch_start, settings) {
        let identifier = ctx
            .block_identifier(height)
            .await
            .filter(|id| !id.is_empty())
            .ok_or(LedgerError::MissingHistoricalData { height })?;

        let bytes = decode_block_identifier(&identifier).map_err(|e| {
            LedgerError::MalformedBlockIdentifier {
                height,
                reason: e.to_string(),
            }
        })?;
        buffer.extend_from_slice(&bytes);
    }

    let entropy = ctx.digest(&buffer);
    tracing::debug!(
        epoch_start,
        entropy = %hex::encode(&entropy[..8]),
        "Derived epoch entropy"
    );
    Ok(entropy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InMemoryChain;
    use namechain_crypto::{decode_block_identifier, sha256};

    #[test]
    fn test_sampled_heights_floor_at_zero() {
        let settings = ObserverSettings::default();
        assert_eq!(sampled_heights(0, &settings), vec![0, 0, 0]);
        assert_eq!(sampled_heights(51, &settings), vec![1, 0, 0]);
        assert_eq!(sampled_heights(1_000, &settings), vec![950, 949, 948]);
    }

    #[tokio::test]
    async fn test_entropy_hashes_decoded_identifiers() {
        let chain = InMemoryChain::with_uniform_identifier(0, "test-indep-hash");
        let settings = ObserverSettings::default();

        let decoded = decode_block_identifier("test-indep-hash").unwrap();
        let expected = sha256(&[decoded.clone(), decoded.clone(), decoded].concat());

        let entropy = entropy_for_epoch(&chain, 0, &settings).await.unwrap();
        assert_eq!(entropy, expected);
    }

    #[tokio::test]
    async fn test_entropy_follows_sampling_order() {
        let mut chain = InMemoryChain::new(2_000);
        chain.insert_identifier(950, "AQ");
        chain.insert_identifier(949, "Ag");
        chain.insert_identifier(948, "Aw");
        let settings = ObserverSettings::default();

        let entropy = entropy_for_epoch(&chain, 1_000, &settings).await.unwrap();
        assert_eq!(entropy, sha256(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_missing_identifier_is_fatal() {
        let mut chain = InMemoryChain::new(2_000);
        chain.insert_identifier(950, "AQ");
        let settings = ObserverSettings::default();

        let err = entropy_for_epoch(&chain, 1_000, &settings).await.unwrap_err();
        assert_eq!(err, LedgerError::MissingHistoricalData { height: 949 });
        assert_eq!(format!("{}", err), "Block 949 has no identifier");
    }

    #[tokio::test]
    async fn test_malformed_identifier_rejected() {
        let chain = InMemoryChain::with_uniform_identifier(0, "***");
        let err = entropy_for_epoch(&chain, 10, &ObserverSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedBlockIdentifier { height: 0, .. }));
    }
}
