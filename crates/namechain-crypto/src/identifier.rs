//! Block identifier codec
//!
//! Hosts hand out block identifiers as base64url text. Entropy is computed
//! over the decoded bytes, so decoding must be identical on every replica.
//! Padding is optional and non-canonical trailing bits are accepted, which
//! matches how the host chain's own tooling decodes identifiers.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64url block identifier into raw bytes
pub fn decode_block_identifier(identifier: &str) -> Result<Vec<u8>, base64::DecodeError> {
    LENIENT_URL_SAFE.decode(identifier)
}
