//! # Contract ABI Encoding
//!
//! The small subset of the Solidity ABI the marketplace contract needs:
//! 4-byte function selectors, event topics, 32-byte words for `address` and
//! `uint256`, and the JSON-RPC hex quantity format.

use notebox_core::WalletAddress;
use sha3::{Digest, Keccak256};

use crate::error::ChainError;

/// Length of one ABI word.
pub const WORD_LEN: usize = 32;

/// Keccak-256 of `input`.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    Keccak256::digest(input).into()
}

/// First four bytes of the Keccak-256 of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `topic0` of an event, as `0x`-prefixed lowercase hex.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// Left-pad an address to one word.
pub fn encode_address(address: &WalletAddress) -> Result<[u8; WORD_LEN], ChainError> {
    let raw = hex::decode(address.hex_digits())
        .map_err(|e| ChainError::InvalidResponse(format!("address {address}: {e}")))?;
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - raw.len()..].copy_from_slice(&raw);
    Ok(word)
}

/// Big-endian `uint256` word for a value that fits in 128 bits.
pub fn encode_uint(value: u128) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Calldata for a function call: selector followed by argument words.
pub fn encode_call(signature: &str, args: &[[u8; WORD_LEN]]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_LEN);
    data.extend_from_slice(&selector(signature));
    for word in args {
        data.extend_from_slice(word);
    }
    format!("0x{}", hex::encode(data))
}

/// Decode a `uint256` word given as hex (with or without `0x`).
///
/// Values above `u128::MAX` are rejected.
pub fn decode_uint_word(word_hex: &str) -> Result<u128, ChainError> {
    let digits = strip_0x(word_hex);
    let bytes = hex::decode(digits)
        .map_err(|e| ChainError::InvalidResponse(format!("word {word_hex:?}: {e}")))?;
    if bytes.len() != WORD_LEN {
        return Err(ChainError::InvalidResponse(format!(
            "expected a {WORD_LEN}-byte word, got {} bytes",
            bytes.len()
        )));
    }
    if bytes[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::InvalidResponse(
            "uint256 value exceeds 128 bits".into(),
        ));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Encode a JSON-RPC quantity (`0x`-prefixed, no leading zeros).
pub fn to_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

/// Parse a JSON-RPC quantity.
pub fn parse_quantity(quantity: &str) -> Result<u128, ChainError> {
    let digits = strip_0x(quantity);
    if digits.is_empty() {
        return Err(ChainError::InvalidResponse(format!(
            "empty quantity {quantity:?}"
        )));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("quantity {quantity:?}: {e}")))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
