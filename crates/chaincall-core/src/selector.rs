//! Selector and topic computation.
//!
//! The selector of a function is the first 4 bytes of the keccak256 hash of
//! its canonical signature:
//!   keccak256("transfer(address,uint256)")[..4] → 0xa9059cbb
//!
//! Events use the full 32-byte hash as topics[0].

use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// 4-byte selector of a canonical signature string.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 32-byte topic of a canonical event signature string.
pub fn topic(signature: &str) -> B256 {
    B256::from(keccak256(signature.as_bytes()))
}

/// `0x`-prefixed lowercase hex form of a selector.
pub fn selector_hex(selector: [u8; 4]) -> String {
    format!("0x{}", hex::encode(selector))
}
