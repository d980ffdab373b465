//! secp256k1 ECDSA signature codec.
//!
//! Two wire forms:
//! - canonical 65 bytes: `r ‖ s ‖ v` with v emitted as 27/28
//! - compact 64 bytes (EIP-2098): `r ‖ (yParity << 255 | s)`, low-s only
//!
//! Parsing accepts v ∈ {0, 1, 27, 28} and normalizes it to a y-parity bit.
//! Both scalars must lie in `1..n`.

use alloy_primitives::{uint, Address, B256, U256};
use chaincall_core::{error::CodecError, selector::keccak256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Order of the secp256k1 group.
pub const SECP256K1_N: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// Largest low-s value, `n / 2`.
pub const SECP256K1_HALF_N: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// An ECDSA signature with its recovery bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    r: U256,
    s: U256,
    y_parity: bool,
}

impl Signature {
    /// Build from components. `r` and `s` must be non-zero scalars below
    /// the group order, and `s` must leave the top bit clear so the
    /// signature stays representable in compact form.
    pub fn new(r: U256, s: U256, y_parity: bool) -> Result<Self, CodecError> {
        if r.is_zero() || r >= SECP256K1_N {
            return Err(CodecError::signature("r is not in the range 1..n"));
        }
        if s.is_zero() || s >= SECP256K1_N {
            return Err(CodecError::signature("s is not in the range 1..n"));
        }
        if s.bit(255) {
            return Err(CodecError::signature("s has the top bit set"));
        }
        Ok(Self { r, s, y_parity })
    }

    /// Parse the 65-byte `r ‖ s ‖ v` form or the 64-byte compact form.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        trace!(len = bytes.len(), "parsing signature");
        match bytes.len() {
            65 => {
                let r = U256::from_be_slice(&bytes[..32]);
                let s = U256::from_be_slice(&bytes[32..64]);
                match bytes[64] {
                    v @ (0 | 1 | 27 | 28) => Self::from_parts(r, s, u64::from(v)),
                    v => Err(CodecError::signature(format!("invalid recovery value v={v}"))),
                }
            }
            64 => Self::from_compact_parts(
                B256::from_slice(&bytes[..32]),
                B256::from_slice(&bytes[32..]),
            ),
            n => Err(CodecError::signature(format!(
                "expected 64 or 65 bytes, got {n}"
            ))),
        }
    }

    /// Build from `(r, s, v)`. Accepts v ∈ {0, 1, 27, 28} and EIP-155
    /// `v = chainId * 2 + 35 + yParity`.
    pub fn from_parts(r: U256, s: U256, v: u64) -> Result<Self, CodecError> {
        let y_parity = match v {
            0 | 27 => false,
            1 | 28 => true,
            v if v >= 35 => (v - 35) % 2 == 1,
            v => return Err(CodecError::signature(format!("invalid recovery value v={v}"))),
        };
        Self::new(r, s, y_parity)
    }

    /// Build from the EIP-2098 pair `(r, yParityAndS)`.
    pub fn from_compact_parts(r: B256, y_parity_and_s: B256) -> Result<Self, CodecError> {
        let vs = U256::from_be_bytes(y_parity_and_s.0);
        let y_parity = vs.bit(255);
        let mut s = vs;
        s.set_bit(255, false);
        if s > SECP256K1_HALF_N {
            return Err(CodecError::signature("compact signature s is not in the lower half-order"));
        }
        Self::new(U256::from_be_bytes(r.0), s, y_parity)
    }

    pub fn r(&self) -> U256 {
        self.r
    }

    pub fn s(&self) -> U256 {
        self.s
    }

    pub fn y_parity(&self) -> bool {
        self.y_parity
    }

    /// Pre-EIP-155 recovery value, 27 or 28.
    pub fn v(&self) -> u8 {
        27 + u8::from(self.y_parity)
    }

    /// Whether `s ≤ n/2`, as required by EIP-2.
    pub fn is_low_s(&self) -> bool {
        self.s <= SECP256K1_HALF_N
    }

    /// The low-s twin of this signature: `s' = n - s`, parity flipped.
    /// Both recover the same key.
    pub fn normalize_s(&self) -> Self {
        if self.is_low_s() {
            *self
        } else {
            Self {
                r: self.r,
                s: SECP256K1_N - self.s,
                y_parity: !self.y_parity,
            }
        }
    }

    /// Canonical 65-byte form with v = 27/28.
    pub fn serialize(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        out[64] = self.v();
        out
    }

    /// EIP-2098 compact form. Fails for high-s signatures.
    pub fn serialize_compact(&self) -> Result<[u8; 64], CodecError> {
        if !self.is_low_s() {
            return Err(CodecError::signature(
                "s is not in the lower half-order; call normalize_s() first",
            ));
        }
        let mut vs = self.s;
        vs.set_bit(255, self.y_parity);
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..].copy_from_slice(&vs.to_be_bytes::<32>());
        Ok(out)
    }

    /// Recover the address that produced this signature over `prehash`.
    pub fn recover_address(&self, prehash: &B256) -> Result<Address, CodecError> {
        let low = self.normalize_s();
        let sig = EcdsaSignature::from_scalars(low.r.to_be_bytes::<32>(), low.s.to_be_bytes::<32>())
            .map_err(|e| CodecError::signature(format!("invalid signature scalars: {e}")))?;
        let recid = RecoveryId::from_byte(u8::from(low.y_parity))
            .ok_or_else(|| CodecError::signature("invalid recovery id"))?;
        let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &sig, recid)
            .map_err(|e| CodecError::signature(format!("public key recovery failed: {e}")))?;

        let point = key.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl FromStr for Signature {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| CodecError::signature(format!("invalid hex: {e}")))?;
        Self::parse(&bytes)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureJson {
    r: B256,
    s: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_parity: Option<alloy_primitives::U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    v: Option<alloy_primitives::U64>,
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SignatureJson {
            r: B256::from(self.r.to_be_bytes::<32>()),
            s: B256::from(self.s.to_be_bytes::<32>()),
            y_parity: Some(alloy_primitives::U64::from(u8::from(self.y_parity))),
            v: Some(alloy_primitives::U64::from(self.v())),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = SignatureJson::deserialize(deserializer)?;
        let r = U256::from_be_bytes(json.r.0);
        let s = U256::from_be_bytes(json.s.0);
        let v = match (json.y_parity, json.v) {
            (Some(y), _) => y.to::<u64>(),
            (None, Some(v)) => v.to::<u64>(),
            (None, None) => return Err(de::Error::missing_field("yParity")),
        };
        Signature::from_parts(r, s, v).map_err(de::Error::custom)
    }
}
