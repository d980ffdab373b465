//! EVM transaction codec.
//!
//! Wire layouts (fields in order, signature fields only when signed):
//!
//! | type | payload |
//! |------|---------|
//! | legacy | `rlp([nonce, gasPrice, gasLimit, to, value, data, (v, r, s)])` |
//! | 0x01 (EIP-2930) | `0x01 ‖ rlp([chainId, nonce, gasPrice, gasLimit, to, value, data, accessList, (yParity, r, s)])` |
//! | 0x02 (EIP-1559) | `0x02 ‖ rlp([chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data, accessList, (yParity, r, s)])` |
//! | 0x03 (EIP-4844) | `0x03 ‖ rlp([... as 0x02 ..., maxFeePerBlobGas, blobVersionedHashes, (yParity, r, s)])` |
//!
//! An unsigned legacy transaction with a chain id serializes to its EIP-155
//! pre-image, `[..., chainId, 0, 0]`; a signed one carries
//! `v = chainId * 2 + 35 + yParity`, or `27 + yParity` without a chain id.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use chaincall_core::{error::CodecError, selector::keccak256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::rlp::{ListDecoder, ListEncoder};
use crate::signature::Signature;

/// Transaction envelope type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxType {
    Legacy,
    /// EIP-2930
    AccessList,
    /// EIP-1559
    #[default]
    DynamicFee,
    /// EIP-4844
    Blob,
}

impl TxType {
    /// Typed-envelope prefix byte. Legacy transactions have none; 0 is
    /// returned for completeness.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Legacy => 0x00,
            Self::AccessList => 0x01,
            Self::DynamicFee => 0x02,
            Self::Blob => 0x03,
        }
    }

    /// Envelope type for a typed-transaction prefix byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::AccessList),
            0x02 => Some(Self::DynamicFee),
            0x03 => Some(Self::Blob),
            _ => None,
        }
    }

    /// Number of unsigned payload fields for a typed envelope.
    fn unsigned_field_count(self) -> usize {
        match self {
            Self::Legacy => 6,
            Self::AccessList => 8,
            Self::DynamicFee => 9,
            Self::Blob => 11,
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::AccessList => write!(f, "access-list (0x01)"),
            Self::DynamicFee => write!(f, "dynamic-fee (0x02)"),
            Self::Blob => write!(f, "blob (0x03)"),
        }
    }
}

/// One access-list entry: an address and the storage slots it pre-warms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

impl AccessListItem {
    fn payload_length(&self) -> usize {
        self.address.length() + self.storage_keys.length()
    }
}

impl Encodable for AccessListItem {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        self.address.encode(out);
        self.storage_keys.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for AccessListItem {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started = buf.len();
        let address = Address::decode(buf)?;
        let storage_keys = Vec::<B256>::decode(buf)?;
        let consumed = started - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(Self {
            address,
            storage_keys,
        })
    }
}

/// An EVM transaction of any supported envelope type.
///
/// Fields that do not belong to `tx_type` must be `None`; serialization
/// rejects them. Numeric fields left `None` serialize as zero.
///
/// Typed envelopes always carry an access list on the wire, so
/// [`Transaction::new`] and [`Transaction::parse`] hold it as `Some`, empty
/// when there are no entries. A typed transaction built by hand with
/// `access_list: None` serializes the same bytes but parses back as
/// `Some(vec![])`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type", default)]
    pub tx_type: TxType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Legacy and access-list transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    /// Dynamic-fee and blob transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    /// Dynamic-fee and blob transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    /// Blob transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<u128>,
    /// `None` creates a contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    /// Every type except legacy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    /// Blob transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl Transaction {
    /// An empty transaction of the given type. Typed envelopes start with
    /// an empty access list.
    pub fn new(tx_type: TxType) -> Self {
        Self {
            tx_type,
            access_list: (tx_type != TxType::Legacy).then(Vec::new),
            ..Self::default()
        }
    }

    /// Attach a signature.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Decode a serialized transaction of any supported type.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        let tx = match bytes.first() {
            None => return Err(CodecError::transaction("empty input")),
            Some(&b) if b >= 0xc0 => decode_legacy(bytes)?,
            Some(&b) if b <= 0x7f => {
                let tx_type = TxType::from_byte(b).ok_or_else(|| {
                    CodecError::transaction(format!("unsupported transaction type 0x{b:02x}"))
                })?;
                decode_typed(tx_type, &bytes[1..])?
            }
            Some(&b) => {
                return Err(CodecError::transaction(format!(
                    "invalid leading byte 0x{b:02x}"
                )))
            }
        };
        trace!(tx_type = %tx.tx_type, signed = tx.is_signed(), len = bytes.len(), "transaction parsed");
        Ok(tx)
    }

    /// Serialize, including the signature when one is attached.
    pub fn serialize(&self) -> Result<Bytes, CodecError> {
        self.encode_fields(self.signature.as_ref()).map(Bytes::from)
    }

    /// Serialize the unsigned pre-image, ignoring any attached signature.
    pub fn serialize_unsigned(&self) -> Result<Bytes, CodecError> {
        self.encode_fields(None).map(Bytes::from)
    }

    /// Keccak-256 of the unsigned pre-image: the digest that gets signed.
    pub fn signing_hash(&self) -> Result<B256, CodecError> {
        Ok(B256::from(keccak256(self.serialize_unsigned()?)))
    }

    /// Transaction hash: Keccak-256 of the signed envelope.
    pub fn hash(&self) -> Result<B256, CodecError> {
        if !self.is_signed() {
            return Err(CodecError::transaction("an unsigned transaction has no hash"));
        }
        Ok(B256::from(keccak256(self.serialize()?)))
    }

    /// Recover the sender from the attached signature.
    pub fn recover_signer(&self) -> Result<Address, CodecError> {
        let signature = self
            .signature
            .as_ref()
            .ok_or_else(|| CodecError::transaction("transaction is not signed"))?;
        signature.recover_address(&self.signing_hash()?)
    }

    /// Check that only fields belonging to `tx_type` are set and that the
    /// mandatory ones are present.
    pub fn validate(&self) -> Result<(), CodecError> {
        let misplaced = |field: &str| {
            Err(CodecError::transaction(format!(
                "{field} is not allowed in a {} transaction",
                self.tx_type
            )))
        };
        let missing = |field: &str| {
            Err(CodecError::transaction(format!(
                "{field} is required for a {} transaction",
                self.tx_type
            )))
        };

        let fee_market = self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some();
        let blob = self.max_fee_per_blob_gas.is_some() || self.blob_versioned_hashes.is_some();

        match self.tx_type {
            TxType::Legacy => {
                if fee_market {
                    return misplaced("maxFeePerGas / maxPriorityFeePerGas");
                }
                if self.access_list.is_some() {
                    return misplaced("accessList");
                }
                if blob {
                    return misplaced("blob fields");
                }
            }
            TxType::AccessList => {
                if fee_market {
                    return misplaced("maxFeePerGas / maxPriorityFeePerGas");
                }
                if blob {
                    return misplaced("blob fields");
                }
            }
            TxType::DynamicFee => {
                if self.gas_price.is_some() {
                    return misplaced("gasPrice");
                }
                if blob {
                    return misplaced("blob fields");
                }
            }
            TxType::Blob => {
                if self.gas_price.is_some() {
                    return misplaced("gasPrice");
                }
                if self.to.is_none() {
                    return missing("to");
                }
                if self.max_fee_per_blob_gas.is_none() {
                    return missing("maxFeePerBlobGas");
                }
                if self.blob_versioned_hashes.is_none() {
                    return missing("blobVersionedHashes");
                }
            }
        }

        if self.tx_type != TxType::Legacy && self.chain_id.is_none() {
            return missing("chainId");
        }
        Ok(())
    }

    fn encode_fields(&self, signature: Option<&Signature>) -> Result<Vec<u8>, CodecError> {
        self.validate()?;

        let nonce = self.nonce.unwrap_or_default();
        let gas_limit = self.gas_limit.unwrap_or_default();
        let chain_id = self.chain_id.unwrap_or_default();
        let no_access_list = Vec::new();
        let access_list = self.access_list.as_ref().unwrap_or(&no_access_list);

        let mut list = ListEncoder::new();
        match self.tx_type {
            TxType::Legacy => {
                list.push(&nonce)
                    .push(&self.gas_price.unwrap_or_default())
                    .push(&gas_limit)
                    .push_to(self.to.as_ref())
                    .push(&self.value)
                    .push(&self.data);
                match signature {
                    Some(sig) => {
                        let v = legacy_v(chain_id, sig.y_parity())?;
                        list.push(&v).push(&sig.r()).push(&sig.s());
                    }
                    None if chain_id != 0 => {
                        list.push(&chain_id).push(&0u8).push(&0u8);
                    }
                    None => {}
                }
                return Ok(list.finish());
            }
            TxType::AccessList => {
                list.push(&chain_id)
                    .push(&nonce)
                    .push(&self.gas_price.unwrap_or_default())
                    .push(&gas_limit)
                    .push_to(self.to.as_ref())
                    .push(&self.value)
                    .push(&self.data)
                    .push(access_list);
            }
            TxType::DynamicFee | TxType::Blob => {
                list.push(&chain_id)
                    .push(&nonce)
                    .push(&self.max_priority_fee_per_gas.unwrap_or_default())
                    .push(&self.max_fee_per_gas.unwrap_or_default())
                    .push(&gas_limit)
                    .push_to(self.to.as_ref())
                    .push(&self.value)
                    .push(&self.data)
                    .push(access_list);
                if self.tx_type == TxType::Blob {
                    let no_hashes = Vec::new();
                    list.push(&self.max_fee_per_blob_gas.unwrap_or_default())
                        .push(self.blob_versioned_hashes.as_ref().unwrap_or(&no_hashes));
                }
            }
        }

        if let Some(sig) = signature {
            list.push(&sig.y_parity()).push(&sig.r()).push(&sig.s());
        }

        let mut out = vec![self.tx_type.as_byte()];
        out.extend_from_slice(&list.finish());
        Ok(out)
    }
}

/// Legacy `v`: `27 + yParity` without a chain id, EIP-155 otherwise.
fn legacy_v(chain_id: u64, y_parity: bool) -> Result<u64, CodecError> {
    if chain_id == 0 {
        return Ok(27 + u64::from(y_parity));
    }
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(35 + u64::from(y_parity)))
        .ok_or_else(|| CodecError::transaction(format!("chain id {chain_id} is too large for EIP-155")))
}

fn decode_legacy(bytes: &[u8]) -> Result<Transaction, CodecError> {
    let mut list = ListDecoder::new(bytes)?;
    let count = list.remaining()?;
    if count != 6 && count != 9 {
        return Err(CodecError::transaction(format!(
            "legacy transaction expects 6 or 9 fields, got {count}"
        )));
    }

    let mut tx = Transaction::new(TxType::Legacy);
    tx.nonce = Some(list.next("nonce")?);
    tx.gas_price = Some(list.next("gasPrice")?);
    tx.gas_limit = Some(list.next("gasLimit")?);
    tx.to = list.next_to()?;
    tx.value = list.next("value")?;
    tx.data = list.next("data")?;
    tx.chain_id = Some(0);

    if count == 9 {
        let v: u64 = list.next("v")?;
        let r: U256 = list.next("r")?;
        let s: U256 = list.next("s")?;
        if r.is_zero() && s.is_zero() {
            // EIP-155 signing pre-image: [..., chainId, 0, 0]
            tx.chain_id = Some(v);
        } else {
            tx.chain_id = Some(match v {
                27 | 28 => 0,
                v if v >= 35 => (v - 35) / 2,
                v => {
                    return Err(CodecError::transaction(format!(
                        "invalid legacy signature v={v}"
                    )))
                }
            });
            tx.signature = Some(Signature::from_parts(r, s, v)?);
        }
    }

    list.finish()?;
    Ok(tx)
}

fn decode_typed(tx_type: TxType, payload: &[u8]) -> Result<Transaction, CodecError> {
    let mut list = ListDecoder::new(payload)?;
    let count = list.remaining()?;
    let unsigned = tx_type.unsigned_field_count();
    let signed = if count == unsigned {
        false
    } else if count == unsigned + 3 {
        true
    } else {
        return Err(CodecError::transaction(format!(
            "{tx_type} transaction expects {unsigned} or {} fields, got {count}",
            unsigned + 3
        )));
    };

    let mut tx = Transaction::new(tx_type);
    tx.chain_id = Some(list.next("chainId")?);
    tx.nonce = Some(list.next("nonce")?);
    if tx_type == TxType::AccessList {
        tx.gas_price = Some(list.next("gasPrice")?);
    } else {
        tx.max_priority_fee_per_gas = Some(list.next("maxPriorityFeePerGas")?);
        tx.max_fee_per_gas = Some(list.next("maxFeePerGas")?);
    }
    tx.gas_limit = Some(list.next("gasLimit")?);
    tx.to = list.next_to()?;
    tx.value = list.next("value")?;
    tx.data = list.next("data")?;
    tx.access_list = Some(list.next("accessList")?);

    if tx_type == TxType::Blob {
        tx.max_fee_per_blob_gas = Some(list.next("maxFeePerBlobGas")?);
        tx.blob_versioned_hashes = Some(list.next("blobVersionedHashes")?);
        if tx.to.is_none() {
            return Err(CodecError::transaction("blob transactions cannot create contracts"));
        }
    }

    if signed {
        let y_parity = list.next_parity()?;
        let r: U256 = list.next("r")?;
        let s: U256 = list.next("s")?;
        tx.signature = Some(Signature::new(r, s, y_parity)?);
    }

    list.finish()?;
    Ok(tx)
}
