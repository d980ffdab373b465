//! Property-based tests for the transaction and signature codecs.

use alloy_primitives::{Address, Bytes, B256, U256};
use chaincall_core::selector::keccak256;
use chaincall_evm::{
    signature::{SECP256K1_HALF_N, SECP256K1_N},
    AccessListItem, Signature, Transaction, TxType,
};
use k256::ecdsa::{SigningKey, VerifyingKey};
use proptest::prelude::*;

/// Sign a prehash and wrap the result in the codec's signature type.
fn sign_hash(signing_key: &SigningKey, hash: B256) -> Signature {
    let (sig, recovery_id) = signing_key.sign_prehash_recoverable(hash.as_slice()).unwrap();
    let (r, s) = sig.split_bytes();
    Signature::new(U256::from_be_slice(&r), U256::from_be_slice(&s), recovery_id.is_y_odd()).unwrap()
}

fn get_address(signing_key: &SigningKey) -> Address {
    let point = VerifyingKey::from(signing_key).to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_signing_key() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>()).prop_filter("valid secret scalar", |bytes| {
        SigningKey::from_slice(bytes).is_ok()
    })
}

fn arb_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

fn arb_b256() -> impl Strategy<Value = B256> {
    prop::array::uniform32(any::<u8>()).prop_map(B256::from)
}

fn arb_u256() -> impl Strategy<Value = U256> {
    prop_oneof![
        Just(U256::ZERO),
        Just(U256::MAX),
        prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes),
    ]
}

fn arb_nonce() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), Just(u64::MAX), any::<u64>()]
}

fn arb_fee() -> impl Strategy<Value = u128> {
    prop_oneof![Just(0u128), Just(u128::MAX), any::<u128>()]
}

/// Empty, short, and multi-kilobyte payloads.
fn arb_data() -> impl Strategy<Value = Bytes> {
    prop_oneof![
        Just(Bytes::new()),
        prop::collection::vec(any::<u8>(), 1..64).prop_map(Bytes::from),
        prop::collection::vec(any::<u8>(), 1024..4096).prop_map(Bytes::from),
    ]
}

fn arb_access_list() -> impl Strategy<Value = Vec<AccessListItem>> {
    prop::collection::vec(
        (arb_address(), prop::collection::vec(arb_b256(), 0..4)).prop_map(
            |(address, storage_keys)| AccessListItem {
                address,
                storage_keys,
            },
        ),
        0..4,
    )
}

/// Chain ids whose EIP-155 `v` still fits in a u64.
fn arb_legacy_chain_id() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), Just(1u64), Just((u64::MAX - 36) / 2), 2u64..1_000_000u64]
}

fn arb_legacy_tx() -> impl Strategy<Value = Transaction> {
    (
        arb_legacy_chain_id(),
        arb_nonce(),
        arb_fee(),                       // gas_price
        any::<u64>(),                    // gas_limit
        prop::option::of(arb_address()), // None creates a contract
        arb_u256(),                      // value
        arb_data(),
    )
        .prop_map(|(chain_id, nonce, gas_price, gas_limit, to, value, data)| {
            let mut tx = Transaction::new(TxType::Legacy);
            tx.chain_id = Some(chain_id);
            tx.nonce = Some(nonce);
            tx.gas_price = Some(gas_price);
            tx.gas_limit = Some(gas_limit);
            tx.to = to;
            tx.value = value;
            tx.data = data;
            tx
        })
}

fn arb_typed_tx(tx_type: TxType) -> impl Strategy<Value = Transaction> {
    let to = if tx_type == TxType::Blob {
        arb_address().prop_map(Some).boxed()
    } else {
        prop::option::of(arb_address()).boxed()
    };
    (
        (any::<u64>(), arb_nonce(), any::<u64>(), to, arb_u256(), arb_data()),
        (arb_fee(), arb_fee(), arb_fee()),
        arb_access_list(),
        prop::collection::vec(arb_b256(), 0..4),
    )
        .prop_map(
            move |((chain_id, nonce, gas_limit, to, value, data), (fee_a, fee_b, blob_fee), access_list, hashes)| {
                let mut tx = Transaction::new(tx_type);
                tx.chain_id = Some(chain_id);
                tx.nonce = Some(nonce);
                tx.gas_limit = Some(gas_limit);
                tx.to = to;
                tx.value = value;
                tx.data = data;
                tx.access_list = Some(access_list);
                match tx_type {
                    TxType::AccessList => tx.gas_price = Some(fee_a),
                    _ => {
                        tx.max_fee_per_gas = Some(fee_a);
                        tx.max_priority_fee_per_gas = Some(fee_b);
                    }
                }
                if tx_type == TxType::Blob {
                    tx.max_fee_per_blob_gas = Some(blob_fee);
                    tx.blob_versioned_hashes = Some(hashes);
                }
                tx
            },
        )
}

fn arb_any_tx() -> impl Strategy<Value = Transaction> {
    prop_oneof![
        arb_legacy_tx(),
        arb_typed_tx(TxType::AccessList),
        arb_typed_tx(TxType::DynamicFee),
        arb_typed_tx(TxType::Blob),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: an unsigned transaction of any type decodes to itself
    #[test]
    fn prop_unsigned_tx_roundtrip(tx in arb_any_tx()) {
        let encoded = tx.serialize().unwrap();
        let decoded = Transaction::parse(&encoded).unwrap();
        prop_assert_eq!(&decoded, &tx);
        prop_assert_eq!(decoded.serialize().unwrap(), encoded);
    }

    /// Property: signing, encoding and decoding preserves every field and the sender
    #[test]
    fn prop_signed_tx_roundtrip(tx in arb_any_tx(), key in arb_signing_key()) {
        let signing_key = SigningKey::from_slice(&key).unwrap();
        let expected_sender = get_address(&signing_key);

        let signature = sign_hash(&signing_key, tx.signing_hash().unwrap());
        let signed = tx.clone().with_signature(signature);
        let encoded = signed.serialize().unwrap();

        let decoded = Transaction::parse(&encoded).unwrap();
        prop_assert_eq!(decoded.tx_type, tx.tx_type);
        prop_assert_eq!(&decoded, &signed);
        prop_assert_eq!(decoded.recover_signer().unwrap(), expected_sender);
        prop_assert_eq!(decoded.signing_hash().unwrap(), tx.signing_hash().unwrap());
        prop_assert_eq!(decoded.hash().unwrap(), signed.hash().unwrap());
    }

    /// Property: the envelope prefix matches the type, legacy has none
    #[test]
    fn prop_envelope_prefix(tx in arb_any_tx()) {
        let encoded = tx.serialize().unwrap();
        match tx.tx_type {
            TxType::Legacy => prop_assert!(encoded[0] >= 0xc0),
            other => prop_assert_eq!(encoded[0], other.as_byte()),
        }
    }

    /// Property: signatures from the signer are low-s and survive both wire forms
    #[test]
    fn prop_low_s_signature_roundtrip(key in arb_signing_key(), prehash in arb_b256()) {
        let signing_key = SigningKey::from_slice(&key).unwrap();
        let signature = sign_hash(&signing_key, prehash);
        prop_assert!(signature.is_low_s());
        prop_assert!(signature.s() <= SECP256K1_HALF_N);

        let canonical = signature.serialize();
        prop_assert!(canonical[64] == 27 || canonical[64] == 28);
        prop_assert_eq!(Signature::parse(&canonical).unwrap(), signature);

        let compact = signature.serialize_compact().unwrap();
        prop_assert_eq!(Signature::parse(&compact).unwrap(), signature);

        prop_assert_eq!(signature.recover_address(&prehash).unwrap(), get_address(&signing_key));
    }

    /// Property: the high-s twin, when representable, normalizes back and
    /// recovers the same signer
    #[test]
    fn prop_high_s_twin_normalizes(key in arb_signing_key(), prehash in arb_b256()) {
        let signing_key = SigningKey::from_slice(&key).unwrap();
        let low = sign_hash(&signing_key, prehash);
        if let Ok(high) = Signature::new(low.r(), SECP256K1_N - low.s(), !low.y_parity()) {
            prop_assert!(!high.is_low_s());
            prop_assert!(high.serialize_compact().is_err());
            prop_assert_eq!(high.normalize_s(), low);
            prop_assert_eq!(high.recover_address(&prehash).unwrap(), get_address(&signing_key));
        }
    }
}
