//! Dispatcher integration tests against a recording in-memory transport.

use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chaincall_core::{
    args,
    error::{DispatchError, ResolveError, TransportError},
    typed::TypedValue,
    value::Value,
};
use chaincall_evm::{
    CallOutcome, CallOverrides, CallRequest, CallTransport, Contract, DispatchConfig,
    MethodRegistry, PendingTransaction, Transaction, TxType,
};

// ─── Mock transport ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    StaticCall(CallRequest),
    Send(Transaction, Option<Address>),
    Estimate(CallRequest),
}

/// Records every request; answers static calls with `return_data`.
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<Recorded>>,
    return_data: Mutex<Bytes>,
    fail_with: Mutex<Option<TransportError>>,
}

impl RecordingTransport {
    fn returning(data: Vec<u8>) -> Arc<Self> {
        let t = Self::default();
        *t.return_data.lock().unwrap() = data.into();
        Arc::new(t)
    }

    fn failing(err: TransportError) -> Arc<Self> {
        let t = Self::default();
        *t.fail_with.lock().unwrap() = Some(err);
        Arc::new(t)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, r: Recorded) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(r);
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CallTransport for RecordingTransport {
    async fn static_call(&self, request: CallRequest) -> Result<Bytes, TransportError> {
        self.record(Recorded::StaticCall(request))?;
        Ok(self.return_data.lock().unwrap().clone())
    }

    async fn send_transaction(
        &self,
        transaction: Transaction,
        from: Option<Address>,
    ) -> Result<PendingTransaction, TransportError> {
        self.record(Recorded::Send(transaction.clone(), from))?;
        Ok(PendingTransaction {
            hash: B256::repeat_byte(0xaa),
            transaction,
        })
    }

    async fn estimate_gas(&self, request: CallRequest) -> Result<U256, TransportError> {
        self.record(Recorded::Estimate(request))?;
        Ok(U256::from(51_234u64))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

const TOKEN: &str = "0x00000000000000000000000000000000000000aa";
const HOLDER: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

fn token() -> Address {
    TOKEN.parse().unwrap()
}

fn holder() -> Address {
    HOLDER.parse().unwrap()
}

fn registry() -> Arc<MethodRegistry> {
    Arc::new(
        MethodRegistry::from_human_readable([
            "function balanceOf(address owner) view returns (uint256 balance)",
            "function reserves() view returns (uint112 reserve0, uint112 reserve1)",
            "function transfer(address to, uint256 amount) returns (bool)",
            "function deposit() payable",
            "function foo(address a)",
            "function foo(uint160 a)",
        ])
        .unwrap(),
    )
}

fn word(v: u64) -> Vec<u8> {
    U256::from(v).to_be_bytes::<32>().to_vec()
}

fn contract(transport: Arc<RecordingTransport>) -> Contract {
    Contract::new(token(), registry(), transport)
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[test]
fn unknown_method_fails_lookup() {
    let c = contract(RecordingTransport::returning(vec![]));
    assert!(matches!(c.method("mint"), Err(ResolveError::NoSuchMethod { .. })));
    assert!(matches!(c.method("foo(bool)"), Err(ResolveError::NoSuchMethod { .. })));
    assert!(c.method("foo").is_ok());
    assert!(c.method("foo(uint160)").is_ok());
}

#[test]
fn encode_and_fragment_do_not_touch_transport() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let m = c.method("balanceOf").unwrap();

    let data = m.encode(args![holder()]).unwrap();
    assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
    assert_eq!(data.len(), 36);
    assert_eq!(m.fragment(&args![holder()]).unwrap().signature(), "balanceOf(address)");
    assert!(transport.requests().is_empty());
}

// ─── Static calls ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn view_call_returns_destructured_output() {
    let transport = RecordingTransport::returning(word(1_000));
    let c = contract(transport.clone());
    let m = c.method("balanceOf").unwrap();

    let out = m.call(args![holder()], &CallOverrides::default()).await.unwrap();
    assert_eq!(out, CallOutcome::Returned(Some(Value::from(1_000u64))));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let Recorded::StaticCall(req) = &requests[0] else {
        panic!("expected a static call, got {:?}", requests[0]);
    };
    assert_eq!(req.to, token());
    assert_eq!(req.block.as_deref(), Some("latest"));
    assert_eq!(&req.data[..4], &[0x70, 0xa0, 0x82, 0x31]);
}

#[tokio::test]
async fn static_call_result_keeps_names() {
    let mut data = word(7);
    data.extend(word(9));
    let c = contract(RecordingTransport::returning(data));
    let m = c.method("reserves").unwrap();

    let result = m.static_call_result(args![], &CallOverrides::default()).await.unwrap();
    assert_eq!(result.get("reserve0"), Some(&Value::from(7u64)));
    assert_eq!(result.get("reserve1"), Some(&Value::from(9u64)));

    let destructured = m.static_call(args![], &CallOverrides::default()).await.unwrap();
    assert_eq!(
        destructured,
        Some(Value::Tuple(vec![Value::from(7u64), Value::from(9u64)]))
    );
}

#[tokio::test]
async fn static_call_on_mutating_method_is_allowed() {
    let c = contract(RecordingTransport::returning(word(1)));
    let m = c.method("transfer").unwrap();
    let out = m
        .static_call(args![holder(), 5u64], &CallOverrides::default().at_block("0x10"))
        .await
        .unwrap();
    assert_eq!(out, Some(Value::Bool(true)));
}

#[tokio::test]
async fn empty_return_data_is_a_decode_error() {
    let c = contract(RecordingTransport::returning(vec![]));
    let err = c
        .method("balanceOf")
        .unwrap()
        .static_call(args![holder()], &CallOverrides::default())
        .await
        .unwrap_err();
    match err {
        DispatchError::Decode { signature, reason } => {
            assert_eq!(signature, "balanceOf(address)");
            assert_eq!(reason, "call returned no data");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn truncated_return_data_is_a_decode_error() {
    let c = contract(RecordingTransport::returning(vec![0u8; 5]));
    let err = c
        .method("balanceOf")
        .unwrap()
        .static_call(args![holder()], &CallOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Decode { .. }));
}

// ─── Sending ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mutating_call_sends() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let overrides = CallOverrides::default().with_from(holder()).with_nonce(3);

    let out = c
        .method("transfer")
        .unwrap()
        .call(args![holder(), 1_000u64], &overrides)
        .await
        .unwrap();
    let CallOutcome::Submitted(pending) = out else {
        panic!("expected a submitted transaction");
    };
    assert_eq!(pending.hash, B256::repeat_byte(0xaa));
    assert_eq!(pending.transaction.nonce, Some(3));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(&requests[0], Recorded::Send(tx, Some(from)) if tx.to == Some(token()) && *from == holder()));
}

#[tokio::test]
async fn payable_method_carries_value() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let pending = c
        .method("deposit")
        .unwrap()
        .send(args![], &CallOverrides::default().with_value(U256::from(10u64)))
        .await
        .unwrap();
    assert_eq!(pending.transaction.value, U256::from(10u64));
    // selector only, no arguments
    assert_eq!(pending.transaction.data.len(), 4);
}

#[tokio::test]
async fn non_payable_value_rejected_before_transport() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let overrides = CallOverrides::default().with_value(U256::from(1u64));

    let err = c
        .method("transfer")
        .unwrap()
        .send(args![holder(), 1u64], &overrides)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::NonPayableValue { ref signature } if signature == "transfer(address,uint256)"));

    let err = c
        .method("balanceOf")
        .unwrap()
        .call(args![holder()], &overrides)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::NonPayableValue { .. }));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn zero_value_is_not_a_payment() {
    let c = contract(RecordingTransport::returning(vec![]));
    let overrides = CallOverrides::default().with_value(U256::ZERO);
    assert!(c
        .method("transfer")
        .unwrap()
        .send(args![holder(), 1u64], &overrides)
        .await
        .is_ok());
}

// ─── Estimation and population ────────────────────────────────────────────────

#[tokio::test]
async fn estimate_gas_never_submits() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let gas = c
        .method("transfer")
        .unwrap()
        .estimate_gas(args![holder(), 1u64], &CallOverrides::default())
        .await
        .unwrap();
    assert_eq!(gas, U256::from(51_234u64));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(requests[0], Recorded::Estimate(_)));
}

#[test]
fn populate_transaction_is_offline() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone()).with_config(DispatchConfig::default().with_chain_id(10));
    let overrides = CallOverrides::default()
        .with_nonce(4)
        .with_gas_limit(60_000)
        .with_fees(30_000_000_000, 1_000_000_000);

    let tx = c
        .method("transfer")
        .unwrap()
        .populate_transaction(args![holder(), 1_000u64], &overrides)
        .unwrap();

    assert_eq!(tx.tx_type, TxType::DynamicFee);
    assert_eq!(tx.chain_id, Some(10));
    assert_eq!(tx.nonce, Some(4));
    assert_eq!(tx.gas_limit, Some(60_000));
    assert_eq!(tx.max_fee_per_gas, Some(30_000_000_000));
    assert_eq!(tx.to, Some(token()));
    assert!(tx.signature.is_none());
    assert_eq!(&tx.data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    assert!(transport.requests().is_empty());

    // the populated transaction is complete enough to serialize and re-parse
    let bytes = tx.serialize().unwrap();
    assert_eq!(Transaction::parse(&bytes).unwrap(), tx);
}

#[test]
fn gas_price_override_selects_legacy_envelope() {
    let c = contract(RecordingTransport::returning(vec![]));
    let m = c.method("transfer").unwrap();

    let tx = m
        .populate_transaction(args![holder(), 1u64], &CallOverrides::default().with_gas_price(5))
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Legacy);
    assert_eq!(tx.gas_price, Some(5));
    assert!(tx.access_list.is_none());

    let mixed = CallOverrides::default().with_gas_price(5).with_fees(6, 1);
    assert!(matches!(
        m.populate_transaction(args![holder(), 1u64], &mixed),
        Err(DispatchError::Codec(_))
    ));
}

#[test]
fn blob_envelope_cannot_be_populated() {
    let c = contract(RecordingTransport::returning(vec![]))
        .with_config(DispatchConfig::default().with_tx_type(TxType::Blob));
    let m = c.method("transfer").unwrap();
    for overrides in [CallOverrides::default(), CallOverrides::default().with_gas_price(5)] {
        assert!(matches!(
            m.populate_transaction(args![holder(), 1u64], &overrides),
            Err(DispatchError::Codec(_))
        ));
    }
}

// ─── Overloads and errors ─────────────────────────────────────────────────────

#[tokio::test]
async fn overloads_through_the_dispatcher() {
    let transport = RecordingTransport::returning(vec![]);
    let c = contract(transport.clone());
    let m = c.method("foo").unwrap();

    let err = m.encode(args![holder()]).unwrap_err();
    assert!(matches!(err, DispatchError::Resolve(ResolveError::AmbiguousMethod { .. })));

    let as_uint = m
        .fragment(&args![TypedValue::uint(160, U256::from(1u64)).unwrap()])
        .unwrap();
    assert_eq!(as_uint.signature(), "foo(uint160)");

    let explicit = c.method("foo(address)").unwrap();
    assert!(explicit.encode(args![holder()]).is_ok());
}

#[tokio::test]
async fn transport_errors_pass_through_unchanged() {
    let rpc = TransportError::Rpc {
        code: -32000,
        message: "execution reverted".into(),
    };
    let c = contract(RecordingTransport::failing(rpc.clone()));

    let err = c
        .method("balanceOf")
        .unwrap()
        .static_call(args![holder()], &CallOverrides::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), rpc.to_string());
    assert!(matches!(err, DispatchError::Transport(ref e) if *e == rpc));

    let err = c
        .method("transfer")
        .unwrap()
        .send(args![holder(), 1u64], &CallOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Transport(TransportError::Rpc { code: -32000, .. })));
}

#[tokio::test]
async fn concurrent_dispatch() {
    let transport = RecordingTransport::returning(word(5));
    let c = Arc::new(contract(transport.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = Arc::clone(&c);
            tokio::spawn(async move {
                c.method("balanceOf")
                    .unwrap()
                    .static_call(args![holder()], &CallOverrides::default())
                    .await
                    .unwrap()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.await.unwrap(), Some(Value::from(5u64)));
    }
    assert_eq!(transport.requests().len(), 8);
}
