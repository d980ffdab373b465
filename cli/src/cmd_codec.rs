//! `parse-tx`, `serialize-tx` and `parse-sig`.

use alloy_primitives::B256;
use anyhow::{Context, Result};
use chaincall_evm::{Signature, Transaction};

pub fn parse_tx(raw: &str) -> Result<()> {
    let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).context("invalid transaction hex")?;
    let tx = Transaction::parse(&bytes)?;

    println!("Type:         {}", tx.tx_type);
    println!("Signing hash: {}", tx.signing_hash()?);
    if tx.is_signed() {
        println!("Hash:         {}", tx.hash()?);
        match tx.recover_signer() {
            Ok(signer) => println!("Signer:       {}", signer.to_checksum(None)),
            Err(e) => println!("Signer:       <unrecoverable: {e}>"),
        }
    }
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}

pub fn serialize_tx(path: &str, unsigned: bool) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("read transaction file '{path}'"))?;
    let tx: Transaction = serde_json::from_str(&json).context("parse transaction JSON")?;

    let bytes = if unsigned || !tx.is_signed() {
        tx.serialize_unsigned()?
    } else {
        tx.serialize()?
    };
    println!("0x{}", hex::encode(&bytes));
    println!("Signing hash: {}", tx.signing_hash()?);
    Ok(())
}

pub fn parse_sig(signature: &str) -> Result<()> {
    let sig: Signature = signature.parse()?;

    println!("r:        {}", B256::from(sig.r()));
    println!("s:        {}", B256::from(sig.s()));
    println!("yParity:  {}", u8::from(sig.y_parity()));
    println!("v:        {}", sig.v());
    println!("low-s:    {}", sig.is_low_s());
    match sig.serialize_compact() {
        Ok(compact) => println!("compact:  0x{}", hex::encode(compact)),
        Err(e) => println!("compact:  <not representable: {e}>"),
    }
    println!("full:     {sig}");
    Ok(())
}
