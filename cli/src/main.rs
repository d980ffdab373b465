//! ChainCall CLI: the command-line front end for ChainCall.
//!
//! # Commands
//! ```text
//! chaincall selector     "transfer(address,uint256)"
//! chaincall normalize    "function balanceOf(address owner) view returns (uint256)"
//! chaincall resolve      --abi <path.json> --method <key> --args <json> [--types <json>]
//! chaincall encode-call  --abi <path.json> --method <key> --args <json> [--types <json>]
//! chaincall decode-call  --abi <path.json> --calldata <hex> [--json]
//! chaincall populate     --abi <path.json> --address <addr> --method <key> --args <json> [--config <path>]
//! chaincall parse-tx     <hex>
//! chaincall serialize-tx --json <path> [--unsigned]
//! chaincall parse-sig    <hex>
//! chaincall info
//! ```

use anyhow::Result;
use chaincall_observability::{init_tracing, LogConfig};
use clap::{Parser, Subcommand};

mod cmd_abi;
mod cmd_codec;

#[derive(Parser)]
#[command(
    name = "chaincall",
    about = "Contract method dispatch, calldata and transaction codecs for EVM chains",
    long_about = "
ChainCall CLI: compute selectors, resolve overloaded methods, encode and
decode calldata, populate unsigned transactions, and convert transactions
and signatures to and from their wire encodings. Nothing is sent to a node.

ENVIRONMENT VARIABLES:
  CHAINCALL_LOG    Tracing filter directives, e.g. chaincall_evm=trace;
                   when set, replaces --log-level
",
    version
)]
struct Cli {
    /// Global log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonical signature, selector and event topic of a signature
    Selector {
        /// e.g. "transfer(address,uint256)" or "event Transfer(address indexed,address,uint256)"
        signature: String,
    },

    /// Parse a human-readable fragment and print its canonical forms
    Normalize {
        fragment: String,
    },

    /// Resolve a method key against an ABI for the given arguments
    Resolve {
        #[command(flatten)]
        call: cmd_abi::CallArgs,
    },

    /// Encode call data (selector + ABI-encoded arguments)
    #[command(name = "encode-call")]
    EncodeCall {
        #[command(flatten)]
        call: cmd_abi::CallArgs,
    },

    /// Decode call data using an ABI
    #[command(name = "decode-call")]
    DecodeCall {
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: String,
        /// Raw call data (0x-prefixed hex)
        #[arg(long)]
        calldata: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the unsigned transaction a method call would send
    Populate {
        #[command(flatten)]
        call: cmd_abi::CallArgs,
        /// Contract address
        #[arg(long)]
        address: String,
        /// Dispatch config JSON (chainId, txType, from, block)
        #[arg(long)]
        config: Option<String>,
        #[arg(long)]
        nonce: Option<u64>,
        #[arg(long)]
        gas_limit: Option<u64>,
        /// Value in wei (decimal or 0x-hex)
        #[arg(long)]
        value: Option<String>,
        /// Also print the serialized unsigned transaction
        #[arg(long)]
        raw: bool,
    },

    /// Decode a serialized transaction
    #[command(name = "parse-tx")]
    ParseTx {
        /// Raw transaction (0x-prefixed hex)
        raw: String,
    },

    /// Serialize a transaction given as JSON
    #[command(name = "serialize-tx")]
    SerializeTx {
        /// Path to the transaction JSON file
        #[arg(long)]
        json: String,
        /// Emit the unsigned pre-image even if a signature is present
        #[arg(long)]
        unsigned: bool,
    },

    /// Decode a 65-byte or 64-byte signature
    #[command(name = "parse-sig")]
    ParseSig {
        signature: String,
    },

    /// Show supported formats and build information
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::default()
        .with_level(cli.log_level.clone())
        .json(cli.json_logs);
    init_tracing(&log_config)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "chaincall starting");

    match cli.command {
        Commands::Selector { signature } => cmd_abi::selector(&signature),
        Commands::Normalize { fragment } => cmd_abi::normalize(&fragment),
        Commands::Resolve { call } => cmd_abi::resolve(&call),
        Commands::EncodeCall { call } => cmd_abi::encode_call(&call),
        Commands::DecodeCall { abi, calldata, json } => cmd_abi::decode_call(&abi, &calldata, json),
        Commands::Populate {
            call,
            address,
            config,
            nonce,
            gas_limit,
            value,
            raw,
        } => {
            let overrides = cmd_abi::PopulateOverrides {
                nonce,
                gas_limit,
                value,
            };
            cmd_abi::populate(&call, &address, config.as_deref(), overrides, raw)
        }
        Commands::ParseTx { raw } => cmd_codec::parse_tx(&raw),
        Commands::SerializeTx { json, unsigned } => cmd_codec::serialize_tx(&json, unsigned),
        Commands::ParseSig { signature } => cmd_codec::parse_sig(&signature),
        Commands::Info => cmd_info(),
    }
}

fn cmd_info() -> Result<()> {
    println!("ChainCall v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("ABI:");
    println!("  fragments     function, event, error, constructor (human-readable or JSON)");
    println!("  types         address bool string bytes function bytesN uintN intN T[] T[k] tuples");
    println!("  overloads     resolved by arity and argument kind; ambiguity is an error");
    println!();
    println!("Transactions:");
    println!("  legacy        rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s]), EIP-155");
    println!("  0x01          EIP-2930 access list");
    println!("  0x02          EIP-1559 dynamic fee");
    println!("  0x03          EIP-4844 blob (network sidecar form not supported)");
    println!();
    println!("Signatures:     65-byte r||s||v, 64-byte compact r||yParityAndS (EIP-2098)");
    Ok(())
}
