//! # chaincall-observability
//!
//! Structured logging for ChainCall binaries and services.
//!
//! The library crates only emit `tracing` events: `debug!` for registry
//! builds, overload resolution and dispatch, `trace!` inside the codecs.
//! This crate installs the subscriber that renders them, as text or JSON,
//! with per-component levels.

pub mod tracing_setup;

pub use tracing_setup::{env_filter, init_tracing, LogConfig, LogInitError, LOG_ENV};
