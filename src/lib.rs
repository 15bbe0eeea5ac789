//! # headerguard
//!
//! **Passive security checks for captured HTTP exchanges.**
//!
//! headerguard inspects request/response pairs that an intercepting proxy
//! has already captured and reports security-relevant conditions: missing or
//! permissive headers, information leaks, directory listings, loosely scoped
//! cookies, outdated software and weak Content Security Policies. Traffic is
//! never modified or replayed.
//!
//! ## Architecture
//!
//! - **[`exchange`]**: captured request/response model with ordered, case-insensitive headers
//! - **[`matcher`]**: ordered literal/regex content matcher with built-in signature sets
//! - **[`detector`]**: detector registry, shared scan context and the detectors themselves
//! - **[`engine`]**: dispatch over the registry with per-detector failure isolation
//! - **[`sink`]**: alert sinks (in-memory, JSON lines)
//! - **[`config`]**: TOML configuration with `${VAR}` substitution
//! - **[`messages`]**: overridable alert text
//! - **[`cli`]**: command-line interface (clap)
//! - **[`error`]**: unified error types using `thiserror`
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default configuration
//! headerguard init
//!
//! # Scan captured exchanges, one JSON alert per line
//! headerguard scan capture.json
//!
//! # See which detectors are active
//! headerguard rules
//! ```

pub mod alert;
pub mod cli;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod matcher;
pub mod messages;
pub mod sink;
