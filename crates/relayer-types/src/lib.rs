//! Common types module for the proof relayer.
//!
//! This module defines the data types shared by every relayer component:
//! pending orders read from the ledger, proofs returned by the oracle,
//! per-order execution outcomes, and the wire types of the HTTP API.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Transaction delivery types for ledger interactions.
pub mod delivery;
/// Pending orders, proofs and execution outcomes.
pub mod order;
/// Registry trait for named implementations.
pub mod registry;
/// Redacting wrapper for private keys.
pub mod secret_string;
/// Hex and display helpers.
pub mod utils;
/// Configuration validation types for implementation-specific TOML sections.
pub mod validation;

pub use alloy_primitives::Address;
pub use api::*;
pub use delivery::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{decode_hex, with_0x_prefix, without_0x_prefix};
pub use validation::*;
