//! Core relay engine for the proof relayer.
//!
//! Coordinates the ledger and the proof oracle to take pending orders to
//! completion, either one order on request or every pending order in a
//! batch pass. The engine is built once at startup by [`RelayerBuilder`]
//! and shared by all request handlers.

pub mod builder;
pub mod engine;
pub mod handlers;

pub use builder::{BuilderError, RelayerBuilder, RelayerFactories};
pub use engine::{RelayEngine, RelayError, Stage};
