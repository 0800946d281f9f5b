//! Per-order handlers used by the relay engine.

pub mod order;

pub use order::OrderHandler;
