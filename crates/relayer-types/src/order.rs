//! Order processing types.
//!
//! A [`PendingOrder`] is a live view of ledger state awaiting a proof. Each
//! pass of the orchestrator turns every order it touches into exactly one
//! [`ExecutionOutcome`].

use crate::TransactionHash;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A unit of work recorded on the ledger awaiting proof-backed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
	/// Ledger identifier of the order.
	pub order_id: u64,
	/// Index the oracle uses to locate the proof for this order.
	pub proof_source_index: u64,
	/// Account that opened the order.
	pub owner: Address,
}

/// Request body sent to the proof oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
	pub index: u64,
}

/// Opaque proof payload issued by the oracle.
///
/// The relayer never interprets these bytes; they are forwarded verbatim
/// to the ledger contract.
#[derive(Clone, PartialEq, Eq)]
pub struct Proof(Vec<u8>);

impl Proof {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

// Proofs can be large; only the length is useful in logs.
impl std::fmt::Debug for Proof {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Proof({} bytes)", self.0.len())
	}
}

/// Terminal status of a single order within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
	Success,
	Failure,
}

/// Result of relaying one order.
///
/// Built once per order per run through [`ExecutionOutcome::success`] or
/// [`ExecutionOutcome::failure`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
	pub order_id: u64,
	pub status: OutcomeStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tx_hash: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl ExecutionOutcome {
	pub fn success(order_id: u64, tx_hash: &TransactionHash) -> Self {
		Self {
			order_id,
			status: OutcomeStatus::Success,
			tx_hash: Some(tx_hash.to_hex()),
			error_message: None,
		}
	}

	pub fn failure(order_id: u64, error: impl std::fmt::Display) -> Self {
		Self {
			order_id,
			status: OutcomeStatus::Failure,
			tx_hash: None,
			error_message: Some(error.to_string()),
		}
	}

	pub fn is_success(&self) -> bool {
		self.status == OutcomeStatus::Success
	}
}

/// Aggregate of a batch run, in the order the ledger returned the orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
	pub executed: Vec<ExecutionOutcome>,
}

impl BatchResult {
	/// Number of orders that reached confirmation.
	pub fn succeeded(&self) -> usize {
		self.executed.iter().filter(|o| o.is_success()).count()
	}

	/// Number of orders recorded as failures.
	pub fn failed(&self) -> usize {
		self.executed.len() - self.succeeded()
	}
}
