//! Order handler for the validate, fetch-proof and submit stages.
//!
//! Each stage emits one structured event carrying `stage` and `outcome`
//! fields. Failures are returned to the engine, which decides whether they
//! end the request or only the current order.

use crate::engine::{RelayError, Stage};
use relayer_ledger::LedgerService;
use relayer_oracle::OracleService;
use relayer_types::{PendingOrder, Proof, TransactionReceipt};
use std::sync::Arc;

/// Runs the ledger and oracle calls for a single order.
pub struct OrderHandler {
	oracle: Arc<OracleService>,
	ledger: LedgerService,
}

impl OrderHandler {
	pub fn new(oracle: Arc<OracleService>, ledger: LedgerService) -> Self {
		Self { oracle, ledger }
	}

	/// Reads the order back from the ledger.
	pub async fn validate(&self, order_id: u64) -> Result<PendingOrder, RelayError> {
		match self.ledger.get_pending_order(order_id).await {
			Ok(order) => {
				tracing::info!(
					stage = %Stage::Validate,
					outcome = "success",
					ledger_index = order.proof_source_index,
					owner = %order.owner,
					"Order is pending"
				);
				Ok(order)
			},
			Err(e) => {
				tracing::warn!(stage = %Stage::Validate, outcome = "failure", error = %e);
				Err(e.into())
			},
		}
	}

	/// Obtains the proof stored under `proof_index`.
	pub async fn fetch_proof(&self, proof_index: u64) -> Result<Proof, RelayError> {
		match self.oracle.fetch_proof(proof_index).await {
			Ok(proof) => {
				tracing::info!(
					stage = %Stage::FetchProof,
					outcome = "success",
					proof_index,
					proof_len = proof.len(),
				);
				Ok(proof)
			},
			Err(e) => {
				tracing::warn!(
					stage = %Stage::FetchProof,
					outcome = "failure",
					proof_index,
					error = %e
				);
				Err(e.into())
			},
		}
	}

	/// Submits the proof and waits for the ledger to confirm it.
	pub async fn submit(&self, order_id: u64, proof: &Proof) -> Result<TransactionReceipt, RelayError> {
		match self.ledger.execute_order(order_id, proof).await {
			Ok(receipt) => {
				tracing::info!(
					stage = %Stage::Confirm,
					outcome = "success",
					tx_hash = %receipt.hash,
					block_number = receipt.block_number,
				);
				Ok(receipt)
			},
			Err(e) => {
				tracing::warn!(stage = %Stage::Submit, outcome = "failure", error = %e);
				Err(e.into())
			},
		}
	}

	/// Fetches the proof then submits it. The ledger is never written when
	/// no proof was obtained.
	pub async fn relay(
		&self,
		order_id: u64,
		proof_index: u64,
	) -> Result<TransactionReceipt, RelayError> {
		let proof = self.fetch_proof(proof_index).await?;
		self.submit(order_id, &proof).await
	}
}
