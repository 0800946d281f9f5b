//! Relay engine driving the per-order state machine.
//!
//! An order moves through `validate` (single mode, when enabled),
//! `fetch_proof`, `submit` and `confirm`. In single mode the first failure
//! is returned to the caller. In batch mode each failure is recorded as that
//! order's outcome and the pass moves on to the next order.

use crate::handlers::OrderHandler;
use relayer_config::ExecutionConfig;
use relayer_ledger::{LedgerError, LedgerService};
use relayer_oracle::{OracleError, OracleService};
use relayer_types::{APIError, BatchResult, ExecutionOutcome, PendingOrder, RunRequest};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors surfaced by the relay engine.
#[derive(Debug, Error)]
pub enum RelayError {
	/// The request is missing a field or carries an unusable value.
	#[error("{0}")]
	Validation(String),
	/// The order is not pending on the ledger.
	#[error("Order {0} not found")]
	NotFound(u64),
	/// No usable proof could be obtained.
	#[error("{0}")]
	Oracle(String),
	/// The execution transaction failed.
	#[error("{0}")]
	Submission(String),
	/// Pending-order discovery returned inconsistent data.
	#[error("{0}")]
	MalformedLedgerResponse(String),
	/// Any other ledger read failure.
	#[error("{0}")]
	Ledger(String),
}

impl RelayError {
	/// Stable machine-readable code reported to API clients.
	pub fn code(&self) -> &'static str {
		match self {
			RelayError::Validation(_) => "VALIDATION_ERROR",
			RelayError::NotFound(_) => "ORDER_NOT_FOUND",
			RelayError::Oracle(_) => "ORACLE_ERROR",
			RelayError::Submission(_) => "SUBMISSION_ERROR",
			RelayError::MalformedLedgerResponse(_) => "MALFORMED_LEDGER_RESPONSE",
			RelayError::Ledger(_) => "LEDGER_ERROR",
		}
	}
}

impl From<RelayError> for APIError {
	fn from(err: RelayError) -> Self {
		let error_type = err.code().to_string();
		let message = err.to_string();
		match err {
			RelayError::Validation(_) => APIError::BadRequest {
				error_type,
				message,
			},
			RelayError::NotFound(_) => APIError::NotFound {
				error_type,
				message,
			},
			RelayError::Oracle(_) => APIError::BadGateway {
				error_type,
				message,
			},
			RelayError::Submission(_)
			| RelayError::MalformedLedgerResponse(_)
			| RelayError::Ledger(_) => APIError::InternalServerError {
				error_type,
				message,
			},
		}
	}
}

impl From<OracleError> for RelayError {
	fn from(err: OracleError) -> Self {
		RelayError::Oracle(err.to_string())
	}
}

impl From<LedgerError> for RelayError {
	fn from(err: LedgerError) -> Self {
		match err {
			LedgerError::NotFound(order_id) => RelayError::NotFound(order_id),
			LedgerError::MalformedResponse(msg) => RelayError::MalformedLedgerResponse(msg),
			LedgerError::Submission(msg) => RelayError::Submission(msg),
			other => RelayError::Ledger(other.to_string()),
		}
	}
}

/// Steps of the per-order state machine, as they appear in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Validate,
	FetchProof,
	Submit,
	Confirm,
}

impl Stage {
	pub fn as_str(&self) -> &'static str {
		match self {
			Stage::Validate => "validate",
			Stage::FetchProof => "fetch_proof",
			Stage::Submit => "submit",
			Stage::Confirm => "confirm",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Long-lived relay context shared by every request.
#[derive(Clone)]
pub struct RelayEngine {
	ledger: LedgerService,
	execution: ExecutionConfig,
	order_handler: Arc<OrderHandler>,
}

impl RelayEngine {
	pub fn new(oracle: OracleService, ledger: LedgerService, execution: ExecutionConfig) -> Self {
		let order_handler = Arc::new(OrderHandler::new(Arc::new(oracle), ledger.clone()));
		Self {
			ledger,
			execution,
			order_handler,
		}
	}

	/// Relays one caller-specified order.
	///
	/// Both request fields are checked before any outbound call. Every
	/// failure is returned as an error; a success carries the transaction
	/// hash.
	#[instrument(skip_all, fields(order_id = tracing::field::Empty))]
	pub async fn execute_order(&self, request: &RunRequest) -> Result<ExecutionOutcome, RelayError> {
		let (order_id, requested_index) = match (request.order_id, request.proof_index) {
			(Some(order_id), Some(proof_index)) => (order_id, proof_index),
			(None, _) => return Err(RelayError::Validation("orderId is required".into())),
			(_, None) => return Err(RelayError::Validation("proofIndex is required".into())),
		};
		tracing::Span::current().record("order_id", order_id);

		let proof_index = if self.execution.validate_before_execute {
			let order = self.order_handler.validate(order_id).await?;
			self.resolve_proof_index(&order, requested_index)
		} else {
			requested_index
		};

		let receipt = self.order_handler.relay(order_id, proof_index).await?;
		Ok(ExecutionOutcome::success(order_id, &receipt.hash))
	}

	/// Relays an order taken from the ledger, folding any failure into the
	/// outcome.
	#[instrument(skip_all, fields(order_id = order.order_id))]
	pub async fn process_order(&self, order: &PendingOrder) -> ExecutionOutcome {
		match self
			.order_handler
			.relay(order.order_id, order.proof_source_index)
			.await
		{
			Ok(receipt) => ExecutionOutcome::success(order.order_id, &receipt.hash),
			Err(e) => ExecutionOutcome::failure(order.order_id, e),
		}
	}

	/// Relays every pending order, one after another, in ledger order.
	///
	/// Only discovery failures abort the pass; per-order failures are
	/// recorded in the result.
	#[instrument(skip_all, fields(batch_id = %uuid::Uuid::new_v4()))]
	pub async fn execute_all(&self) -> Result<BatchResult, RelayError> {
		let orders = self.ledger.get_all_pending_orders().await.map_err(|e| {
			tracing::error!(error = %e, "Pending order discovery failed");
			RelayError::from(e)
		})?;
		tracing::info!(count = orders.len(), "Discovered pending orders");

		let mut executed = Vec::with_capacity(orders.len());
		for order in &orders {
			executed.push(self.process_order(order).await);
		}

		let result = BatchResult { executed };
		tracing::info!(
			succeeded = result.succeeded(),
			failed = result.failed(),
			"Batch complete"
		);
		Ok(result)
	}

	/// Reads a single pending order.
	pub async fn get_pending_order(&self, order_id: u64) -> Result<PendingOrder, RelayError> {
		Ok(self.ledger.get_pending_order(order_id).await?)
	}

	/// Lists every pending order without executing anything.
	pub async fn list_pending_orders(&self) -> Result<Vec<PendingOrder>, RelayError> {
		Ok(self.ledger.get_all_pending_orders().await?)
	}

	/// The ledger's index wins unless overriding is enabled.
	fn resolve_proof_index(&self, order: &PendingOrder, requested: u64) -> u64 {
		let ledger_index = order.proof_source_index;
		if ledger_index == requested {
			return ledger_index;
		}

		if self.execution.allow_index_override {
			tracing::warn!(
				stage = %Stage::Validate,
				ledger_index,
				requested_index = requested,
				"Proof index differs from ledger, using requested index"
			);
			requested
		} else {
			tracing::warn!(
				stage = %Stage::Validate,
				ledger_index,
				requested_index = requested,
				"Proof index differs from ledger, using ledger index"
			);
			ledger_index
		}
	}
}
