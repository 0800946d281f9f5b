//! Ledger access module for the proof relayer.
//!
//! The ledger is the external contract holding pending orders. This crate
//! reads them (one by id, or all at once) and submits the proof-bearing
//! `executePendingOrder` transaction, waiting for confirmation under an
//! explicit [`ConfirmationPolicy`].

use alloy::primitives::U256;
use async_trait::async_trait;
use relayer_types::{
	Address, ImplementationRegistry, PendingOrder, Proof, SecretString, TransactionReceipt,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// The order does not exist or the lookup reverted.
	#[error("Order {0} not found")]
	NotFound(u64),
	/// Discovery returned data that cannot be turned into orders.
	#[error("Malformed ledger response: {0}")]
	MalformedResponse(String),
	/// The execution transaction failed to send, confirm, or succeed.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// A read-only call failed for a reason other than a revert.
	#[error("Ledger read failed: {0}")]
	Read(String),
	/// The implementation could not be built from its configuration.
	#[error("Ledger configuration error: {0}")]
	Configuration(String),
}

/// How long and how deep to wait for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
	pub min_confirmations: u64,
	pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
	fn default() -> Self {
		Self {
			min_confirmations: 1,
			timeout: Duration::from_secs(300),
		}
	}
}

/// Read-only view of pending orders on the ledger.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait LedgerReader: Send + Sync {
	/// Reads a single order, returning [`LedgerError::NotFound`] when absent.
	async fn get_pending_order(&self, order_id: u64) -> Result<PendingOrder, LedgerError>;

	/// Reads every pending order in ledger order.
	async fn get_all_pending_orders(&self) -> Result<Vec<PendingOrder>, LedgerError>;
}

/// State-changing access to the ledger.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait LedgerWriter: Send + Sync {
	/// Submits `executePendingOrder(order_id, proof)` and blocks until the
	/// transaction is confirmed. A reverted transaction is an error.
	async fn execute_order(
		&self,
		order_id: u64,
		proof: &Proof,
	) -> Result<TransactionReceipt, LedgerError>;
}

/// Type alias for ledger factory functions.
///
/// Receives the implementation's TOML section, the signing key, and the
/// confirmation policy from the `[ledger]` section.
pub type LedgerFactory =
	fn(&toml::Value, &SecretString, &ConfirmationPolicy) -> Result<LedgerService, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Service giving the orchestrator both halves of ledger access.
#[derive(Clone)]
pub struct LedgerService {
	reader: Arc<dyn LedgerReader>,
	writer: Arc<dyn LedgerWriter>,
}

impl LedgerService {
	pub fn new(reader: Arc<dyn LedgerReader>, writer: Arc<dyn LedgerWriter>) -> Self {
		Self { reader, writer }
	}

	/// Builds a service from one implementation serving both roles.
	pub fn from_shared<T>(ledger: Arc<T>) -> Self
	where
		T: LedgerReader + LedgerWriter + 'static,
	{
		Self {
			reader: ledger.clone(),
			writer: ledger,
		}
	}

	pub async fn get_pending_order(&self, order_id: u64) -> Result<PendingOrder, LedgerError> {
		self.reader.get_pending_order(order_id).await
	}

	pub async fn get_all_pending_orders(&self) -> Result<Vec<PendingOrder>, LedgerError> {
		let orders = self.reader.get_all_pending_orders().await?;
		tracing::debug!(count = orders.len(), "Read pending orders");
		Ok(orders)
	}

	pub async fn execute_order(
		&self,
		order_id: u64,
		proof: &Proof,
	) -> Result<TransactionReceipt, LedgerError> {
		self.writer.execute_order(order_id, proof).await
	}
}

/// Converts a ledger integer into `u64`, naming the field on overflow.
pub(crate) fn to_u64(value: U256, field: &str) -> Result<u64, LedgerError> {
	u64::try_from(value).map_err(|_| {
		LedgerError::MalformedResponse(format!("{} value {} does not fit in u64", field, value))
	})
}

/// Zips the three parallel arrays returned by `getAllPendingOrders` by
/// position. Arrays of different lengths make the whole response unusable.
pub fn zip_pending_orders(
	order_ids: Vec<U256>,
	owners: Vec<Address>,
	asset_indexes: Vec<U256>,
) -> Result<Vec<PendingOrder>, LedgerError> {
	if order_ids.len() != owners.len() || order_ids.len() != asset_indexes.len() {
		return Err(LedgerError::MalformedResponse(format!(
			"pending order arrays differ in length: {} ids, {} owners, {} indexes",
			order_ids.len(),
			owners.len(),
			asset_indexes.len()
		)));
	}

	order_ids
		.into_iter()
		.zip(owners)
		.zip(asset_indexes)
		.map(|((order_id, owner), index)| {
			Ok(PendingOrder {
				order_id: to_u64(order_id, "orderId")?,
				proof_source_index: to_u64(index, "assetIndex")?,
				owner,
			})
		})
		.collect()
}
