//! Alloy-based ledger implementation.
//!
//! Binds the pending-order contract with `sol!`, reads orders through
//! `eth_call`, and sends execution transactions through a wallet-backed
//! provider built from the relayer account's key.

use crate::{
	to_u64, zip_pending_orders, ConfirmationPolicy, LedgerError, LedgerFactory, LedgerReader,
	LedgerRegistry, LedgerService, LedgerWriter,
};
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::transports::RpcError;
use async_trait::async_trait;
use relayer_types::{
	http_url, ConfigSchema, Field, FieldType, ImplementationRegistry, PendingOrder, Proof, Schema,
	SecretString, TransactionHash, TransactionReceipt, ValidationError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

sol! {
	/// Pending-order book contract driven by the relayer.
	#[sol(rpc)]
	interface IPendingOrderBook {
		function executePendingOrder(uint256 orderId, bytes proof) external;

		function getPendingOrder(uint256 orderId)
			external
			view
			returns (uint256 id, uint256 assetIndex, address user);

		function getAllPendingOrders()
			external
			view
			returns (uint256[] memory orderIds, address[] memory users, uint256[] memory assetIndexes);
	}
}

/// Default provider polling interval while waiting for receipts.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// JSON-RPC error code nodes use for a reverted `eth_call`.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Ledger backed by an Alloy HTTP provider with a local wallet.
pub struct AlloyLedger {
	contract: IPendingOrderBook::IPendingOrderBookInstance<DynProvider>,
	policy: ConfirmationPolicy,
	/// Held from send until confirmation so one signer never has two
	/// transactions in flight.
	submission_lock: Mutex<()>,
}

impl AlloyLedger {
	/// Creates a ledger client for the contract at `contract_address`.
	pub fn new(
		rpc_url: &str,
		contract_address: Address,
		signer: PrivateKeySigner,
		policy: ConfirmationPolicy,
		poll_interval: Duration,
	) -> Result<Self, LedgerError> {
		let url: reqwest::Url = rpc_url
			.parse()
			.map_err(|e| LedgerError::Configuration(format!("Invalid RPC URL: {}", e)))?;

		let provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer))
			.connect_http(url);
		provider.client().set_poll_interval(poll_interval);

		Ok(Self::with_provider(contract_address, provider.erased(), policy))
	}

	/// Binds the contract on an already built provider.
	pub fn with_provider(
		contract_address: Address,
		provider: DynProvider,
		policy: ConfirmationPolicy,
	) -> Self {
		Self {
			contract: IPendingOrderBook::new(contract_address, provider),
			policy,
			submission_lock: Mutex::new(()),
		}
	}

	/// Address of the bound contract.
	pub fn contract_address(&self) -> &Address {
		self.contract.address()
	}
}

/// Whether the node answered a lookup with a revert, as opposed to the
/// request failing in transport.
///
/// Reverts carrying data are caught by `as_revert_data`. A bare `revert()`
/// has no data, so the error response's code and message are checked too.
fn is_revert(err: &alloy::contract::Error) -> bool {
	if err.as_revert_data().is_some() {
		return true;
	}
	match err {
		alloy::contract::Error::TransportError(RpcError::ErrorResp(payload)) => {
			payload.code == EXECUTION_REVERTED_CODE
				|| payload.message.contains("execution reverted")
		},
		_ => false,
	}
}

#[async_trait]
impl LedgerReader for AlloyLedger {
	async fn get_pending_order(&self, order_id: u64) -> Result<PendingOrder, LedgerError> {
		let order = match self
			.contract
			.getPendingOrder(U256::from(order_id))
			.call()
			.await
		{
			Ok(order) => order,
			Err(e) if is_revert(&e) => {
				tracing::debug!(order_id, error = %e, "Pending order lookup reverted");
				return Err(LedgerError::NotFound(order_id));
			},
			Err(e) => return Err(LedgerError::Read(e.to_string())),
		};

		// Unset storage slots come back zeroed rather than reverting.
		if order.user == Address::ZERO {
			return Err(LedgerError::NotFound(order_id));
		}

		Ok(PendingOrder {
			order_id: to_u64(order.id, "orderId")?,
			proof_source_index: to_u64(order.assetIndex, "assetIndex")?,
			owner: order.user,
		})
	}

	async fn get_all_pending_orders(&self) -> Result<Vec<PendingOrder>, LedgerError> {
		let response = self
			.contract
			.getAllPendingOrders()
			.call()
			.await
			.map_err(|e| LedgerError::Read(e.to_string()))?;

		zip_pending_orders(response.orderIds, response.users, response.assetIndexes)
	}
}

#[async_trait]
impl LedgerWriter for AlloyLedger {
	async fn execute_order(
		&self,
		order_id: u64,
		proof: &Proof,
	) -> Result<TransactionReceipt, LedgerError> {
		let _guard = self.submission_lock.lock().await;

		let pending = self
			.contract
			.executePendingOrder(U256::from(order_id), Bytes::copy_from_slice(proof.as_bytes()))
			.send()
			.await
			.map_err(|e| LedgerError::Submission(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(
			stage = "submit",
			outcome = "success",
			order_id,
			tx_hash = %tx_hash,
			"Submitted transaction"
		);

		let receipt = pending
			.with_required_confirmations(self.policy.min_confirmations)
			.with_timeout(Some(self.policy.timeout))
			.get_receipt()
			.await
			.map_err(|e| {
				LedgerError::Submission(format!(
					"Failed to confirm transaction {}: {}",
					tx_hash, e
				))
			})?;

		if !ReceiptResponse::status(&receipt) {
			return Err(LedgerError::Submission(format!(
				"Transaction {} reverted",
				tx_hash
			)));
		}

		Ok(TransactionReceipt {
			hash: TransactionHash(ReceiptResponse::transaction_hash(&receipt).to_vec()),
			block_number: ReceiptResponse::block_number(&receipt).unwrap_or(0),
			success: true,
		})
	}
}

/// Configuration schema for the Alloy ledger.
pub struct AlloyLedgerSchema;

impl ConfigSchema for AlloyLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(http_url),
				Field::new("contract_address", FieldType::String).with_validator(|value| {
					value
						.as_str()
						.unwrap_or_default()
						.parse::<Address>()
						.map(|_| ())
						.map_err(|e| format!("invalid address: {}", e))
				}),
			],
			vec![Field::new(
				"poll_interval_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(60),
				},
			)],
		);

		schema.validate(config)
	}
}

/// Factory function to create the Alloy ledger from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP(S) RPC endpoint (required)
/// - `contract_address`: pending-order contract (required)
/// - `poll_interval_seconds`: receipt polling interval (optional, default 2)
pub fn create_ledger(
	config: &toml::Value,
	private_key: &SecretString,
	policy: &ConfirmationPolicy,
) -> Result<LedgerService, LedgerError> {
	AlloyLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LedgerError::Configuration("rpc_url is required".to_string()))?;

	let contract_address: Address = config
		.get("contract_address")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LedgerError::Configuration("contract_address is required".to_string()))?
		.parse()
		.map_err(|e| LedgerError::Configuration(format!("Invalid contract address: {}", e)))?;

	let poll_interval = config
		.get("poll_interval_seconds")
		.and_then(|v| v.as_integer())
		.map(|secs| secs as u64)
		.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

	let signer: PrivateKeySigner = private_key.with_exposed(|key| {
		key.parse()
			.map_err(|_| LedgerError::Configuration("Invalid private key format".to_string()))
	})?;

	let ledger = AlloyLedger::new(
		rpc_url,
		contract_address,
		signer,
		*policy,
		Duration::from_secs(poll_interval),
	)?;

	tracing::info!(
		contract = %ledger.contract_address(),
		min_confirmations = policy.min_confirmations,
		timeout_secs = policy.timeout.as_secs(),
		"Ledger client ready"
	);

	Ok(LedgerService::from_shared(Arc::new(ledger)))
}

/// Registry for the Alloy ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl LedgerRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::rpc::json_rpc::ErrorPayload;
	use alloy::sol_types::SolValue;
	use alloy::transports::mock::Asserter;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn config(toml_str: &str) -> toml::Value {
		toml::from_str(toml_str).unwrap()
	}

	#[tokio::test]
	async fn test_create_ledger_from_config() {
		let cfg = config(
			r#"
rpc_url = "http://localhost:8545"
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
poll_interval_seconds = 1
"#,
		);

		let result = create_ledger(&cfg, &SecretString::from(KEY), &ConfirmationPolicy::default());
		assert!(result.is_ok());
	}

	#[test]
	fn test_schema_rejects_bad_address() {
		let cfg = config(
			r#"
rpc_url = "http://localhost:8545"
contract_address = "0x1234"
"#,
		);
		let err = AlloyLedgerSchema.validate(&cfg).unwrap_err();
		assert!(err.to_string().contains("contract_address"));
	}

	#[test]
	fn test_schema_requires_rpc_url() {
		let cfg = config(r#"contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3""#);
		assert!(matches!(
			AlloyLedgerSchema.validate(&cfg),
			Err(ValidationError::MissingField(_))
		));
	}

	#[test]
	fn test_invalid_private_key() {
		let cfg = config(
			r#"
rpc_url = "http://localhost:8545"
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
"#,
		);
		let result = create_ledger(&cfg, &SecretString::from("0xnope"), &ConfirmationPolicy::default());
		assert!(matches!(result, Err(LedgerError::Configuration(_))));
	}

	fn mocked_ledger() -> (AlloyLedger, Asserter) {
		let asserter = Asserter::new();
		let provider = ProviderBuilder::new()
			.connect_mocked_client(asserter.clone())
			.erased();
		let ledger = AlloyLedger::with_provider(
			Address::repeat_byte(0x5f),
			provider,
			ConfirmationPolicy::default(),
		);
		(ledger, asserter)
	}

	#[tokio::test]
	async fn test_get_pending_order_decodes() {
		let (ledger, asserter) = mocked_ledger();
		let owner = Address::repeat_byte(0x22);
		asserter.push_success(&Bytes::from(
			(U256::from(42u64), U256::from(7u64), owner).abi_encode_params(),
		));

		let order = ledger.get_pending_order(42).await.unwrap();
		assert_eq!(order.order_id, 42);
		assert_eq!(order.proof_source_index, 7);
		assert_eq!(order.owner, owner);
	}

	#[tokio::test]
	async fn test_reverted_lookup_is_not_found() {
		let (ledger, asserter) = mocked_ledger();
		asserter.push_failure(ErrorPayload {
			code: EXECUTION_REVERTED_CODE,
			message: "execution reverted: order does not exist".into(),
			data: None,
		});
		// A bare revert() surfaces as a generic server error.
		asserter.push_failure_msg("execution reverted");

		assert!(matches!(
			ledger.get_pending_order(9).await,
			Err(LedgerError::NotFound(9))
		));
		assert!(matches!(
			ledger.get_pending_order(10).await,
			Err(LedgerError::NotFound(10))
		));
	}

	#[tokio::test]
	async fn test_zero_owner_is_not_found() {
		let (ledger, asserter) = mocked_ledger();
		asserter.push_success(&Bytes::from(
			(U256::ZERO, U256::ZERO, Address::ZERO).abi_encode_params(),
		));

		assert!(matches!(
			ledger.get_pending_order(3).await,
			Err(LedgerError::NotFound(3))
		));
	}

	#[tokio::test]
	async fn test_transport_error_is_read_error() {
		let (ledger, asserter) = mocked_ledger();
		asserter.push_failure_msg("header not found");

		assert!(matches!(
			ledger.get_pending_order(4).await,
			Err(LedgerError::Read(_))
		));
		// Nothing queued: the request fails before reaching a node.
		assert!(matches!(
			ledger.get_pending_order(4).await,
			Err(LedgerError::Read(_))
		));
	}

	#[tokio::test]
	async fn test_get_all_pending_orders_length_mismatch() {
		let (ledger, asserter) = mocked_ledger();
		let ids = vec![U256::from(1u64), U256::from(2u64)];
		let users = vec![Address::repeat_byte(0x01), Address::repeat_byte(0x02)];
		let indexes = vec![U256::from(10u64)];
		asserter.push_success(&Bytes::from((ids, users, indexes).abi_encode_params()));

		assert!(matches!(
			ledger.get_all_pending_orders().await,
			Err(LedgerError::MalformedResponse(_))
		));
	}
}
