//! Proof oracle module for the relayer.
//!
//! The oracle is the external service that issues the proof a ledger order
//! needs before it can be executed. This crate sends one request per call,
//! never retries, and reports every failure mode (unreachable service,
//! non-2xx status, unusable body, missing proof) as an [`OracleError`].

use async_trait::async_trait;
use relayer_types::{ConfigSchema, ImplementationRegistry, Proof};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur while obtaining a proof.
#[derive(Debug, Error)]
pub enum OracleError {
	/// The proof service could not be reached.
	#[error("Oracle request failed: {0}")]
	Network(String),
	/// The proof service answered with a non-success status.
	#[error("Oracle returned HTTP {status}: {body}")]
	Status { status: u16, body: String },
	/// The response body could not be interpreted.
	#[error("Invalid oracle response: {0}")]
	InvalidResponse(String),
	/// The response carried no usable `proof_bytes`.
	#[error("Oracle returned no proof for index {0}")]
	MissingProof(u64),
	/// The implementation could not be built from its configuration.
	#[error("Oracle configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for proof oracles.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait OracleInterface: Send + Sync {
	/// Returns the configuration schema for this oracle implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Requests the proof stored under `index`.
	///
	/// A successful result always carries a non-empty proof.
	async fn fetch_proof(&self, index: u64) -> Result<Proof, OracleError>;
}

/// Type alias for oracle factory functions.
pub type OracleFactory = fn(&toml::Value) -> Result<Box<dyn OracleInterface>, OracleError>;

/// Registry trait for oracle implementations.
pub trait OracleRegistry: ImplementationRegistry<Factory = OracleFactory> {}

/// Get all registered oracle implementations.
pub fn get_all_implementations() -> Vec<(&'static str, OracleFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Service wrapping the configured oracle implementation.
pub struct OracleService {
	implementation: Box<dyn OracleInterface>,
}

impl OracleService {
	pub fn new(implementation: Box<dyn OracleInterface>) -> Self {
		Self { implementation }
	}

	/// Fetches the proof for `index`, logging the proof size on success.
	pub async fn fetch_proof(&self, index: u64) -> Result<Proof, OracleError> {
		let proof = self.implementation.fetch_proof(index).await?;
		tracing::debug!(index, proof_len = proof.len(), "Received proof");
		Ok(proof)
	}
}
