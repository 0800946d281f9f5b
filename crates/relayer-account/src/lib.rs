//! Signing account for the proof relayer.
//!
//! The account is the single identity behind every ledger submission. It is
//! created once at startup and shared read-only; the ledger writer derives
//! its wallet from the key exposed here.

use async_trait::async_trait;
use relayer_types::{Address, ConfigSchema, ImplementationRegistry, SecretString};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

#[derive(Debug, Error)]
pub enum AccountError {
	/// The configured key cannot be parsed as a secp256k1 private key.
	#[error("Invalid signing key: {0}")]
	InvalidKey(String),
	/// The account section does not match the implementation's schema.
	#[error("Account configuration error: {0}")]
	Configuration(String),
}

/// A source of the relayer's signing key.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address that ledger submissions are sent from.
	async fn signer_address(&self) -> Result<Address, AccountError>;

	/// Hex private key, `0x`-prefixed, for building a ledger wallet.
	fn signing_key(&self) -> SecretString;
}

pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Every account implementation the binary can be configured with.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	vec![(
		implementations::local::Registry::NAME,
		implementations::local::Registry::factory(),
	)]
}

/// Holds the configured account for the lifetime of the process.
pub struct AccountService {
	account: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(account: Box<dyn AccountInterface>) -> Self {
		Self { account }
	}

	pub async fn signer_address(&self) -> Result<Address, AccountError> {
		self.account.signer_address().await
	}

	pub fn signing_key(&self) -> SecretString {
		self.account.signing_key()
	}
}
