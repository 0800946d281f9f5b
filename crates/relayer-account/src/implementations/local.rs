//! Local private-key account.
//!
//! Reads a hex private key from configuration and keeps it in a
//! [`SecretString`] for the lifetime of the process.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use relayer_types::{
	with_0x_prefix, Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema,
	SecretString, ValidationError,
};

/// Account backed by a private key held in memory.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	private_key: SecretString,
}

impl LocalWallet {
	/// Parses the key, accepting it with or without the 0x prefix.
	pub fn new(private_key: &str) -> Result<Self, AccountError> {
		let signer: PrivateKeySigner = private_key
			.trim()
			.parse()
			.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))?;

		Ok(Self {
			signer,
			private_key: SecretString::new(with_0x_prefix(private_key.trim())),
		})
	}
}

/// Configuration schema for the local account.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().unwrap_or_default();
					let hex = key.strip_prefix("0x").unwrap_or(key);
					if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
						return Err("private_key must be 32 bytes of hex".to_string());
					}
					Ok(())
				}),
			],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn signer_address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	fn signing_key(&self) -> SecretString {
		self.private_key.clone()
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex-encoded 32-byte key (required)
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema
		.validate(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::Configuration("private_key is required".to_string()))?;

	Ok(Box::new(LocalWallet::new(private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	// First anvil development key.
	const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn config(key: &str) -> toml::Value {
		let mut table = toml::map::Map::new();
		table.insert("private_key".to_string(), toml::Value::String(key.to_string()));
		toml::Value::Table(table)
	}

	#[tokio::test]
	async fn test_address_from_key() {
		let account = create_account(&config(&format!("0x{}", ANVIL_KEY))).unwrap();
		let address = account.signer_address().await.unwrap();

		let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
		assert_eq!(address, expected);
	}

	#[test]
	fn test_key_normalized_with_prefix() {
		let account = create_account(&config(ANVIL_KEY)).unwrap();
		let key = account.signing_key();
		assert!(key.with_exposed(|k| k.starts_with("0x") && k.len() == 66));
	}

	#[test]
	fn test_short_key_fails_schema() {
		let result = create_account(&config("0x1234"));
		assert!(matches!(result, Err(AccountError::Configuration(_))));
	}

	#[test]
	fn test_out_of_range_key_rejected() {
		// Well-formed hex, but zero is not a valid secp256k1 scalar.
		let result = create_account(&config(&"0".repeat(64)));
		assert!(matches!(result, Err(AccountError::InvalidKey(_))));
	}

	#[test]
	fn test_missing_key_rejected() {
		let result = create_account(&toml::Value::Table(toml::map::Map::new()));
		assert!(matches!(result, Err(AccountError::Configuration(_))));
	}
}
