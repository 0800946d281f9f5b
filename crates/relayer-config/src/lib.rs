//! Configuration module for the proof relayer.
//!
//! Configuration is a single TOML file read once at startup. Any
//! `${VAR_NAME}` or `${VAR_NAME:-default}` placeholder is replaced with the
//! environment value before parsing, which is how the RPC endpoint, signing
//! key, contract address and listening port reach the process.
//!
//! Account, oracle and ledger sections follow the same layout: a `primary`
//! implementation name plus an `implementations` table holding the raw TOML
//! for each implementation. Those raw tables are validated by the
//! implementation's own schema when it is constructed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this relayer instance.
	pub relayer: RelayerConfig,
	/// Signing credential used for every submission.
	pub account: AccountConfig,
	/// Proof oracle client.
	pub oracle: OracleConfig,
	/// Ledger contract access and confirmation policy.
	pub ledger: LedgerConfig,
	/// Orchestrator behaviour switches.
	#[serde(default)]
	pub execution: ExecutionConfig,
	/// HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the relayer instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayerConfig {
	/// Unique identifier for this relayer, included in startup logs.
	pub id: String,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the proof oracle client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of oracle implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for ledger reads and writes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of ledger implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Confirmations required before a submission counts as confirmed.
	#[serde(default = "default_min_confirmations")]
	pub min_confirmations: u64,
	/// Upper bound on the wait for confirmation of one submission.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

fn default_min_confirmations() -> u64 {
	1
}

fn default_confirmation_timeout_seconds() -> u64 {
	300
}

/// Switches controlling the single-order flow.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecutionConfig {
	/// Read the order from the ledger before fetching its proof. A missing
	/// order fails the request with "not found". Batch mode never validates.
	#[serde(default)]
	pub validate_before_execute: bool,
	/// Let a caller-supplied proof index win over the ledger's value when
	/// both are known. Intended for testing against a live oracle.
	#[serde(default)]
	pub allow_index_override: bool,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Longest confirmation wait accepted, in seconds.
const MAX_CONFIRMATION_TIMEOUT_SECONDS: u64 = 3600;

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable
/// `VAR_NAME`; `${VAR_NAME:-default}` falls back to `default` when unset.
/// Input is limited to 1MB to keep the regex scan bounded.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}

	result.push_str(&input[last_end..]);
	Ok(result)
}

/// Checks that `primary` names one of the configured implementations.
fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file, resolving environment placeholders.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.relayer.id.is_empty() {
			return Err(ConfigError::Validation("Relayer ID cannot be empty".into()));
		}

		validate_primary(
			"account",
			&self.account.primary,
			&self.account.implementations,
		)?;
		validate_primary("oracle", &self.oracle.primary, &self.oracle.implementations)?;
		validate_primary("ledger", &self.ledger.primary, &self.ledger.implementations)?;

		if self.ledger.min_confirmations == 0 {
			return Err(ConfigError::Validation(
				"Ledger min_confirmations must be at least 1".into(),
			));
		}
		if self.ledger.confirmation_timeout_seconds == 0
			|| self.ledger.confirmation_timeout_seconds > MAX_CONFIRMATION_TIMEOUT_SECONDS
		{
			return Err(ConfigError::Validation(format!(
				"Ledger confirmation_timeout_seconds must be between 1 and {}",
				MAX_CONFIRMATION_TIMEOUT_SECONDS
			)));
		}

		if let Some(api) = &self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation("API port cannot be 0".into()));
			}
		}

		Ok(())
	}
}

/// Parses TOML with environment resolution followed by validation.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE_CONFIG: &str = r#"
[relayer]
id = "test-relayer"

[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[oracle]
primary = "http"
[oracle.implementations.http]
url = "http://localhost:8080/proof"

[ledger]
primary = "evm_alloy"
[ledger.implementations.evm_alloy]
rpc_url = "http://localhost:8545"
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("RELAYER_TEST_HOST", "localhost");
		std::env::set_var("RELAYER_TEST_PORT", "8545");

		let input = "url = \"http://${RELAYER_TEST_HOST}:${RELAYER_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("RELAYER_TEST_HOST");
		std::env::remove_var("RELAYER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "port = ${RELAYER_MISSING_PORT:-3000}";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "port = 3000");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "private_key = \"${RELAYER_MISSING_KEY}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("RELAYER_MISSING_KEY"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = BASE_CONFIG.parse().unwrap();

		assert_eq!(config.relayer.id, "test-relayer");
		assert_eq!(config.ledger.min_confirmations, 1);
		assert_eq!(config.ledger.confirmation_timeout_seconds, 300);
		assert!(!config.execution.validate_before_execute);
		assert!(!config.execution.allow_index_override);
		assert!(config.api.is_none());
	}

	#[test]
	fn test_api_and_execution_sections() {
		std::env::set_var("RELAYER_TEST_API_PORT", "4100");
		let config_str = format!(
			r#"{}
[execution]
validate_before_execute = true

[api]
host = "0.0.0.0"
port = ${{RELAYER_TEST_API_PORT}}
"#,
			BASE_CONFIG
		);

		let config: Config = config_str.parse().unwrap();
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "0.0.0.0");
		assert_eq!(api.port, 4100);
		assert!(config.execution.validate_before_execute);

		std::env::remove_var("RELAYER_TEST_API_PORT");
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = BASE_CONFIG.replace("primary = \"http\"", "primary = \"grpc\"");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary oracle 'grpc'"));
	}

	#[test]
	fn test_zero_confirmations_rejected() {
		let config_str = BASE_CONFIG.replace(
			"primary = \"evm_alloy\"",
			"primary = \"evm_alloy\"\nmin_confirmations = 0",
		);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("min_confirmations"));
	}

	#[test]
	fn test_timeout_out_of_range_rejected() {
		let config_str = BASE_CONFIG.replace(
			"primary = \"evm_alloy\"",
			"primary = \"evm_alloy\"\nconfirmation_timeout_seconds = 7200",
		);
		assert!(matches!(
			config_str.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("relayer.toml");
		std::fs::write(&path, BASE_CONFIG).unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.oracle.primary, "http");
		assert!(config.ledger.implementations.contains_key("evm_alloy"));
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let result = Config::from_file("/nonexistent/relayer.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
