//! Builder for constructing the relay engine.
//!
//! Each component section of the configuration names a `primary`
//! implementation; the builder looks that name up in the matching factory
//! map and constructs it from its raw TOML table.

use crate::engine::RelayEngine;
use relayer_account::{AccountError, AccountInterface, AccountService};
use relayer_config::Config;
use relayer_ledger::{ConfirmationPolicy, LedgerError, LedgerService};
use relayer_oracle::{OracleError, OracleInterface, OracleService};
use relayer_types::{ConfigSchema, SecretString};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory maps for every pluggable component, keyed by implementation name.
pub struct RelayerFactories<AF, OF, LF> {
	pub account_factories: HashMap<String, AF>,
	pub oracle_factories: HashMap<String, OF>,
	pub ledger_factories: HashMap<String, LF>,
}

/// Builder for constructing a [`RelayEngine`] from configuration.
pub struct RelayerBuilder {
	config: Config,
}

/// Finds the primary implementation's TOML table and its factory.
fn select_primary<'a, F>(
	component: &str,
	primary: &str,
	implementations: &'a HashMap<String, toml::Value>,
	factories: &'a HashMap<String, F>,
) -> Result<(&'a toml::Value, &'a F), BuilderError> {
	let config = implementations.get(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' has no configuration",
			component, primary
		))
	})?;
	let factory = factories.get(primary).ok_or_else(|| {
		BuilderError::MissingComponent(format!(
			"no {} implementation named '{}' is registered",
			component, primary
		))
	})?;
	Ok((config, factory))
}

/// Logs and wraps a schema rejection of an implementation's own table.
fn schema_rejected(component: &str, name: &str, error: impl std::fmt::Display) -> BuilderError {
	tracing::error!(
		component,
		implementation = %name,
		error = %error,
		"Invalid configuration for implementation"
	);
	BuilderError::Config(format!(
		"Invalid {} configuration for '{}': {}",
		component, name, error
	))
}

/// Logs and wraps a factory failure.
fn factory_failed(component: &str, name: &str, error: impl std::fmt::Display) -> BuilderError {
	tracing::error!(
		component,
		implementation = %name,
		error = %error,
		"Failed to create implementation"
	);
	BuilderError::Config(format!(
		"Failed to create {} implementation '{}': {}",
		component, name, error
	))
}

impl RelayerBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine from the primary implementation of each component.
	pub async fn build<AF, OF, LF>(
		self,
		factories: RelayerFactories<AF, OF, LF>,
	) -> Result<RelayEngine, BuilderError>
	where
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
		OF: Fn(&toml::Value) -> Result<Box<dyn OracleInterface>, OracleError>,
		LF: Fn(&toml::Value, &SecretString, &ConfirmationPolicy) -> Result<LedgerService, LedgerError>,
	{
		let account_cfg = &self.config.account;
		let (config, factory) = select_primary(
			"account",
			&account_cfg.primary,
			&account_cfg.implementations,
			&factories.account_factories,
		)?;
		let account =
			factory(config).map_err(|e| factory_failed("account", &account_cfg.primary, e))?;
		account
			.config_schema()
			.validate(config)
			.map_err(|e| schema_rejected("account", &account_cfg.primary, e))?;
		let account = AccountService::new(account);
		tracing::info!(component = "account", implementation = %account_cfg.primary, "Loaded");

		let relayer_address = account
			.signer_address()
			.await
			.map_err(|e| BuilderError::Config(format!("Failed to get relayer address: {}", e)))?;

		let oracle_cfg = &self.config.oracle;
		let (config, factory) = select_primary(
			"oracle",
			&oracle_cfg.primary,
			&oracle_cfg.implementations,
			&factories.oracle_factories,
		)?;
		let oracle =
			factory(config).map_err(|e| factory_failed("oracle", &oracle_cfg.primary, e))?;
		oracle
			.config_schema()
			.validate(config)
			.map_err(|e| schema_rejected("oracle", &oracle_cfg.primary, e))?;
		let oracle = OracleService::new(oracle);
		tracing::info!(component = "oracle", implementation = %oracle_cfg.primary, "Loaded");

		let ledger_cfg = &self.config.ledger;
		let policy = ConfirmationPolicy {
			min_confirmations: ledger_cfg.min_confirmations,
			timeout: Duration::from_secs(ledger_cfg.confirmation_timeout_seconds),
		};
		let (config, factory) = select_primary(
			"ledger",
			&ledger_cfg.primary,
			&ledger_cfg.implementations,
			&factories.ledger_factories,
		)?;
		let ledger = factory(config, &account.signing_key(), &policy)
			.map_err(|e| factory_failed("ledger", &ledger_cfg.primary, e))?;
		tracing::info!(component = "ledger", implementation = %ledger_cfg.primary, "Loaded");

		tracing::info!(
			relayer_id = %self.config.relayer.id,
			relayer_address = %relayer_address,
			validate_before_execute = self.config.execution.validate_before_execute,
			"Relay engine ready"
		);

		Ok(RelayEngine::new(
			oracle,
			ledger,
			self.config.execution.clone(),
		))
	}
}
