//! Main entry point for the proof relayer service.
//!
//! Loads the configuration, builds the relay engine from the registered
//! account, oracle and ledger implementations, and serves the HTTP API.
//! With the API disabled the binary runs a single batch pass and exits.

use clap::Parser;
use relayer_config::Config;
use relayer_core::{RelayEngine, RelayerBuilder, RelayerFactories};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the relayer service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// A missing .env file is not an error
	dotenvy::dotenv().ok();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started relayer");

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.relayer.id);

	let relayer = Arc::new(build_relayer(config.clone()).await?);

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => server::start_server(api_config, relayer).await?,
		None => {
			tracing::info!("API disabled, running a single batch pass");
			let result = relayer.execute_all().await?;
			tracing::info!(
				succeeded = result.succeeded(),
				failed = result.failed(),
				"Finished batch pass"
			);
		},
	}

	tracing::info!("Stopped relayer");
	Ok(())
}

/// Collects a crate's registered implementations into a factory map.
fn factory_map<F>(implementations: Vec<(&'static str, F)>) -> HashMap<String, F> {
	implementations
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

/// Builds the relay engine with every registered implementation available.
async fn build_relayer(config: Config) -> Result<RelayEngine, Box<dyn std::error::Error>> {
	let factories = RelayerFactories {
		account_factories: factory_map(relayer_account::get_all_implementations()),
		oracle_factories: factory_map(relayer_oracle::get_all_implementations()),
		ledger_factories: factory_map(relayer_ledger::get_all_implementations()),
	};

	Ok(RelayerBuilder::new(config).build(factories).await?)
}
