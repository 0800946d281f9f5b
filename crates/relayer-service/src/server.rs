//! HTTP server for the relayer API.

use axum::{
	routing::{get, post},
	Router,
};
use relayer_config::ApiConfig;
use relayer_core::RelayEngine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub relayer: Arc<RelayEngine>,
}

/// Builds the API router.
pub fn router(relayer: Arc<RelayEngine>) -> Router {
	Router::new()
		.route("/run", post(crate::apis::run::handle_run))
		.route("/execute-all", get(crate::apis::run::handle_execute_all))
		.route("/orders", get(crate::apis::orders::handle_list_orders))
		.route("/orders/{id}", get(crate::apis::orders::handle_get_order))
		.route("/health", get(crate::apis::handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(AppState { relayer })
}

/// Binds the configured address and serves until the process stops.
pub async fn start_server(
	api_config: ApiConfig,
	relayer: Arc<RelayEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(relayer);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Relayer API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
