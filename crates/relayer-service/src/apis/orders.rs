//! Read-only views of the ledger's pending orders.

use crate::server::AppState;
use axum::{
	extract::{Path, State},
	Json,
};
use relayer_types::{APIError, PendingOrder, PendingOrdersResponse};

/// Handles GET /orders requests.
pub async fn handle_list_orders(
	State(state): State<AppState>,
) -> Result<Json<PendingOrdersResponse>, APIError> {
	let orders = state.relayer.list_pending_orders().await.map_err(|e| {
		tracing::warn!("Listing pending orders failed: {}", e);
		APIError::from(e)
	})?;

	Ok(Json(PendingOrdersResponse { orders }))
}

/// Handles GET /orders/{id} requests.
pub async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<PendingOrder>, APIError> {
	let order_id: u64 = id.parse().map_err(|_| APIError::BadRequest {
		error_type: "VALIDATION_ERROR".to_string(),
		message: format!("Order ID must be an unsigned integer: {}", id),
	})?;

	let order = state.relayer.get_pending_order(order_id).await.map_err(|e| {
		tracing::warn!(order_id, "Order retrieval failed: {}", e);
		APIError::from(e)
	})?;

	Ok(Json(order))
}
