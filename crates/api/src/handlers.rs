//! Request handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solpay_domain::{Address, TransferReceipt};
use solpay_execution::lifecycle::AggregateStats;
use tracing::info;

/// Health report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: &'static str,
    /// Configured RPC endpoints.
    pub endpoints: usize,
    /// Whether a signer is connected.
    pub wallet_connected: bool,
    /// Seconds since start.
    pub uptime_secs: i64,
    /// Submission counts.
    pub submissions: AggregateStats,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = &state.engine;
    Json(HealthResponse {
        status: "ok",
        endpoints: engine.config().endpoints.len(),
        wallet_connected: engine.bridge().connected_address().is_some(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
        submissions: engine.tracker().get_aggregate_stats().await,
    })
}

/// Query for `GET /balance`.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Account to read; defaults to the treasury or signer.
    pub address: Option<String>,
}

/// Balance report.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account read.
    pub address: Address,
    /// Balance in minor units.
    pub lamports: u64,
    /// Balance in major units.
    pub sol: Decimal,
}

/// `GET /balance`
pub async fn balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = match query.address {
        Some(raw) => Address::validate(&raw)?,
        None => state.default_account.ok_or_else(|| {
            ApiError::BadRequest("no address given and no default account".into())
        })?,
    };

    let lamports = state.engine.balance(&address).await?;
    Ok(Json(BalanceResponse {
        address,
        lamports: lamports.raw(),
        sol: lamports.to_major(state.engine.unit_scale()).normalize(),
    }))
}

/// Body of `POST /transfers`.
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    /// Recipient address.
    pub recipient: String,
    /// Amount in major units.
    pub amount: Decimal,
}

/// `POST /transfers`
///
/// Answers 200 with a confirmed receipt, or 202 when the transfer was
/// broadcast but its confirmation was not observed.
pub async fn submit_transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<(StatusCode, Json<TransferReceipt>), ApiError> {
    info!(recipient = %body.recipient, amount = %body.amount, "Transfer requested");

    let receipt = state
        .engine
        .submit_transfer(&body.recipient, body.amount)
        .await?;

    let status = if receipt.confirmed {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(receipt)))
}
