// HTTP API surface mirroring the browser demo: health, balance, transfer.

use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use passkey_pay_core::native::KeypairWallet;
use passkey_pay_core::{
    BalanceService, CoreError, RpcClient, Settings, TransactionOptions, TransferOutcome,
    TransferRequest, TransferService, TransferStatus, WalletCapability,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct ApiState {
    pub settings: Settings,
    pub transfers: TransferService,
    pub balances: Arc<BalanceService>,
    pub rpc: Arc<dyn RpcClient>,
    pub wallet: Option<Arc<KeypairWallet>>,
}

type SharedState = Arc<ApiState>;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/balance/:address", get(balance))
        .route("/transfer", post(transfer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: SharedState, port: u16) -> Result<(), AppError> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn into_api_error(err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Busy(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct BalanceQuery {
    #[serde(default)]
    force: bool,
}

#[derive(Serialize)]
struct BalanceResponse {
    address: String,
    lamports: u64,
    sol: f64,
    observed_at: DateTime<Utc>,
}

async fn balance(
    State(state): State<SharedState>,
    Path(address): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    passkey_pay_core::validate_address(&address).map_err(into_api_error)?;
    let snapshot = state
        .balances
        .refresh(&address, query.force, state.rpc.as_ref())
        .await
        .map_err(into_api_error)?;
    Ok(Json(BalanceResponse {
        address,
        lamports: snapshot.lamports,
        sol: snapshot.sol(),
        observed_at: snapshot.observed_at,
    }))
}

#[derive(Deserialize)]
struct TransferBody {
    recipient: String,
    amount_sol: f64,
    max_chunk_sol: Option<f64>,
    fee_sponsored: Option<bool>,
}

#[derive(Serialize)]
struct TransferResponse {
    status: TransferStatus,
    succeeded_chunks: usize,
    total_chunks: usize,
    signatures: Vec<String>,
    failure_reason: Option<String>,
    hint: Option<String>,
}

impl From<TransferOutcome> for TransferResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            status: outcome.status(),
            hint: outcome.failure_category.map(|c| c.hint().to_string()),
            succeeded_chunks: outcome.succeeded_chunks,
            total_chunks: outcome.total_chunks,
            signatures: outcome.signatures,
            failure_reason: outcome.failure_reason,
        }
    }
}

async fn transfer(
    State(state): State<SharedState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<TransferResponse>, ApiError> {
    let wallet = state.wallet.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "No wallet configured on this server".to_string(),
        }),
    ))?;

    let request = TransferRequest::new(
        wallet.address().to_string(),
        body.recipient,
        body.amount_sol,
    );
    let max_chunk = body.max_chunk_sol.unwrap_or(state.settings.max_chunk_sol);
    let options = TransactionOptions {
        fee_sponsored: body.fee_sponsored.unwrap_or(state.settings.fee_sponsored),
        commitment: state.settings.commitment.clone(),
    };

    let outcome = state
        .transfers
        .submit_transfer(&request, max_chunk, wallet.as_ref(), &options, None)
        .await
        .map_err(into_api_error)?;

    if outcome.succeeded_chunks > 0 {
        let handle = state.balances.schedule_reconciliation(
            &request.origin,
            &state.settings.reconcile_delays(),
            state.rpc.clone(),
        );
        // Keep the handle alive until the scheduled refreshes finish
        tokio::spawn(async move { handle.wait().await });
    }

    tracing::info!(
        "transfer to {}: {}/{} chunks, {} SOL",
        request.recipient,
        outcome.succeeded_chunks,
        outcome.total_chunks,
        request.amount_sol,
    );
    Ok(Json(outcome.into()))
}
