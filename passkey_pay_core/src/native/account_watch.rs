// Websocket account watch: pushes lamport changes for one address into the
// balance store so the UI sees transfers land without polling.

use crate::balance_service::BalanceService;
use crate::error::CoreError;
use futures_util::{stream::StreamExt, SinkExt};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Subscribe to account change notifications for `address` and record each
/// observed lamport balance. Runs until the task is aborted; reconnects on
/// stream errors.
pub async fn run_account_watch(
    ws_url: &str,
    address: &str,
    commitment: &str,
    balances: Arc<BalanceService>,
) -> Result<(), CoreError> {
    // ---------- outer re-connect loop ----------
    loop {
        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| CoreError::WebSocket(format!("connect to {} failed: {}", ws_url, e)))?;
        let (mut write, mut read) = ws_stream.split();

        info!("WSS {} connected, subscribing to {}", ws_url, address);
        write
            .send(Message::Text(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "accountSubscribe",
                    "params": [ address, { "commitment": commitment, "encoding": "base64" } ]
                })
                .to_string(),
            ))
            .await
            .map_err(|e| CoreError::WebSocket(format!("subscribe failed: {}", e)))?;

        // ---------- inner event loop ----------
        loop {
            let msg = match read.next().await {
                Some(Ok(m)) => m,
                Some(Err(e)) => {
                    error!("WS read error: {}", e);
                    break;
                }
                None => {
                    error!("WS stream ended");
                    break;
                }
            };

            let text = match msg {
                Message::Text(t) => t,
                Message::Ping(payload) => {
                    let _ = write.send(Message::Pong(payload)).await;
                    continue;
                }
                Message::Close(_) => {
                    warn!("WS close frame");
                    break;
                }
                _ => continue,
            };

            let value: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    debug!("JSON parse error: {}", e);
                    continue;
                }
            };

            // ---- subscription response ----
            if let Some(result) = value.get("result") {
                if value.get("id").and_then(|v| v.as_i64()) == Some(1) {
                    debug!("Subscription confirmed: sub_id={:?}", result.as_u64());
                    continue;
                }
            }

            // ---- account notification ----
            let lamports = value
                .get("params")
                .and_then(|p| p.get("result"))
                .and_then(|r| r.get("value"))
                .and_then(|v| v.get("lamports"))
                .and_then(|l| l.as_u64());
            if let Some(lamports) = lamports {
                debug!("Account {} changed: {} lamports", address, lamports);
                balances.record_observation(address, lamports);
            }
        }

        warn!(
            "WSS {} disconnected, reconnecting in {:?}",
            ws_url, RECONNECT_DELAY
        );
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
