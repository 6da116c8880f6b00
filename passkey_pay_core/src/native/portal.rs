// Fee-sponsorship submission endpoint ("paymaster") HTTP client

use crate::error::CoreError;
use log::{debug, info};
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the paymaster submission endpoint. Takes a fully signed,
/// base64-encoded transaction and returns the confirmation signature.
pub struct PortalSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PortalSender {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Paymaster(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Submit a signed transaction through the sponsor, returning its
    /// signature. Endpoint errors are surfaced verbatim so the caller can
    /// classify them.
    pub async fn sponsor_and_send(
        &self,
        transaction_base64: &str,
        commitment: &str,
    ) -> Result<String, CoreError> {
        let mut endpoint = self.endpoint.clone();
        if let Some(api_key) = &self.api_key {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            endpoint = format!("{}{}api-key={}", endpoint, separator, api_key);
        }

        info!("Submitting sponsored transaction to {}", self.endpoint);
        let response = self
            .client
            .post(&endpoint)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": "1",
                "method": "sendTransaction",
                "params": [
                    transaction_base64,
                    {
                        "encoding": "base64",
                        "preflightCommitment": commitment,
                    }
                ]
            }))
            .send()
            .await
            .map_err(|e| CoreError::Paymaster(format!("paymaster request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::Paymaster(format!("paymaster returned invalid JSON: {}", e)))?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.to_string());
            return Err(CoreError::Paymaster(message));
        }
        if !status.is_success() {
            return Err(CoreError::Paymaster(format!(
                "paymaster returned HTTP {}: {}",
                status, body
            )));
        }

        let signature = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| {
                CoreError::Paymaster(format!("paymaster response missing signature: {}", body))
            })?;

        debug!("Sponsored transaction accepted: {}", signature);
        Ok(signature.to_string())
    }
}
