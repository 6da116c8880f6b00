// Native RPC client implementation wrapping solana_client::RpcClient

use crate::error::CoreError;
use crate::rpc_client::{RpcClient as RpcClientTrait, RpcResult};
use async_trait::async_trait;
use log::debug;
use solana_client::rpc_client::RpcClient as SolanaRpcClient;
use std::sync::Arc;

/// Native RPC client wrapping solana_client::RpcClient
pub struct NativeRpcClient {
    client: Arc<SolanaRpcClient>,
}

impl NativeRpcClient {
    /// Create a new native RPC client
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Arc::new(SolanaRpcClient::new(endpoint)),
        }
    }

    /// Create from existing Arc<RpcClient>
    pub fn from_arc(client: Arc<SolanaRpcClient>) -> Self {
        Self { client }
    }

    /// Get reference to underlying Solana RPC client
    pub fn inner(&self) -> &Arc<SolanaRpcClient> {
        &self.client
    }
}

#[async_trait]
impl RpcClientTrait for NativeRpcClient {
    async fn get_balance(&self, pubkey: &str) -> RpcResult<u64> {
        debug!("Native RPC: get_balance for {}", pubkey);

        use solana_sdk::pubkey::Pubkey;
        use std::str::FromStr;

        let pubkey = Pubkey::from_str(pubkey)
            .map_err(|e| CoreError::ParseError(format!("Invalid pubkey: {}", e)))?;

        let client = self.client.clone();
        tokio::task::spawn_blocking(move || client.get_balance(&pubkey))
            .await
            .map_err(|e| CoreError::Rpc(format!("Task join error: {}", e)))?
            .map_err(|e| CoreError::Rpc(format!("get_balance failed: {}", e)))
    }

    async fn get_latest_blockhash(&self) -> RpcResult<String> {
        debug!("Native RPC: get_latest_blockhash");

        let client = self.client.clone();
        let blockhash = tokio::task::spawn_blocking(move || client.get_latest_blockhash())
            .await
            .map_err(|e| CoreError::Rpc(format!("Task join error: {}", e)))?
            .map_err(|e| CoreError::Rpc(format!("get_latest_blockhash failed: {}", e)))?;

        Ok(blockhash.to_string())
    }

    async fn send_transaction(&self, transaction: &[u8]) -> RpcResult<String> {
        debug!("Native RPC: send_transaction");

        use solana_sdk::transaction::Transaction;

        let tx: Transaction = bincode::deserialize(transaction)
            .map_err(|e| CoreError::ParseError(format!("Failed to deserialize transaction: {}", e)))?;

        let client = self.client.clone();
        let signature = tokio::task::spawn_blocking(move || client.send_and_confirm_transaction(&tx))
            .await
            .map_err(|e| CoreError::Rpc(format!("Task join error: {}", e)))?
            .map_err(|e| CoreError::Wallet(format!("send_transaction failed: {}", e)))?;

        Ok(signature.to_string())
    }
}
