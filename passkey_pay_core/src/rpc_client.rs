// RPC client abstraction - narrow read/submit surface over the chain

use crate::error::CoreError;
use async_trait::async_trait;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, CoreError>;

/// Abstract RPC client for the handful of chain operations this system
/// performs. Implementations wrap solana-client natively; tests use mocks.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Get the lamport balance of an account.
    async fn get_balance(&self, pubkey: &str) -> RpcResult<u64>;

    /// Get latest blockhash
    async fn get_latest_blockhash(&self) -> RpcResult<String>;

    /// Send a serialized, signed transaction and wait for confirmation.
    async fn send_transaction(&self, transaction: &[u8]) -> RpcResult<String>;
}
