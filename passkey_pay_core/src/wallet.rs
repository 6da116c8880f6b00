// Platform-agnostic wallet capability abstraction
// The production implementation is the passkey wallet SDK (browser portal);
// native builds use a local keypair stand-in for devnet testing.

use crate::error::CoreError;
use async_trait::async_trait;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use serde::{Deserialize, Serialize};

pub type WalletResult<T> = Result<T, CoreError>;

/// Options applied to a single sign-and-send call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Route the transaction through the fee sponsor instead of paying
    /// the network fee from the origin account.
    pub fee_sponsored: bool,
    /// Commitment level to wait for ("processed", "confirmed", "finalized").
    pub commitment: String,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            fee_sponsored: true,
            commitment: "confirmed".to_string(),
        }
    }
}

/// A message signature returned by `sign_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedMessage {
    pub signature: String,
}

/// Abstract wallet capability consumed by the transfer service.
///
/// Mirrors the external SDK surface: connect/disconnect lifecycle, message
/// signing, and one-shot sign-and-send of an instruction list. Credential
/// management and fee sponsorship live behind this seam.
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// The wallet's account address.
    fn address(&self) -> Pubkey;

    /// Establish the wallet session.
    async fn connect(&self) -> WalletResult<()>;

    /// Tear down the wallet session.
    async fn disconnect(&self) -> WalletResult<()>;

    /// Whether the wallet is connected and able to sign.
    async fn is_ready(&self) -> bool;

    /// Sign an arbitrary text message.
    async fn sign_message(&self, message: &str) -> WalletResult<SignedMessage>;

    /// Sign the given instructions as one transaction and submit it,
    /// returning the confirmation signature.
    async fn sign_and_send_transaction(
        &self,
        instructions: Vec<Instruction>,
        options: &TransactionOptions,
    ) -> WalletResult<String>;
}
