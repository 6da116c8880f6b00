// Keypair-backed wallet capability for native builds.
// Stands in for the browser passkey signer: same surface, local ed25519 key.

use crate::error::CoreError;
use crate::native::portal::PortalSender;
use crate::rpc_client::RpcClient;
use crate::settings::{load_keypair_from_env_var, parse_private_key_string, Settings};
use crate::wallet::{SignedMessage, TransactionOptions, WalletCapability, WalletResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};
use log::debug;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Env var holding a base64-encoded 64-byte keypair, checked when the
/// settings file configures no key material.
pub const WALLET_KEY_ENV_VAR: &str = "PASSKEY_PAY_WALLET_KEY";

pub struct KeypairWallet {
    keypair: Keypair,
    rpc: Arc<dyn RpcClient>,
    portal: Option<Arc<PortalSender>>,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, rpc: Arc<dyn RpcClient>, portal: Option<Arc<PortalSender>>) -> Self {
        Self {
            keypair,
            rpc,
            portal,
            connected: AtomicBool::new(false),
        }
    }

    /// Build a wallet from configured key material: private-key string,
    /// inline JSON keypair, keypair file, then the env var, in that order.
    pub fn from_settings(
        settings: &Settings,
        rpc: Arc<dyn RpcClient>,
        portal: Option<Arc<PortalSender>>,
    ) -> Result<Self, CoreError> {
        let bytes = if let Some(pk_str) = &settings.wallet_private_key_string {
            parse_private_key_string(pk_str).map_err(CoreError::InvalidKeypair)?
        } else if let Some(json) = &settings.wallet_keypair_json {
            serde_json::from_str::<Vec<u8>>(json)?
        } else if let Some(path) = &settings.wallet_keypair_path {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<u8>>(&contents)?
        } else if let Some(bytes) = load_keypair_from_env_var(WALLET_KEY_ENV_VAR) {
            bytes
        } else {
            return Err(CoreError::InvalidKeypair(
                "No wallet key configured (set wallet_private_key_string, \
                 wallet_keypair_json, wallet_keypair_path, or the env var)"
                    .to_string(),
            ));
        };

        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| CoreError::InvalidKeypair(e.to_string()))?;
        Ok(Self::new(keypair, rpc, portal))
    }

    fn signed_transaction(
        &self,
        instructions: &[Instruction],
        blockhash: &str,
    ) -> Result<Transaction, CoreError> {
        let blockhash = Hash::from_str(blockhash)
            .map_err(|e| CoreError::ParseError(format!("Invalid blockhash: {}", e)))?;
        Ok(Transaction::new_signed_with_payer(
            instructions,
            Some(&self.keypair.pubkey()),
            &[&self.keypair],
            blockhash,
        ))
    }
}

#[async_trait]
impl WalletCapability for KeypairWallet {
    fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn connect(&self) -> WalletResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        debug!("Wallet connected: {}", self.address());
        Ok(())
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn sign_message(&self, message: &str) -> WalletResult<SignedMessage> {
        let signature = self.keypair.sign_message(message.as_bytes());
        Ok(SignedMessage {
            signature: signature.to_string(),
        })
    }

    async fn sign_and_send_transaction(
        &self,
        instructions: Vec<Instruction>,
        options: &TransactionOptions,
    ) -> WalletResult<String> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = self.signed_transaction(&instructions, &blockhash)?;
        let serialized = bincode::serialize(&transaction)
            .map_err(|e| CoreError::Wallet(format!("Failed to serialize transaction: {}", e)))?;

        match (&self.portal, options.fee_sponsored) {
            (Some(portal), true) => {
                let encoded = Base64Engine.encode(&serialized);
                portal.sponsor_and_send(&encoded, &options.commitment).await
            }
            _ => self.rpc.send_transaction(&serialized).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_requires_key_material() {
        // Guard against ambient configuration leaking into the test
        std::env::remove_var(WALLET_KEY_ENV_VAR);
        let rpc: Arc<dyn RpcClient> = Arc::new(crate::native::rpc_impl::NativeRpcClient::new(
            "http://localhost:8899".to_string(),
        ));
        let settings = Settings::default();
        assert!(matches!(
            KeypairWallet::from_settings(&settings, rpc, None),
            Err(CoreError::InvalidKeypair(_))
        ));
    }

    #[test]
    fn from_settings_accepts_json_keypair() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes().to_vec();
        let rpc: Arc<dyn RpcClient> = Arc::new(crate::native::rpc_impl::NativeRpcClient::new(
            "http://localhost:8899".to_string(),
        ));
        let mut settings = Settings::default();
        settings.wallet_keypair_json = Some(serde_json::to_string(&bytes).unwrap());

        let wallet = KeypairWallet::from_settings(&settings, rpc, None).unwrap();
        assert_eq!(wallet.address(), keypair.pubkey());
    }
}
