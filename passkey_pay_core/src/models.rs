use crate::classify::RejectionCategory;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

/// Lamports per SOL (1 SOL = 1e9 lamports)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a SOL amount to lamports, rounding to the nearest lamport.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Convert lamports to SOL for display.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Validate a base58 account address, returning the parsed pubkey.
pub fn validate_address(address: &str) -> Result<Pubkey, CoreError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Address must not be empty".to_string()));
    }
    Pubkey::from_str(trimmed)
        .map_err(|e| CoreError::Validation(format!("Invalid address {}: {}", trimmed, e)))
}

/// A single logical transfer as entered by the user.
///
/// Amounts cross the public API in SOL; conversion to lamports happens once
/// at the service boundary so chunk arithmetic stays integral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount_sol: f64,
    pub origin: String,
}

impl TransferRequest {
    pub fn new(origin: impl Into<String>, recipient: impl Into<String>, amount_sol: f64) -> Self {
        Self {
            recipient: recipient.into(),
            amount_sol,
            origin: origin.into(),
        }
    }

    /// Check request invariants before any external call is made.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.amount_sol.is_finite() || self.amount_sol <= 0.0 {
            return Err(CoreError::Validation(
                "Transfer amount must be a positive number".to_string(),
            ));
        }
        validate_address(&self.origin)?;
        validate_address(&self.recipient)?;
        Ok(())
    }
}

/// Aggregate result of a (possibly chunked) transfer submission.
///
/// Created empty before submission, appended to as chunks settle, and
/// finalized once all chunks were attempted or one failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub succeeded_chunks: usize,
    pub total_chunks: usize,
    pub signatures: Vec<String>,
    pub failure_reason: Option<String>,
    pub failure_category: Option<RejectionCategory>,
}

impl TransferOutcome {
    pub fn new(total_chunks: usize) -> Self {
        Self {
            succeeded_chunks: 0,
            total_chunks,
            signatures: Vec::with_capacity(total_chunks),
            failure_reason: None,
            failure_category: None,
        }
    }

    /// Derive the terminal status. Partial success is distinct from both
    /// full success and total failure and must never be conflated.
    pub fn status(&self) -> TransferStatus {
        if self.succeeded_chunks == self.total_chunks {
            TransferStatus::Confirmed
        } else if self.succeeded_chunks > 0 {
            TransferStatus::Partial
        } else {
            TransferStatus::Failed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// All chunks confirmed.
    Confirmed,
    /// Some but not all chunks confirmed; needs manual follow-up, not retry-all.
    Partial,
    /// No chunk confirmed.
    Failed,
}

/// Progress notification emitted after each chunk attempt (success or failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkProgress {
    pub current: usize,
    pub total: usize,
}

/// Last observed balance for one address.
///
/// Written only by the balance service; read-only everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub lamports: u64,
    pub observed_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub fn new(lamports: u64) -> Self {
        Self {
            lamports,
            observed_at: Utc::now(),
        }
    }

    pub fn sol(&self) -> f64 {
        lamports_to_sol(self.lamports)
    }
}
