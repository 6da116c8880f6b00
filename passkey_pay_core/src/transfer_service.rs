// High-level transfer service coordinating chunked sends
// Uses the platform-agnostic wallet capability for signing and submission

use crate::chunking::plan_chunks;
use crate::classify::classify_rejection;
use crate::error::CoreError;
use crate::models::{sol_to_lamports, ChunkProgress, TransferOutcome, TransferRequest};
use crate::wallet::{TransactionOptions, WalletCapability};
use log::{debug, info, warn};
#[allow(deprecated)]
use solana_program::system_instruction;
use std::collections::HashSet;
use std::sync::Mutex;

pub type TransferServiceResult<T> = Result<T, CoreError>;

/// Observer invoked synchronously after each chunk attempt.
pub type ProgressObserver<'a> = &'a (dyn Fn(ChunkProgress) + Send + Sync);

/// High-level transfer service.
///
/// One instance guards all submissions: a second `submit_transfer` for an
/// origin whose sequence is still in flight is rejected with `Busy` rather
/// than queued, since the wallet does not define behavior for concurrent
/// signing requests against the same credential.
pub struct TransferService {
    in_flight: Mutex<HashSet<String>>,
}

impl TransferService {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Submit a transfer, splitting it into bounded chunks when the amount
    /// exceeds `max_chunk_sol`.
    ///
    /// Validation failures and `Busy` return `Err` before any external call.
    /// External rejections never surface as `Err`: they are folded into the
    /// returned outcome so the caller can render partial progress.
    pub async fn submit_transfer(
        &self,
        request: &TransferRequest,
        max_chunk_sol: f64,
        wallet: &dyn WalletCapability,
        options: &TransactionOptions,
        on_progress: Option<ProgressObserver<'_>>,
    ) -> TransferServiceResult<TransferOutcome> {
        request.validate()?;
        if !max_chunk_sol.is_finite() || max_chunk_sol <= 0.0 {
            return Err(CoreError::Validation(
                "max_chunk_sol must be a positive number".to_string(),
            ));
        }

        let origin_pk = crate::models::validate_address(&request.origin)?;
        let recipient_pk = crate::models::validate_address(&request.recipient)?;
        if origin_pk != wallet.address() {
            return Err(CoreError::Validation(format!(
                "Origin {} does not match the connected wallet {}",
                request.origin,
                wallet.address()
            )));
        }

        let _guard = self.claim_origin(&request.origin)?;

        let total_lamports = sol_to_lamports(request.amount_sol);
        let max_chunk_lamports = sol_to_lamports(max_chunk_sol);
        let chunks = plan_chunks(total_lamports, max_chunk_lamports)?;
        let total = chunks.len();

        info!(
            "Submitting transfer of {} SOL to {} in {} chunk(s)",
            request.amount_sol, request.recipient, total
        );

        let mut outcome = TransferOutcome::new(total);
        for (index, lamports) in chunks.iter().enumerate() {
            let current = index + 1;
            debug!("Sending chunk {}/{} ({} lamports)", current, total, lamports);

            let instruction = system_instruction::transfer(&origin_pk, &recipient_pk, *lamports);
            let result = wallet
                .sign_and_send_transaction(vec![instruction], options)
                .await;

            match result {
                Ok(signature) => {
                    debug!("Chunk {}/{} confirmed: {}", current, total, signature);
                    outcome.signatures.push(signature);
                    outcome.succeeded_chunks += 1;
                    notify(on_progress, current, total);
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        "Chunk {}/{} failed, halting sequence: {}",
                        current, total, message
                    );
                    outcome.failure_category = Some(classify_rejection(&message));
                    outcome.failure_reason = Some(message);
                    notify(on_progress, current, total);
                    break;
                }
            }
        }

        Ok(outcome)
    }

    /// Mark `origin` in flight, or fail with `Busy` if it already is. The
    /// returned guard releases the claim on every exit path.
    fn claim_origin(&self, origin: &str) -> TransferServiceResult<InFlightGuard<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| CoreError::Wallet("in-flight lock poisoned".to_string()))?;
        if !set.insert(origin.to_string()) {
            return Err(CoreError::Busy(origin.to_string()));
        }
        Ok(InFlightGuard {
            origins: &self.in_flight,
            origin: origin.to_string(),
        })
    }
}

impl Default for TransferService {
    fn default() -> Self {
        Self::new()
    }
}

fn notify(on_progress: Option<ProgressObserver<'_>>, current: usize, total: usize) {
    if let Some(observer) = on_progress {
        observer(ChunkProgress { current, total });
    }
}

struct InFlightGuard<'a> {
    origins: &'a Mutex<HashSet<String>>,
    origin: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.origins.lock() {
            set.remove(&self.origin);
        }
    }
}
