// Best-effort, eventually-consistent balance view for wallet addresses.
// Non-forced refreshes are debounced; forced refreshes always read, used
// after a transfer settles when the caller needs current state.

use crate::error::CoreError;
use crate::models::BalanceSnapshot;
use crate::rpc_client::RpcClient;
use log::{debug, warn};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub type BalanceServiceResult<T> = Result<T, CoreError>;

/// Single-writer balance store: refreshed here, read-only everywhere else.
pub struct BalanceService {
    snapshots: Mutex<LruCache<String, BalanceSnapshot>>,
    last_refresh: Mutex<HashMap<String, Instant>>,
    debounce: Duration,
}

impl BalanceService {
    pub fn new(debounce: Duration, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            snapshots: Mutex::new(LruCache::new(capacity)),
            last_refresh: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    /// Refresh the balance for `address`.
    ///
    /// A non-forced call inside the debounce window returns the cached
    /// snapshot without an external read. On a failed read the previous
    /// snapshot is returned unchanged (its `observed_at` is not touched);
    /// the error only propagates when no snapshot exists yet.
    pub async fn refresh(
        &self,
        address: &str,
        force: bool,
        rpc: &dyn RpcClient,
    ) -> BalanceServiceResult<BalanceSnapshot> {
        // Timestamp compare-and-set under one lock so reentrant calls from
        // UI re-renders cannot double-read.
        {
            let mut stamps = self
                .last_refresh
                .lock()
                .map_err(|_| CoreError::Rpc("refresh stamp lock poisoned".to_string()))?;
            if !force {
                let within_window = stamps
                    .get(address)
                    .is_some_and(|at| at.elapsed() < self.debounce);
                if within_window {
                    if let Some(snapshot) = self.last_known(address) {
                        debug!("Balance refresh for {} debounced", address);
                        return Ok(snapshot);
                    }
                }
            }
            stamps.insert(address.to_string(), Instant::now());
        }

        match rpc.get_balance(address).await {
            Ok(lamports) => {
                let snapshot = BalanceSnapshot::new(lamports);
                debug!("Balance for {}: {} lamports", address, lamports);
                self.store(address, snapshot);
                Ok(snapshot)
            }
            Err(e) => match self.last_known(address) {
                // Keep the last known-good value rather than flashing zero
                // on a transient read failure.
                Some(previous) => {
                    warn!(
                        "Balance read for {} failed, keeping previous snapshot: {}",
                        address, e
                    );
                    Ok(previous)
                }
                None => Err(e),
            },
        }
    }

    /// Last cached snapshot for `address`, if any.
    pub fn last_known(&self, address: &str) -> Option<BalanceSnapshot> {
        self.snapshots
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(address).copied())
    }

    /// Record a balance observed out-of-band (websocket account
    /// notification). Does not touch the debounce stamp.
    pub fn record_observation(&self, address: &str, lamports: u64) {
        self.store(address, BalanceSnapshot::new(lamports));
    }

    fn store(&self, address: &str, snapshot: BalanceSnapshot) {
        if let Ok(mut cache) = self.snapshots.lock() {
            cache.put(address.to_string(), snapshot);
        }
    }
}

/// Caller-owned handle for a scheduled reconciliation task. Cancelling (or
/// dropping) the handle aborts any refreshes still pending.
#[cfg(feature = "native")]
pub struct ReconcileHandle {
    task: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "native")]
impl ReconcileHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Wait for the remaining scheduled refreshes to finish.
    pub async fn wait(mut self) {
        let _ = (&mut self.task).await;
    }
}

#[cfg(feature = "native")]
impl Drop for ReconcileHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(feature = "native")]
impl BalanceService {
    /// Schedule forced refreshes at increasing delays after a transfer, to
    /// absorb external confirmation latency. Best effort: settlement timing
    /// is controlled entirely by the chain.
    pub fn schedule_reconciliation(
        self: &std::sync::Arc<Self>,
        address: &str,
        delays: &[Duration],
        rpc: std::sync::Arc<dyn RpcClient>,
    ) -> ReconcileHandle {
        let service = self.clone();
        let address = address.to_string();
        let delays = delays.to_vec();
        let task = tokio::spawn(async move {
            for delay in delays {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if let Err(e) = service.refresh(&address, true, rpc.as_ref()).await {
                    warn!("Scheduled balance refresh for {} failed: {}", address, e);
                }
            }
        });
        ReconcileHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_client::RpcResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Balance reader returning a fixed value, with per-call failure
    /// injection and a read counter.
    struct MockRpc {
        balance: u64,
        reads: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl MockRpc {
        fn new(balance: u64) -> Self {
            Self {
                balance,
                reads: AtomicUsize::new(0),
                fail_on: Vec::new(),
            }
        }

        fn failing_on(balance: u64, calls: &[usize]) -> Self {
            Self {
                fail_on: calls.to_vec(),
                ..Self::new(balance)
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RpcClient for MockRpc {
        async fn get_balance(&self, _pubkey: &str) -> RpcResult<u64> {
            let call = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&call) {
                return Err(CoreError::Rpc("read failed".to_string()));
            }
            Ok(self.balance)
        }

        async fn get_latest_blockhash(&self) -> RpcResult<String> {
            Ok("hash".to_string())
        }

        async fn send_transaction(&self, _transaction: &[u8]) -> RpcResult<String> {
            Ok("sig".to_string())
        }
    }

    const ADDR: &str = "11111111111111111111111111111111";

    #[tokio::test]
    async fn non_forced_refresh_is_debounced() {
        let rpc = MockRpc::new(42);
        let service = BalanceService::new(Duration::from_secs(1), 16);

        let first = service.refresh(ADDR, false, &rpc).await.unwrap();
        let second = service.refresh(ADDR, false, &rpc).await.unwrap();

        assert_eq!(rpc.reads(), 1);
        assert_eq!(first, second);
        assert_eq!(first.lamports, 42);
    }

    #[tokio::test]
    async fn forced_refresh_bypasses_debounce() {
        let rpc = MockRpc::new(42);
        let service = BalanceService::new(Duration::from_secs(1), 16);

        service.refresh(ADDR, false, &rpc).await.unwrap();
        service.refresh(ADDR, true, &rpc).await.unwrap();
        service.refresh(ADDR, true, &rpc).await.unwrap();

        assert_eq!(rpc.reads(), 3);
    }

    #[tokio::test]
    async fn zero_debounce_always_reads() {
        let rpc = MockRpc::new(7);
        let service = BalanceService::new(Duration::ZERO, 16);

        service.refresh(ADDR, false, &rpc).await.unwrap();
        service.refresh(ADDR, false, &rpc).await.unwrap();

        assert_eq!(rpc.reads(), 2);
    }

    #[tokio::test]
    async fn failed_read_keeps_previous_snapshot() {
        let rpc = MockRpc::failing_on(100, &[2]);
        let service = BalanceService::new(Duration::ZERO, 16);

        let good = service.refresh(ADDR, true, &rpc).await.unwrap();
        let after_failure = service.refresh(ADDR, true, &rpc).await.unwrap();

        assert_eq!(rpc.reads(), 2);
        assert_eq!(after_failure.lamports, 100);
        // observed_at is not advanced by the failed read
        assert_eq!(after_failure.observed_at, good.observed_at);

        // A later successful read resumes updating the snapshot
        let recovered = service.refresh(ADDR, true, &rpc).await.unwrap();
        assert_eq!(rpc.reads(), 3);
        assert_eq!(recovered.lamports, 100);
        assert!(recovered.observed_at >= good.observed_at);
    }

    #[tokio::test]
    async fn failure_without_prior_snapshot_propagates() {
        let rpc = MockRpc::failing_on(100, &[1]);
        let service = BalanceService::new(Duration::ZERO, 16);

        let err = service.refresh(ADDR, true, &rpc).await.unwrap_err();
        assert!(matches!(err, CoreError::Rpc(_)));
        assert!(service.last_known(ADDR).is_none());
    }

    #[tokio::test]
    async fn out_of_band_observation_updates_store() {
        let service = BalanceService::new(Duration::from_secs(1), 16);
        service.record_observation(ADDR, 9);
        assert_eq!(service.last_known(ADDR).unwrap().lamports, 9);
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn scheduled_reconciliation_runs_each_delay() {
        let rpc: Arc<MockRpc> = Arc::new(MockRpc::new(5));
        let service = Arc::new(BalanceService::new(Duration::ZERO, 16));

        let handle = service.schedule_reconciliation(
            ADDR,
            &[Duration::ZERO, Duration::from_millis(10)],
            rpc.clone(),
        );
        handle.wait().await;

        assert_eq!(rpc.reads(), 2);
        assert_eq!(service.last_known(ADDR).unwrap().lamports, 5);
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn cancelled_reconciliation_stops_pending_refreshes() {
        let rpc: Arc<MockRpc> = Arc::new(MockRpc::new(5));
        let service = Arc::new(BalanceService::new(Duration::ZERO, 16));

        let handle = service.schedule_reconciliation(
            ADDR,
            &[Duration::ZERO, Duration::from_secs(30)],
            rpc.clone(),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(rpc.reads(), 1);
    }
}
