use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[cfg(feature = "native")]
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_rpc_urls")]
    pub solana_rpc_urls: Vec<String>,
    #[serde(default)]
    pub solana_ws_urls: Vec<String>,
    /// Passkey portal used by browser clients to run the WebAuthn ceremony.
    #[serde(default = "default_portal_url")]
    pub portal_url: String,
    /// Fee-sponsorship endpoint transactions are submitted through when
    /// `fee_sponsored` is on.
    #[serde(default = "default_paymaster_url")]
    pub paymaster_url: String,
    #[serde(default)]
    pub paymaster_api_key: Option<String>,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Per-call amount ceiling in SOL. Transfers above it are split into
    /// chunks of at most this size; the ceiling is a documented limit of the
    /// wallet SDK, not of the ledger.
    #[serde(default = "default_max_chunk_sol")]
    pub max_chunk_sol: f64,
    #[serde(default = "default_fee_sponsored")]
    pub fee_sponsored: bool,
    #[serde(default = "default_balance_debounce_secs")]
    pub balance_debounce_secs: u64,
    /// Delays (seconds) for the forced balance refreshes scheduled after a
    /// transfer settles.
    #[serde(default = "default_reconcile_delays_secs")]
    pub reconcile_delays_secs: Vec<u64>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub wallet_keypair_path: Option<String>,
    #[serde(default)]
    pub wallet_keypair_json: Option<String>,
    #[serde(default)]
    pub wallet_private_key_string: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solana_rpc_urls: default_rpc_urls(),
            solana_ws_urls: Vec::new(),
            portal_url: default_portal_url(),
            paymaster_url: default_paymaster_url(),
            paymaster_api_key: None,
            commitment: default_commitment(),
            max_chunk_sol: default_max_chunk_sol(),
            fee_sponsored: default_fee_sponsored(),
            balance_debounce_secs: default_balance_debounce_secs(),
            reconcile_delays_secs: default_reconcile_delays_secs(),
            cache_capacity: default_cache_capacity(),
            http_timeout_secs: default_http_timeout_secs(),
            wallet_keypair_path: None,
            wallet_keypair_json: None,
            wallet_private_key_string: None,
        }
    }
}

impl Settings {
    #[cfg(feature = "native")]
    pub fn from_file(path: &str) -> Result<Self, CoreError> {
        let builder = config::Config::builder().add_source(config::File::with_name(path));
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    #[cfg(feature = "native")]
    pub fn save_to_file(&self, path: &str) -> Result<(), CoreError> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Validate settings ranges and constraints
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.solana_rpc_urls.is_empty() {
            return Err(CoreError::Validation(
                "solana_rpc_urls must contain at least one endpoint".to_string(),
            ));
        }
        for endpoint in self
            .solana_rpc_urls
            .iter()
            .chain(self.solana_ws_urls.iter())
            .chain([&self.portal_url, &self.paymaster_url])
        {
            url::Url::parse(endpoint).map_err(|e| {
                CoreError::Validation(format!("Invalid endpoint URL {}: {}", endpoint, e))
            })?;
        }
        if !self.max_chunk_sol.is_finite() || self.max_chunk_sol <= 0.0 {
            return Err(CoreError::Validation(
                "max_chunk_sol must be > 0".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(CoreError::Validation(
                "cache_capacity must be > 0".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(CoreError::Validation(
                "http_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.reconcile_delays_secs.is_empty() {
            return Err(CoreError::Validation(
                "reconcile_delays_secs must not be empty".to_string(),
            ));
        }
        if self
            .reconcile_delays_secs
            .windows(2)
            .any(|pair| pair[1] < pair[0])
        {
            return Err(CoreError::Validation(
                "reconcile_delays_secs must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.balance_debounce_secs)
    }

    pub fn reconcile_delays(&self) -> Vec<std::time::Duration> {
        self.reconcile_delays_secs
            .iter()
            .map(|&s| std::time::Duration::from_secs(s))
            .collect()
    }
}

/// Try to read a base64-encoded keypair from the given env var. Returns
/// the raw decoded bytes if present and valid, otherwise None.
#[cfg(feature = "native")]
pub fn load_keypair_from_env_var(var: &str) -> Option<Vec<u8>> {
    if let Ok(s) = std::env::var(var) {
        match Base64Engine.decode(&s) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("Failed to decode {}: {}", var, e);
                None
            }
        }
    } else {
        None
    }
}

/// Parse a private key string in various formats:
/// - Base58 (standard Solana format, 88 chars)
/// - JSON array string like "[1,2,3,...]"
/// - Comma-separated bytes like "1,2,3,..."
pub fn parse_private_key_string(s: &str) -> Result<Vec<u8>, String> {
    let trimmed = s.trim();

    // Try base58 first (most common format)
    if trimmed.len() >= 80 && !trimmed.starts_with('[') && !trimmed.contains(',') {
        return bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| format!("Base58 decode failed: {}", e));
    }

    // Try JSON array format: [1,2,3,...]
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<u8>>(trimmed)
            .map_err(|e| format!("JSON parse failed: {}", e));
    }

    // Try comma-separated format: 1,2,3,...
    if trimmed.contains(',') {
        let parts: Result<Vec<u8>, _> = trimmed
            .split(',')
            .map(|s| s.trim().parse::<u8>())
            .collect();
        return parts.map_err(|e| format!("CSV parse failed: {}", e));
    }

    Err("Unrecognized private key format. Expected: base58, JSON array, or comma-separated bytes"
        .to_string())
}

fn default_rpc_urls() -> Vec<String> {
    vec!["https://api.devnet.solana.com".to_string()]
}
fn default_portal_url() -> String {
    "https://portal.lazor.sh".to_string()
}
fn default_paymaster_url() -> String {
    "https://lazorkit-paymaster.onrender.com".to_string()
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_max_chunk_sol() -> f64 {
    0.05
}
fn default_fee_sponsored() -> bool {
    true
}
fn default_balance_debounce_secs() -> u64 {
    1
}
fn default_reconcile_delays_secs() -> Vec<u64> {
    vec![0, 3, 10]
}
fn default_cache_capacity() -> usize {
    256
}
fn default_http_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.max_chunk_sol, 0.05);
        assert_eq!(s.balance_debounce_secs, 1);
        assert_eq!(s.reconcile_delays_secs, vec![0, 3, 10]);
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut s = Settings::default();
        s.max_chunk_sol = 0.0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.solana_rpc_urls.clear();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.paymaster_url = "not a url".to_string();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.reconcile_delays_secs = vec![5, 1];
        assert!(s.validate().is_err());
    }

    #[cfg(feature = "native")]
    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let mut original = Settings::default();
        original.max_chunk_sol = 0.02;
        original.solana_ws_urls = vec!["wss://api.devnet.solana.com".to_string()];
        original.save_to_file(path_str).unwrap();

        let loaded = Settings::from_file(path_str).unwrap();
        assert_eq!(loaded.max_chunk_sol, 0.02);
        assert_eq!(loaded.solana_ws_urls, original.solana_ws_urls);
        assert_eq!(loaded.paymaster_url, original.paymaster_url);
    }

    #[test]
    fn parse_private_key_json_and_csv() {
        assert_eq!(parse_private_key_string("[1,2,3]").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_private_key_string("1, 2, 3").unwrap(), vec![1, 2, 3]);
        assert!(parse_private_key_string("???").is_err());
    }
}
