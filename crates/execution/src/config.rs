//! Engine configuration.

use crate::confirmation::PollConfig;
use serde::{Deserialize, Serialize};
use solpay_domain::{Address, Commitment, Endpoint, TransferError, UnitScale};
use std::str::FromStr;
use std::time::Duration;

/// Comma-separated endpoint URLs, in priority order.
pub const ENV_RPC_ENDPOINTS: &str = "SOLPAY_RPC_ENDPOINTS";
/// Per-endpoint acquisition timeout in milliseconds.
pub const ENV_ENDPOINT_TIMEOUT_MS: &str = "SOLPAY_ENDPOINT_TIMEOUT_MS";
/// Delay between confirmation polls in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "SOLPAY_POLL_INTERVAL_MS";
/// Budget for a single confirmation poll in milliseconds.
pub const ENV_POLL_REQUEST_TIMEOUT_MS: &str = "SOLPAY_POLL_REQUEST_TIMEOUT_MS";
/// Maximum confirmation polls.
pub const ENV_POLL_MAX_ATTEMPTS: &str = "SOLPAY_POLL_MAX_ATTEMPTS";
/// Decimal places between major and minor units.
pub const ENV_MINOR_UNIT_DECIMALS: &str = "SOLPAY_MINOR_UNIT_DECIMALS";
/// `processed`, `confirmed` or `finalized`.
pub const ENV_COMMITMENT: &str = "SOLPAY_COMMITMENT";
/// Fixed recipient for treasury transfers.
pub const ENV_TREASURY_ADDRESS: &str = "SOLPAY_TREASURY_ADDRESS";
/// Comma-separated broadcast URLs for the keypair signer.
pub const ENV_SIGNER_RPC_ENDPOINTS: &str = "SOLPAY_SIGNER_RPC_ENDPOINTS";
/// Check the payer balance before prompting the wallet.
pub const ENV_PREFLIGHT_BALANCE_CHECK: &str = "SOLPAY_PREFLIGHT_BALANCE_CHECK";

/// Public mainnet endpoints used when none are configured.
pub const DEFAULT_RPC_ENDPOINTS: [&str; 5] = [
    "https://api.mainnet-beta.solana.com",
    "https://solana-rpc.publicnode.com",
    "https://solana.api.onfinality.io/public",
    "https://public.rpc.solanavibestation.com",
    "https://solana-api.projectserum.com",
];

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<ConfigError> for TransferError {
    fn from(err: ConfigError) -> Self {
        TransferError::Configuration(err.to_string())
    }
}

/// Configuration for the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RPC endpoints, tried in priority order.
    pub endpoints: Vec<Endpoint>,
    /// Budget for connecting and fetching a blockhash from one endpoint.
    pub endpoint_timeout_ms: u64,
    /// Delay between confirmation polls.
    pub poll_interval_ms: u64,
    /// Maximum confirmation polls.
    pub poll_max_attempts: u32,
    /// Budget for a single confirmation poll.
    pub poll_request_timeout_ms: u64,
    /// Decimal places between major and minor units.
    pub minor_unit_decimals: u32,
    /// Commitment for blockhash and confirmation.
    pub commitment: Commitment,
    /// Fixed recipient for treasury transfers.
    pub treasury: Option<Address>,
    /// Check the payer balance before the wallet prompt.
    pub preflight_balance_check: bool,
    /// Broadcast endpoints for the keypair signer; empty means reuse `endpoints`.
    pub signer_endpoints: Vec<Endpoint>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoint::from_urls(DEFAULT_RPC_ENDPOINTS),
            endpoint_timeout_ms: 10_000, // 10 seconds
            poll_interval_ms: 2_000,     // 2 seconds
            poll_max_attempts: 30,       // about one minute of polling
            poll_request_timeout_ms: 10_000,
            minor_unit_decimals: UnitScale::SOL.decimals(),
            commitment: Commitment::Confirmed,
            treasury: None,
            preflight_balance_check: false,
            signer_endpoints: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment, falling back to
    /// defaults for unset variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a variable that is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_RPC_ENDPOINTS) {
            config.endpoints = parse_endpoints(&raw);
        }
        if let Some(raw) = get(ENV_ENDPOINT_TIMEOUT_MS) {
            config.endpoint_timeout_ms = parse(ENV_ENDPOINT_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = parse(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_POLL_REQUEST_TIMEOUT_MS) {
            config.poll_request_timeout_ms = parse(ENV_POLL_REQUEST_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_POLL_MAX_ATTEMPTS) {
            config.poll_max_attempts = parse(ENV_POLL_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = get(ENV_MINOR_UNIT_DECIMALS) {
            config.minor_unit_decimals = parse(ENV_MINOR_UNIT_DECIMALS, &raw)?;
        }
        if let Some(raw) = get(ENV_COMMITMENT) {
            config.commitment =
                Commitment::from_str(raw.trim()).map_err(|reason| ConfigError::Invalid {
                    key: ENV_COMMITMENT,
                    reason,
                })?;
        }
        if let Some(raw) = get(ENV_TREASURY_ADDRESS) {
            let treasury = Address::validate(raw.trim()).map_err(|e| ConfigError::Invalid {
                key: ENV_TREASURY_ADDRESS,
                reason: e.to_string(),
            })?;
            config.treasury = Some(treasury);
        }
        if let Some(raw) = get(ENV_PREFLIGHT_BALANCE_CHECK) {
            config.preflight_balance_check = parse_bool(ENV_PREFLIGHT_BALANCE_CHECK, &raw)?;
        }
        if let Some(raw) = get(ENV_SIGNER_RPC_ENDPOINTS) {
            config.signer_endpoints = parse_endpoints(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks values that would make the engine unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid {
                key: ENV_RPC_ENDPOINTS,
                reason: "at least one endpoint is required".to_string(),
            });
        }
        if self.endpoint_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_ENDPOINT_TIMEOUT_MS,
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_POLL_REQUEST_TIMEOUT_MS,
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_POLL_MAX_ATTEMPTS,
                reason: "must be greater than zero".to_string(),
            });
        }
        self.unit_scale()?;
        Ok(())
    }

    /// Unit scale for amount conversion.
    pub fn unit_scale(&self) -> Result<UnitScale, ConfigError> {
        UnitScale::new(self.minor_unit_decimals).map_err(|e| ConfigError::Invalid {
            key: ENV_MINOR_UNIT_DECIMALS,
            reason: e.to_string(),
        })
    }

    /// Per-endpoint acquisition timeout.
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_millis(self.endpoint_timeout_ms)
    }

    /// URLs the keypair signer broadcasts through, in order.
    pub fn signer_rpc_urls(&self) -> Vec<String> {
        let endpoints = if self.signer_endpoints.is_empty() {
            &self.endpoints
        } else {
            &self.signer_endpoints
        };
        endpoints.iter().map(|e| e.url.clone()).collect()
    }

    /// Confirmation polling settings.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.poll_max_attempts,
            interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_millis(self.poll_request_timeout_ms),
            commitment: self.commitment,
        }
    }
}

fn parse_endpoints(raw: &str) -> Vec<Endpoint> {
    Endpoint::from_urls(
        raw.split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty()),
    )
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.endpoints.len(), 5);
        assert_eq!(config.endpoints[0].url, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.endpoint_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_config(), PollConfig::default());
    }

    #[test]
    fn test_overrides() {
        let treasury = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_RPC_ENDPOINTS, " https://a , https://b,,"),
            (ENV_POLL_MAX_ATTEMPTS, "5"),
            (ENV_COMMITMENT, "finalized"),
            (ENV_TREASURY_ADDRESS, treasury),
            (ENV_PREFLIGHT_BALANCE_CHECK, "true"),
        ]))
        .unwrap();

        let urls: Vec<_> = config.endpoints.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b"]);
        assert_eq!(config.endpoints[1].priority, 1);
        assert_eq!(config.poll_max_attempts, 5);
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.treasury.unwrap().to_string(), treasury);
        assert!(config.preflight_balance_check);
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [(ENV_POLL_INTERVAL_MS, "soon")],
            [(ENV_POLL_MAX_ATTEMPTS, "0")],
            [(ENV_POLL_REQUEST_TIMEOUT_MS, "0")],
            [(ENV_MINOR_UNIT_DECIMALS, "40")],
            [(ENV_COMMITMENT, "max")],
            [(ENV_TREASURY_ADDRESS, "not-an-address")],
            [(ENV_PREFLIGHT_BALANCE_CHECK, "maybe")],
        ] {
            let err = EngineConfig::from_lookup(lookup(&vars)).unwrap_err();
            let ConfigError::Invalid { key, .. } = &err;
            assert_eq!(*key, vars[0].0);
        }
    }

    #[test]
    fn test_poll_request_timeout_override() {
        let config =
            EngineConfig::from_lookup(lookup(&[(ENV_POLL_REQUEST_TIMEOUT_MS, "2500")])).unwrap();

        assert_eq!(
            config.poll_config().request_timeout,
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn test_signer_urls_default_to_pool() {
        let config =
            EngineConfig::from_lookup(lookup(&[(ENV_RPC_ENDPOINTS, "https://a,https://b")]))
                .unwrap();
        assert_eq!(config.signer_rpc_urls(), vec!["https://a", "https://b"]);

        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_RPC_ENDPOINTS, "https://a,https://b"),
            (ENV_SIGNER_RPC_ENDPOINTS, "https://send"),
        ]))
        .unwrap();
        assert_eq!(config.signer_rpc_urls(), vec!["https://send"]);
    }

    #[test]
    fn test_config_error_maps_to_transfer_error() {
        let err: TransferError = ConfigError::Invalid {
            key: ENV_COMMITMENT,
            reason: "bad".to_string(),
        }
        .into();
        assert_eq!(err.kind(), solpay_domain::ErrorKind::Configuration);
    }
}
