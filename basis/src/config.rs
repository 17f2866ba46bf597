use crate::error::ConfigError;
use basis_instrument::{asset::AssetNameInternal, exchange::ExchangeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

/// Deployment environment selector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Dev,
    Prod,
    Test,
}

/// Validated engine configuration.
///
/// Loaded once at startup and treated as immutable thereafter; components receive
/// references through their constructors rather than via globals.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub environment: Environment,
    #[serde(default)]
    pub debug: bool,
    pub exchanges: HashMap<ExchangeId, ExchangeConfig>,
    pub arbitrage: ArbitrageConfig,
    pub strategy: StrategyConfig,
    /// Directory holding persisted task contexts and operator control files.
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct CredentialsConfig {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets never reach logs
        f.debug_struct("CredentialsConfig")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub capacity: usize,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArbitrageConfig {
    /// Venues enabled for scanning and execution.
    pub enabled_exchanges: Vec<ExchangeId>,
    /// Instruments enabled for scanning, as `(base, quote)` pairs.
    pub enabled_instruments: Vec<InstrumentConfig>,
    /// Detector tick.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Base execution window for one entry leg.
    #[serde(default = "default_target_execution_time_ms")]
    pub target_execution_time_ms: u64,
    /// Maximum acceptable age of a book ticker before it is stale for decision-making.
    #[serde(default = "default_freshness_horizon_ms")]
    pub freshness_horizon_ms: u64,
    pub risk_limits: RiskLimits,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct InstrumentConfig {
    pub base: AssetNameInternal,
    pub quote: AssetNameInternal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskLimits {
    /// Per-trade notional cap.
    pub max_position_size_usd: f64,
    /// Refuse opportunities with an implausibly large spread.
    pub max_spread_bps: i64,
    /// Liquidity gate: minimum executable notional on both legs.
    pub min_market_depth_usd: f64,
    /// Opportunity filter.
    pub min_profit_margin_bps: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Take-profit threshold on net P&L, in percent.
    pub min_profit_pct: Decimal,
    /// Optional stop-loss threshold on net P&L, in percent (negative).
    #[serde(default)]
    pub stop_loss_pct: Option<Decimal>,
    /// Position timeout in hours.
    pub max_hours: f64,
    /// Strategy task tick delay.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// ErrorRecovery cooldown before returning to Monitoring.
    #[serde(default = "default_recovery_cooldown_ms")]
    pub recovery_cooldown_ms: u64,
    /// Consecutive failures before escalating to Paused.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

fn default_true() -> bool {
    true
}

fn default_scan_interval_ms() -> u64 {
    100
}

fn default_target_execution_time_ms() -> u64 {
    3000
}

fn default_freshness_horizon_ms() -> u64 {
    500
}

fn default_tick_interval_ms() -> u64 {
    10
}

fn default_recovery_cooldown_ms() -> u64 {
    5000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

impl Config {
    /// Load, substitute environment variables, parse, and validate a JSON config file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            ConfigError::Io(format!("{}: {error}", path.display()))
        })?;

        let substituted = substitute_env_vars(&raw)?;

        let config: Config = serde_json::from_str(&substituted)
            .map_err(|error| ConfigError::Parse(error.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate internal consistency. Fatal on failure - the process must not start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arbitrage.enabled_exchanges.len() < 2 {
            return Err(ConfigError::InvalidValue {
                key: "arbitrage.enabled_exchanges",
                reason: "cross-exchange arbitrage requires at least two venues".to_string(),
            });
        }

        if self.arbitrage.enabled_instruments.is_empty() {
            return Err(ConfigError::MissingKey("arbitrage.enabled_instruments"));
        }

        if self.arbitrage.risk_limits.min_profit_margin_bps < 0 {
            return Err(ConfigError::InvalidValue {
                key: "arbitrage.risk_limits.min_profit_margin_bps",
                reason: "must be non-negative".to_string(),
            });
        }

        if self.arbitrage.risk_limits.max_position_size_usd <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "arbitrage.risk_limits.max_position_size_usd",
                reason: "must be positive".to_string(),
            });
        }

        for exchange in &self.arbitrage.enabled_exchanges {
            let Some(venue_config) = self.exchanges.get(exchange) else {
                return Err(ConfigError::MissingKey("exchanges.<enabled venue>"));
            };
            if !venue_config.enabled {
                return Err(ConfigError::InvalidValue {
                    key: "arbitrage.enabled_exchanges",
                    reason: format!("venue {exchange} is disabled in the exchanges section"),
                });
            }
            if venue_config.credentials.is_none() && *exchange != ExchangeId::Mock {
                return Err(ConfigError::MissingCredentials(*exchange));
            }
        }

        Ok(())
    }
}

/// Resolve `${VAR}` and `${VAR:default}` references against the process environment.
///
/// A reference without a default to a variable that is not set is a fatal
/// [`ConfigError::MissingEnvVar`].
pub fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    substitute_vars_with(input, |name| std::env::var(name).ok())
}

fn substitute_vars_with<Lookup>(input: &str, lookup: Lookup) -> Result<String, ConfigError>
where
    Lookup: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(start) = remaining.find("${") {
        output.push_str(&remaining[..start]);
        let after_open = &remaining[start + 2..];

        let Some(end) = after_open.find('}') else {
            return Err(ConfigError::Parse(
                "unterminated ${ in configuration".to_string(),
            ));
        };

        let reference = &after_open[..end];
        let (name, default) = match reference.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (reference, None),
        };

        match (lookup(name), default) {
            (Some(value), _) => output.push_str(&value),
            (None, Some(default)) => output.push_str(default),
            (None, None) => return Err(ConfigError::MissingEnvVar(name.to_string())),
        }

        remaining = &after_open[end + 1..];
    }

    output.push_str(remaining);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_vars() {
        struct TestCase {
            input: &'static str,
            expected: Result<String, ConfigError>,
        }

        let lookup = |name: &str| match name {
            "MEXC_API_KEY" => Some("secret-key".to_string()),
            _ => None,
        };

        let tests = vec![
            TestCase {
                // TC0: no references pass through untouched
                input: r#"{"a": 1}"#,
                expected: Ok(r#"{"a": 1}"#.to_string()),
            },
            TestCase {
                // TC1: set variable resolves
                input: r#"{"key": "${MEXC_API_KEY}"}"#,
                expected: Ok(r#"{"key": "secret-key"}"#.to_string()),
            },
            TestCase {
                // TC2: unset variable with default resolves to the default
                input: r#"{"env": "${HFT_ENV:dev}"}"#,
                expected: Ok(r#"{"env": "dev"}"#.to_string()),
            },
            TestCase {
                // TC3: unset variable without default is fatal
                input: r#"{"key": "${HFT_ENV}"}"#,
                expected: Err(ConfigError::MissingEnvVar("HFT_ENV".to_string())),
            },
            TestCase {
                // TC4: unterminated reference is a parse error
                input: r#"{"key": "${MEXC_API_KEY"}"#,
                expected: Err(ConfigError::Parse(
                    "unterminated ${ in configuration".to_string(),
                )),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                substitute_vars_with(test.input, lookup),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    fn base_config() -> Config {
        serde_json::from_str(
            r#"
            {
                "environment": "test",
                "exchanges": {
                    "mexc_spot": {
                        "credentials": {"api_key": "k", "api_secret": "s"}
                    },
                    "gateio_perpetuals_usd": {
                        "credentials": {"api_key": "k", "api_secret": "s"}
                    }
                },
                "arbitrage": {
                    "enabled_exchanges": ["mexc_spot", "gateio_perpetuals_usd"],
                    "enabled_instruments": [{"base": "btc", "quote": "usdt"}],
                    "risk_limits": {
                        "max_position_size_usd": 1000.0,
                        "max_spread_bps": 500,
                        "min_market_depth_usd": 100.0,
                        "min_profit_margin_bps": 40
                    }
                },
                "strategy": {
                    "min_profit_pct": "0.1",
                    "max_hours": 24.0
                },
                "state_dir": "/tmp/basis-test"
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_accepts_sane_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_single_venue() {
        let mut config = base_config();
        config.arbitrage.enabled_exchanges.truncate(1);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut config = base_config();
        config
            .exchanges
            .get_mut(&ExchangeId::MexcSpot)
            .unwrap()
            .credentials = None;

        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingCredentials(ExchangeId::MexcSpot))
        );
    }

    #[test]
    fn test_config_defaults_applied() {
        let config = base_config();
        assert_eq!(config.arbitrage.scan_interval_ms, 100);
        assert_eq!(config.arbitrage.freshness_horizon_ms, 500);
        assert_eq!(config.strategy.tick_interval_ms, 10);
        assert_eq!(config.strategy.max_consecutive_failures, 5);
    }
}
