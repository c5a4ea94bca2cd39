//! Environment-driven configuration, mirroring the layout of the original
//! fleet config: an `ACTIVE_PROFILE` env var selects a `<profile>.env`
//! file, which is loaded and then read alongside any already-exported
//! environment variables.

use std::env;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing required config key: {key}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub tickers: Vec<String>,
    pub timeframes: Vec<String>,
    pub exchanges: Vec<String>,
    pub starting_cash: f64,
    pub server_name: String,
    pub server_version: String,
    pub server_port: u16,
}

#[derive(Debug, Clone)]
pub struct PerTraderConfig {
    pub symbol: String,
    pub timeframe: String,
    pub exchange: String,
    pub starting_cash: f64,
    pub default_order_value: f64,
}

impl FleetConfig {
    /// Loads `<profile>.env` (profile from `ACTIVE_PROFILE`, default
    /// `"default"`) if present, then reads the recognised keys. A missing
    /// `.env` file is not itself an error — the keys may already be set in
    /// the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env::var("ACTIVE_PROFILE").unwrap_or_else(|_| "default".to_string());
        let _ = dotenvy::from_filename(format!("{profile}.env"));
        Self::from_current_env()
    }

    fn from_current_env() -> Result<Self, ConfigError> {
        let tickers = required_list("TICKERS")?;
        let timeframes = required_list("TIMEFRAMES")?;
        let exchanges = required_list("EXCHANGES")?;

        if tickers.len() != timeframes.len() || tickers.len() != exchanges.len() {
            return Err(ConfigError::Invalid(format!(
                "TICKERS ({}), TIMEFRAMES ({}), and EXCHANGES ({}) must have equal length",
                tickers.len(),
                timeframes.len(),
                exchanges.len()
            )));
        }

        let starting_cash = required_str("STARTING_CASH")?
            .parse::<f64>()
            .map_err(|e| ConfigError::Invalid(format!("STARTING_CASH: {e}")))?;

        let server_name = required_str("SERVER_NAME")?;
        let server_version = required_str("SERVER_VERSION")?;
        let server_port = required_str("SERVER_PORT")?
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid(format!("SERVER_PORT: {e}")))?;

        Ok(FleetConfig {
            tickers,
            timeframes,
            exchanges,
            starting_cash,
            server_name,
            server_version,
            server_port,
        })
    }

    /// Derives per-trader config for every ticker: starting cash is split
    /// evenly across symbols, and each trader's default order value is a
    /// tenth of its own starting cash.
    pub fn per_trader_configs(&self) -> Vec<PerTraderConfig> {
        let starting_cash = self.starting_cash / self.tickers.len() as f64;
        let default_order_value = starting_cash / 10.0;

        self.tickers
            .iter()
            .zip(self.timeframes.iter())
            .zip(self.exchanges.iter())
            .map(|((symbol, timeframe), exchange)| PerTraderConfig {
                symbol: symbol.clone(),
                timeframe: timeframe.clone(),
                exchange: exchange.clone(),
                starting_cash,
                default_order_value,
            })
            .collect()
    }
}

fn required_str(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn required_list(key: &'static str) -> Result<Vec<String>, ConfigError> {
    let raw = required_str(key)?;
    let items: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
    if items.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Invalid(format!("{key} contains an empty entry")));
    }
    Ok(items)
}
