//! Process configuration, loaded once at startup from the environment.

use std::time::Duration;

use crate::model::Symbol;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub min_spread_bps: f64,
    pub min_tri_gain_bps: f64,
    pub min_notional: f64,

    pub symbol_universe: Vec<Symbol>,
    pub tri_bases: Vec<String>,
    pub tri_exclude_quotes: Vec<String>,

    pub include_exchanges: Vec<String>,
    pub exclude_exchanges: Vec<String>,

    pub depth_levels: usize,
    pub coalesce_ms: u64,
    pub tri_scan_ms: u64,
    pub max_concurrent_exchanges: usize,

    pub log_level: String,

    pub health_check_interval_s: u64,
    pub max_reconnect_attempts: u32,
    pub backoff_max_s: u64,

    pub path_cache_ttl_s: u64,
    pub dedup_ttl_s: u64,
    pub min_send_interval_ms: u64,
    pub freshness_ttl_s: i64,
    pub stream_mode_age_threshold_s: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_spread_bps: 50.0,
            min_tri_gain_bps: 30.0,
            min_notional: 100.0,
            symbol_universe: default_symbol_universe(),
            tri_bases: vec!["USDT".into(), "USDC".into(), "BTC".into()],
            tri_exclude_quotes: vec![],
            include_exchanges: vec![
                "binance", "okx", "bybit", "coinbase", "kraken", "kucoin", "gateio", "huobi",
                "bitfinex", "mexc",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exclude_exchanges: vec![],
            depth_levels: 10,
            coalesce_ms: 75,
            tri_scan_ms: 150,
            max_concurrent_exchanges: 20,
            log_level: "INFO".into(),
            health_check_interval_s: 30,
            max_reconnect_attempts: 5,
            backoff_max_s: 60,
            path_cache_ttl_s: 300,
            dedup_ttl_s: 30,
            min_send_interval_ms: 1000,
            freshness_ttl_s: 60,
            stream_mode_age_threshold_s: 5,
        }
    }
}

fn default_symbol_universe() -> Vec<Symbol> {
    [
        "BTC/USDT", "ETH/USDT", "SOL/USDT", "XRP/USDT", "BNB/USDT", "ADA/USDT", "DOGE/USDT",
        "TON/USDT", "AVAX/USDT", "LINK/USDT",
    ]
    .iter()
    .filter_map(|s| {
        let (base, quote) = s.split_once('/')?;
        Symbol::new(base, quote)
    })
    .collect()
}

impl Config {
    /// Loads configuration from the process environment, falling back to
    /// `.env` if present and then to the defaults above for anything unset.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let default = Self::default();

        let symbol_universe = std::env::var("SYMBOL_UNIVERSE")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .filter_map(|s| {
                        let s = s.trim();
                        let (base, quote) = s.split_once('/')?;
                        Symbol::new(base, quote)
                    })
                    .collect()
            })
            .unwrap_or(default.symbol_universe);

        Self {
            min_spread_bps: env_parse("MIN_SPREAD_BPS", default.min_spread_bps),
            min_tri_gain_bps: env_parse("MIN_TRI_GAIN_BPS", default.min_tri_gain_bps),
            min_notional: env_parse("MIN_NOTIONAL", default.min_notional),
            symbol_universe,
            tri_bases: if std::env::var("TRI_BASES").is_ok() {
                env_list("TRI_BASES", "")
            } else {
                default.tri_bases
            },
            tri_exclude_quotes: env_list("TRI_EXCLUDE_QUOTES", ""),
            include_exchanges: if std::env::var("INCLUDE_EXCHANGES").is_ok() {
                env_list("INCLUDE_EXCHANGES", "")
            } else {
                default.include_exchanges
            },
            exclude_exchanges: env_list("EXCLUDE_EXCHANGES", ""),
            depth_levels: env_parse("DEPTH_LEVELS", default.depth_levels),
            coalesce_ms: env_parse("COALESCE_MS", default.coalesce_ms),
            tri_scan_ms: env_parse("TRI_SCAN_MS", default.tri_scan_ms),
            max_concurrent_exchanges: env_parse(
                "MAX_CONCURRENT_EXCHANGES",
                default.max_concurrent_exchanges,
            ),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(default.log_level),
            health_check_interval_s: env_parse(
                "HEALTH_CHECK_INTERVAL_S",
                default.health_check_interval_s,
            ),
            max_reconnect_attempts: env_parse(
                "MAX_RECONNECT_ATTEMPTS",
                default.max_reconnect_attempts,
            ),
            backoff_max_s: env_parse("BACKOFF_MAX_S", default.backoff_max_s),
            path_cache_ttl_s: default.path_cache_ttl_s,
            dedup_ttl_s: default.dedup_ttl_s,
            min_send_interval_ms: default.min_send_interval_ms,
            freshness_ttl_s: default.freshness_ttl_s,
            stream_mode_age_threshold_s: default.stream_mode_age_threshold_s,
        }
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.tri_scan_ms)
    }
}
