//! Configuration for the fill relay.
//!
//! All settings come from environment variables and are validated once at
//! startup. Required credentials that are missing or blank, and numeric
//! values that do not parse, are fatal [`RelayError::Config`] errors.
//!
//! # Variables
//!
//! | Variable                     | Default  |
//! |------------------------------|----------|
//! | `BYBIT_API_KEY`              | required |
//! | `BYBIT_API_SECRET`           | required |
//! | `BYBIT_TESTNET`              | `0`      |
//! | `BYBIT_RECV_WINDOW_MS`       | `5000`   |
//! | `TELEGRAM_BOT_TOKEN`         | required |
//! | `TELEGRAM_CHAT_ID`           | required |
//! | `TELEGRAM_THREAD_ID`         | unset    |
//! | `UTC_OFFSET_HOURS`           | `7`      |
//! | `EXECID_CACHE_MAX`           | `5000`   |
//! | `ORDER_CACHE_MAX`            | `3000`   |
//! | `ORDER_CACHE_TTL_SEC`        | `3600`   |
//! | `POSITION_CACHE_MAX`         | `2000`   |
//! | `POSITION_CACHE_TTL_SEC`     | `15`     |
//! | `WS_PING_INTERVAL_SEC`       | `20`     |
//! | `WS_PING_TIMEOUT_SEC`        | `10`     |
//! | `WS_RECONNECT_MAX_SLEEP_SEC` | `60`     |
//! | `DUPLICATE_POLICY`           | `skip`   |
//! | `LOG_LEVEL`                  | `info`   |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheLimits;
use crate::error::{RelayError, RelayResult};

/// Exchange credentials and endpoint selection.
#[derive(Clone)]
pub struct ExchangeSettings {
    pub api_key: String,
    pub api_secret: String,
    pub testnet: bool,
    /// Receive window for signed REST requests (ms).
    pub recv_window_ms: u64,
}

// Keep secrets out of `{:?}` output.
impl fmt::Debug for ExchangeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeSettings")
            .field("api_key", &mask(&self.api_key))
            .field("testnet", &self.testnet)
            .field("recv_window_ms", &self.recv_window_ms)
            .finish_non_exhaustive()
    }
}

/// Telegram bot destination.
#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    /// Forum topic to post into, if any.
    pub thread_id: Option<i64>,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &mask(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

/// Keep-alive and reconnect tuning for the private stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsSettings {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub reconnect_max_backoff: Duration,
}

/// What to do with the rest of a batch when an already-seen execution ID
/// shows up in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Skip the duplicate and continue with the next event.
    #[default]
    Skip,
    /// Stop processing the batch at the first duplicate. Matches the
    /// behavior of the first deployed version of this relay.
    AbandonBatch,
}

impl FromStr for DuplicatePolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "continue" => Ok(Self::Skip),
            "abandon_batch" | "abandon" => Ok(Self::AbandonBatch),
            other => Err(RelayError::Config(format!("DUPLICATE_POLICY: unknown value '{other}'"))),
        }
    }
}

/// Fully validated relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub exchange: ExchangeSettings,
    pub telegram: TelegramSettings,
    /// Flat offset used to render execution times.
    pub utc_offset_hours: i32,
    /// Capacity of the seen execution-ID set.
    pub exec_id_cache_max: usize,
    pub order_cache: CacheLimits,
    pub position_cache: CacheLimits,
    pub ws: WsSettings,
    pub duplicate_policy: DuplicatePolicy,
    pub log_level: String,
}

impl RelayConfig {
    /// Load from the process environment.
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let exchange = ExchangeSettings {
            api_key: env.required("BYBIT_API_KEY")?,
            api_secret: env.required("BYBIT_API_SECRET")?,
            testnet: env.flag("BYBIT_TESTNET"),
            recv_window_ms: env.parsed("BYBIT_RECV_WINDOW_MS", 5000)?,
        };

        let telegram = TelegramSettings {
            bot_token: env.required("TELEGRAM_BOT_TOKEN")?,
            chat_id: env.required("TELEGRAM_CHAT_ID")?,
            thread_id: env.optional_parsed("TELEGRAM_THREAD_ID")?,
        };

        let utc_offset_hours: i32 = env.parsed("UTC_OFFSET_HOURS", 7)?;
        if !(-23..=23).contains(&utc_offset_hours) {
            return Err(RelayError::Config(format!("UTC_OFFSET_HOURS out of range: {utc_offset_hours}")));
        }

        let exec_id_cache_max: usize = env.parsed("EXECID_CACHE_MAX", 5000)?;
        if exec_id_cache_max == 0 {
            return Err(RelayError::Config("EXECID_CACHE_MAX must be at least 1".into()));
        }

        let order_cache = CacheLimits {
            max_items: env.parsed("ORDER_CACHE_MAX", 3000)?,
            ttl: Duration::from_secs(env.parsed("ORDER_CACHE_TTL_SEC", 3600)?),
        };
        let position_cache = CacheLimits {
            max_items: env.parsed("POSITION_CACHE_MAX", 2000)?,
            ttl: Duration::from_secs(env.parsed("POSITION_CACHE_TTL_SEC", 15)?),
        };

        let ws = WsSettings {
            ping_interval: Duration::from_secs(env.parsed("WS_PING_INTERVAL_SEC", 20)?),
            ping_timeout: Duration::from_secs(env.parsed("WS_PING_TIMEOUT_SEC", 10)?),
            reconnect_max_backoff: Duration::from_secs(env.parsed("WS_RECONNECT_MAX_SLEEP_SEC", 60)?),
        };
        for (key, value) in [
            ("WS_PING_INTERVAL_SEC", ws.ping_interval),
            ("WS_PING_TIMEOUT_SEC", ws.ping_timeout),
            ("WS_RECONNECT_MAX_SLEEP_SEC", ws.reconnect_max_backoff),
        ] {
            if value.is_zero() {
                return Err(RelayError::Config(format!("{key} must be positive")));
            }
        }

        let duplicate_policy = match env.get("DUPLICATE_POLICY") {
            Some(v) => v.parse()?,
            None => DuplicatePolicy::default(),
        };

        Ok(Self {
            exchange,
            telegram,
            utc_offset_hours,
            exec_id_cache_max,
            order_cache,
            position_cache,
            ws,
            duplicate_policy,
            log_level: env.get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Trimmed, non-empty value.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> RelayResult<String> {
        self.get(key).ok_or_else(|| RelayError::Config(format!("missing env var: {key}")))
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key).as_deref(), Some("1" | "true" | "TRUE" | "yes"))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> RelayResult<T> {
        Ok(self.optional_parsed(key)?.unwrap_or(default))
    }

    fn optional_parsed<T: FromStr>(&self, key: &str) -> RelayResult<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| RelayError::Config(format!("{key}: cannot parse '{raw}'"))),
        }
    }
}

fn mask(secret: &str) -> String {
    let head: String = secret.chars().take(4).collect();
    format!("{head}***")
}
