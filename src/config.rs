//! Application configuration loaded from environment variables.
//!
//! All values have working defaults; the stream endpoint can be
//! overridden with `TICKERTAPE_WEBSOCKET_URL`, and the reconnect and
//! flash timings with `TICKERTAPE_RECONNECT_BASE_MS`,
//! `TICKERTAPE_MAX_RECONNECT_ATTEMPTS`, and `TICKERTAPE_FLASH_MS`.

use std::time::Duration;

/// Default stream endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:8080/ws";

/// Default base delay for exponential reconnect backoff.
const DEFAULT_RECONNECT_BASE: Duration = Duration::from_millis(1000);

/// Default cap on automatic reconnection attempts.
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Default duration a record keeps its flash flag set.
const DEFAULT_FLASH_DURATION: Duration = Duration::from_millis(500);

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stream: StreamConfig,
}

/// Stream-engine configuration values.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub websocket_url: String,
    /// Base delay for exponential backoff; attempt n waits base * 2^(n-1).
    pub reconnect_base_delay: Duration,
    /// After this many failed attempts the engine stays disconnected.
    pub max_reconnect_attempts: u32,
    /// How long a record keeps its flash flag set after an update.
    pub flash_duration: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            reconnect_base_delay: DEFAULT_RECONNECT_BASE,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            flash_duration: DEFAULT_FLASH_DURATION,
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// Unset or empty variables fall back to the defaults above.
///
/// # Errors
///
/// Returns [`TapeError::Config`](crate::TapeError::Config) if a numeric
/// variable is set but cannot be parsed.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url = non_empty_var("TICKERTAPE_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());

    let reconnect_base_delay = match non_empty_var("TICKERTAPE_RECONNECT_BASE_MS") {
        Some(raw) => Duration::from_millis(parse_numeric("TICKERTAPE_RECONNECT_BASE_MS", &raw)?),
        None => DEFAULT_RECONNECT_BASE,
    };

    let max_reconnect_attempts = match non_empty_var("TICKERTAPE_MAX_RECONNECT_ATTEMPTS") {
        Some(raw) => parse_numeric("TICKERTAPE_MAX_RECONNECT_ATTEMPTS", &raw)? as u32,
        None => DEFAULT_MAX_RECONNECT_ATTEMPTS,
    };

    let flash_duration = match non_empty_var("TICKERTAPE_FLASH_MS") {
        Some(raw) => Duration::from_millis(parse_numeric("TICKERTAPE_FLASH_MS", &raw)?),
        None => DEFAULT_FLASH_DURATION,
    };

    Ok(AppConfig {
        stream: StreamConfig {
            websocket_url,
            reconnect_base_delay,
            max_reconnect_attempts,
            flash_duration,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_numeric(name: &str, raw: &str) -> crate::Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| crate::TapeError::Config(format!("{name} must be a positive integer, got {raw:?}")))
}
