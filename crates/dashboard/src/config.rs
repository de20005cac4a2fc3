use std::time::Duration;

use shelfwatch_client::push::push_url_from_api;
use shelfwatch_core::pagination::DEFAULT_PAGE_SIZE;
use shelfwatch_core::time::NEW_EVENT_WINDOW_SECS;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Dashboard configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Backend HTTP base URL.
    pub api_url: String,
    /// Socket.IO WebSocket endpoint.
    pub push_url: String,
    pub page_size: u32,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// How long a detection counts as new.
    pub new_event_window: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                          |
    /// |------------------------------------|----------------------------------|
    /// | `SHELFWATCH_API_URL`               | `http://localhost:5000`          |
    /// | `SHELFWATCH_PUSH_URL`              | derived from `SHELFWATCH_API_URL`|
    /// | `SHELFWATCH_PAGE_SIZE`             | `10`                             |
    /// | `SHELFWATCH_POLL_INTERVAL_SECS`    | `30`                             |
    /// | `SHELFWATCH_REQUEST_TIMEOUT_SECS`  | `10`                             |
    /// | `SHELFWATCH_NEW_EVENT_WINDOW_SECS` | `300`                            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("SHELFWATCH_API_URL") {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "SHELFWATCH_API_URL",
                })
            }
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => "http://localhost:5000".to_string(),
        };

        let push_url = lookup("SHELFWATCH_PUSH_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| push_url_from_api(&api_url));

        let page_size = positive(&lookup, "SHELFWATCH_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE))?;
        let page_size = u32::try_from(page_size).map_err(|_| ConfigError::InvalidNumber {
            var: "SHELFWATCH_PAGE_SIZE",
            value: page_size.to_string(),
        })?;

        let poll_secs = positive(&lookup, "SHELFWATCH_POLL_INTERVAL_SECS", 30)?;
        let timeout_secs = positive(&lookup, "SHELFWATCH_REQUEST_TIMEOUT_SECS", 10)?;
        let window_secs = positive(
            &lookup,
            "SHELFWATCH_NEW_EVENT_WINDOW_SECS",
            NEW_EVENT_WINDOW_SECS as u64,
        )?;

        Ok(Self {
            api_url,
            push_url,
            page_size,
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            new_event_window: Duration::from_secs(window_secs),
        })
    }

    /// The `is_new` window as a chrono duration.
    pub fn new_event_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.new_event_window)
            .unwrap_or_else(|_| shelfwatch_core::time::default_new_event_window())
    }
}

fn positive<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
