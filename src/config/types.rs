use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for smscd
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listeners accept incoming submissions
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,

    /// Shared ledger store
    #[serde(default)]
    pub store: StoreConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Listener name (for logging and record source tags)
    pub name: String,

    /// Bind address
    pub address: SocketAddr,

    /// Which endpoint set this listener exposes
    #[serde(default)]
    pub profile: EndpointProfile,
}

/// Endpoint set exposed by a listener.
///
/// The simulator emulates three carrier delivery paths: the full web
/// interface, the dedicated SMS-handler port, and the privileged port-80
/// legacy path. The two SMS-only paths expose just submission and status.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProfile {
    #[default]
    Web,
    Sms,
    Legacy,
}

impl EndpointProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Sms => "sms",
            Self::Legacy => "legacy",
        }
    }
}

/// Shared ledger store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the shared ledger file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// FIFO capacity of the ledger
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            capacity: default_capacity(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("shared_messages.json")
}

fn default_capacity() -> usize {
    100
}

/// Global settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable structured JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Per-request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Humantime serde support module
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
