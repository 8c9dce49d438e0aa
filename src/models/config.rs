use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint queried when no configuration overrides it.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users";

/// User configuration from UserTable Config.yaml
///
/// Contains the data source and logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "UserTable_Settings", default)]
    pub settings: TableSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    #[serde(rename = "Endpoint", default = "default_endpoint")]
    pub endpoint: String,

    /// Seconds before the startup fetch is abandoned.
    #[serde(rename = "Request Timeout", default = "default_request_timeout")]
    pub request_timeout: u32,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Log Directory", default = "default_log_directory")]
    pub log_directory: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout: default_request_timeout(),
            debug_mode: false,
            log_directory: default_log_directory(),
        }
    }
}

impl TableSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.request_timeout))
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> u32 {
    30
}

fn default_log_directory() -> String {
    "logs".to_string()
}
