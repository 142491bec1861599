//! Search backend connection configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search cluster.
    #[serde(default = "default_url")]
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Optional basic-auth user name.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout(),
            username: None,
            password: None,
        }
    }
}

fn default_url() -> String {
    "http://elasticsearch:9200".to_string()
}

fn default_timeout() -> u64 {
    30
}
