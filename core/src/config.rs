//! Client configuration.
//!
//! The core never reads the environment or the filesystem. Hosts build a
//! `ClientConfig` in code or deserialize one from their own config source;
//! every field has a default so partial documents are accepted.

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.dooki.com.br/v2";

pub const USER_AGENT: &str = concat!("yampi-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Store slug that resource routes are scoped under.
    pub merchant_alias: Option<String>,
    pub user_agent: String,
    /// Applied by transports that support it (default: 30).
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            merchant_alias: None,
            user_agent: USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_merchant_alias(mut self, alias: &str) -> Self {
        self.merchant_alias = Some(alias.to_string());
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
