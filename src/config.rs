// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PHISHGUARD_BASE_URL` | Marketplace server base URL | `http://127.0.0.1:8000` |
//! | `PHISHGUARD_TIMEOUT_SECS` | Request timeout in seconds | `8` |
//! | `PHISHGUARD_PERSIST_SESSION` | Keep the session across restarts | `false` |
//! | `PHISHGUARD_AUTO_SIGN_OUT` | Force local sign-out on a 401 | `true` |
//! | `PHISHGUARD_DATA_DIR` | Directory for the credential store | `.phishguard` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`, binary only) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::storage::paths::DEFAULT_DATA_DIR;

/// Environment variable name for the server base URL.
pub const BASE_URL_ENV: &str = "PHISHGUARD_BASE_URL";

/// Environment variable name for the request timeout (seconds).
pub const TIMEOUT_SECS_ENV: &str = "PHISHGUARD_TIMEOUT_SECS";

/// Environment variable name for the session persistence flag.
pub const PERSIST_SESSION_ENV: &str = "PHISHGUARD_PERSIST_SESSION";

/// Environment variable name for the 401 forced sign-out policy.
pub const AUTO_SIGN_OUT_ENV: &str = "PHISHGUARD_AUTO_SIGN_OUT";

/// Environment variable name for the credential store directory.
pub const DATA_DIR_ENV: &str = "PHISHGUARD_DATA_DIR";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Client runtime configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Marketplace server base URL.
    pub base_url: Url,
    /// Per-request timeout; on expiry a call surfaces `NetworkUnavailable`.
    pub request_timeout: Duration,
    /// Whether the credential survives a process restart. When false a
    /// fresh start always begins `Anonymous`.
    pub persist_across_restart: bool,
    /// Whether a 401 forces an immediate local sign-out (see design notes;
    /// the looser policy merely surfaces the error).
    pub auto_sign_out_on_unauthorized: bool,
    /// Directory holding the durable credential store. Unused when
    /// `persist_across_restart` is false.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            persist_across_restart: false,
            auto_sign_out_on_unauthorized: true,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(BASE_URL_ENV) {
            config.base_url = Url::parse(&raw)
                .map_err(|e| ClientError::validation(format!("{BASE_URL_ENV}: {e}")))?;
        }

        if let Ok(raw) = env::var(TIMEOUT_SECS_ENV) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ClientError::validation(format!("{TIMEOUT_SECS_ENV}: not a number")))?;
            if secs == 0 {
                return Err(ClientError::validation(format!(
                    "{TIMEOUT_SECS_ENV}: must be positive"
                )));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = env::var(PERSIST_SESSION_ENV) {
            config.persist_across_restart = parse_bool(&raw);
        }

        if let Ok(raw) = env::var(AUTO_SIGN_OUT_ENV) {
            config.auto_sign_out_on_unauthorized = parse_bool(&raw);
        }

        if let Ok(raw) = env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(raw);
        }

        Ok(config)
    }

    /// Override the base URL (builder style, mainly for tests and tools).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the persistence flag.
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist_across_restart = persist;
        self
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
