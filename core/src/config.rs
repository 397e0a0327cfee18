//! Client configuration.
//!
//! `ClientConfig` is the plain set of values the dashboard hands the client:
//! backend host, workspace and bearer token. `SharedConfig` is the handle the
//! client keeps; it is read on every request, so a token refresh or
//! workspace switch applies to the next call without rebuilding anything.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ConfigError;

pub const HOST_VAR: &str = "DASHBOARD_API_HOST";
pub const WORKSPACE_VAR: &str = "DASHBOARD_WORKSPACE_ID";
pub const TOKEN_VAR: &str = "DASHBOARD_API_TOKEN";

/// Fixed version prefix appended to the host.
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub workspace_id: String,
    pub token: String,
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        workspace_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            workspace_id: workspace_id.into(),
            token: token.into(),
        }
    }

    /// Load from `DASHBOARD_API_HOST`, `DASHBOARD_WORKSPACE_ID` and
    /// `DASHBOARD_API_TOKEN`. Only the host is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_VAR).ok_or(ConfigError::MissingVar(HOST_VAR))?;
        Ok(Self {
            host,
            workspace_id: lookup(WORKSPACE_VAR).unwrap_or_default(),
            token: lookup(TOKEN_VAR).unwrap_or_default(),
        })
    }

    /// `{host}/api/v1`, without a doubled slash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), API_PREFIX)
    }
}

/// Cloneable handle to a `ClientConfig` shared between the client and
/// whoever owns the credentials.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ClientConfig>>,
}

impl SharedConfig {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> ClientConfig {
        self.read().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = token.into();
    }

    pub fn set_workspace_id(&self, workspace_id: impl Into<String>) {
        self.write().workspace_id = workspace_id.into();
    }

    pub fn replace(&self, config: ClientConfig) {
        *self.write() = config;
    }

    // Every write is a single assignment; poisoned guards are still consistent.
    fn read(&self) -> RwLockReadGuard<'_, ClientConfig> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClientConfig> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl From<ClientConfig> for SharedConfig {
    fn from(config: ClientConfig) -> Self {
        Self::new(config)
    }
}
