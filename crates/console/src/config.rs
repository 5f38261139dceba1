//! Console configuration (redirect targets).
//!
//! Defaults match the stock console; every value can be overridden from the
//! environment.

use serde::{Deserialize, Serialize};

use tonerdesk_core::{ConsoleError, ConsoleResult};

pub const LOGIN_PATH_ENV: &str = "TONERDESK_LOGIN_PATH";
pub const HOME_PATH_ENV: &str = "TONERDESK_HOME_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Where denied navigations and anonymous root requests are sent.
    pub login_path: String,
    /// Where authenticated root requests are sent.
    pub home_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by `TONERDESK_LOGIN_PATH` / `TONERDESK_HOME_PATH`.
    pub fn from_env() -> ConsoleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> ConsoleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(LOGIN_PATH_ENV) {
            config.login_path = path;
        }
        if let Some(path) = lookup(HOME_PATH_ENV) {
            config.home_path = path;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        for (name, path) in [("login_path", &self.login_path), ("home_path", &self.home_path)] {
            if !path.starts_with('/') || path.trim_matches('/').is_empty() {
                return Err(ConsoleError::validation(format!(
                    "{name} must be an absolute, non-root path (got '{path}')"
                )));
            }
        }
        if self.login_path.eq_ignore_ascii_case(&self.home_path) {
            return Err(ConsoleError::validation("login_path and home_path must differ"));
        }
        Ok(())
    }
}
