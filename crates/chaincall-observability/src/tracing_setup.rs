//! Tracing / logging initialisation helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding filter directives, e.g.
/// `CHAINCALL_LOG=chaincall_evm=trace`. When set and non-empty it replaces
/// the directives of the [`LogConfig`].
pub const LOG_ENV: &str = "CHAINCALL_LOG";

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("invalid log filter '{directives}': {reason}")]
    Filter { directives: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialised,
}

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: crate name → level (`chaincall-evm` → `debug`)
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_component(mut self, component: impl Into<String>, level: impl Into<String>) -> Self {
        self.components.insert(component.into(), level.into());
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// `EnvFilter` directive string: `"info,chaincall_evm=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

fn filter_error(directives: &str, reason: impl std::fmt::Display) -> LogInitError {
    LogInitError::Filter {
        directives: directives.to_string(),
        reason: reason.to_string(),
    }
}

/// The filter `init_tracing` installs: [`LOG_ENV`] when it is set,
/// otherwise the config's directives.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, LogInitError> {
    let builder = EnvFilter::builder().with_env_var(LOG_ENV);
    match std::env::var(LOG_ENV) {
        Ok(env) if !env.trim().is_empty() => {
            builder.try_from_env().map_err(|e| filter_error(&env, e))
        }
        _ => {
            let directives = config.directives();
            builder.parse(&directives).map_err(|e| filter_error(&directives, e))
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Call once at startup. A second call fails with
/// [`LogInitError::AlreadyInitialised`] and leaves the first subscriber in
/// place.
pub fn init_tracing(config: &LogConfig) -> Result<(), LogInitError> {
    let filter = env_filter(config)?;
    let directives = filter.to_string();

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };
    installed.map_err(|_| LogInitError::AlreadyInitialised)?;

    tracing::debug!(directives = %directives, json = config.json, "tracing initialised");
    Ok(())
}
