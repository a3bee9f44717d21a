use std::{env, path::PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, Map};
use serde::Deserialize;

const DEFAULT_APP_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/app/config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub app_config: PathBuf,
    pub max_body_bytes: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            app_config: PathBuf::from(DEFAULT_APP_CONFIG),
            max_body_bytes: 1024 * 1024,
            log_filter: "info".into(),
        }
    }
}

/// Reads `server.toml` from the working directory (optional) and the process
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from("server", env::vars().collect())
}

/// Layers defaults, the optional settings file and `APP__*` variables.
/// `SERVER_BIND` is honoured when `APP__BIND_ADDR` is absent.
pub fn load_settings_from(file: &str, vars: Map<String, String>) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let server_bind = vars.get("SERVER_BIND").cloned();
    let explicit_bind = vars.contains_key("APP__BIND_ADDR");

    let mut settings: Settings = Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("app_config", defaults.app_config.to_string_lossy().into_owned())?
        .set_default("max_body_bytes", defaults.max_body_bytes as i64)?
        .set_default("log_filter", defaults.log_filter)?
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .build()
        .context("failed to read server settings")?
        .try_deserialize()
        .context("invalid server settings")?;

    if !explicit_bind {
        if let Some(bind) = server_bind {
            settings.bind_addr = bind;
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
