use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

fn default_port() -> u16 {
    8000
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        // Plain PORT/DEBUG win over the APP__ prefixed forms so the service
        // behaves like any other PaaS-hosted process.
        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", env::var("PORT").ok())?
            .set_override_option("debug", env::var("DEBUG").ok().map(|v| parse_flag(&v)))?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Log level implied by the debug flag.
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

/// Only a case-insensitive `true` turns a flag on.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
