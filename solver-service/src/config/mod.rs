use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::providers::DEFAULT_MODEL;

/// Default OpenAI-compatible API base.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Near-deterministic sampling for worked solutions.
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default request body ceiling for uploads (16 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    pub http: HttpConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Missing outside production; solves then fail with a provider error.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_upload_bytes: usize,
    /// `["*"]` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl HttpConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

impl SolverConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, PORT/DEBUG and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let api_key = if is_prod {
            Some(get_env("OPENAI_API_KEY", None, is_prod)?)
        } else {
            env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
        };

        Ok(SolverConfig {
            common: common_config,
            provider: ProviderConfig {
                api_key: api_key.map(Secret::new),
                base_url: get_env("OPENAI_BASE_URL", Some(DEFAULT_BASE_URL), is_prod)?,
                model: get_env("SOLVER_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                temperature: parse_env(
                    "SOLVER_TEMPERATURE",
                    &get_env(
                        "SOLVER_TEMPERATURE",
                        Some(&DEFAULT_TEMPERATURE.to_string()),
                        is_prod,
                    )?,
                )?,
            },
            http: HttpConfig {
                max_upload_bytes: parse_env(
                    "MAX_UPLOAD_BYTES",
                    &get_env(
                        "MAX_UPLOAD_BYTES",
                        Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
                        is_prod,
                    )?,
                )?,
                cors_allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("*"),
                    is_prod,
                )?),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::Mutex;

    // Environment variables are process-global; load tests take turns.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 12] = [
        "PORT",
        "APP__PORT",
        "DEBUG",
        "APP__DEBUG",
        "ENVIRONMENT",
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "SOLVER_MODEL",
        "SOLVER_TEMPERATURE",
        "MAX_UPLOAD_BYTES",
        "CORS_ALLOWED_ORIGINS",
        "OTLP_ENDPOINT",
    ];

    fn load_with_env(vars: &[(&str, &str)]) -> Result<SolverConfig, AppError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        for key in VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let config = SolverConfig::load();

        for key in VARS {
            env::remove_var(key);
        }

        config
    }

    #[test]
    fn load_applies_defaults_outside_production() {
        let config = load_with_env(&[]).expect("Failed to load configuration");

        assert_eq!(config.common.port, 8000);
        assert!(!config.common.debug);
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.provider.model, "gpt-4.1-nano");
        assert!((config.provider.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.http.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.http.cors_allowed_origins, vec!["*"]);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn load_reads_overrides() {
        let config = load_with_env(&[
            ("PORT", "9100"),
            ("DEBUG", "true"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SOLVER_MODEL", "gpt-4o-mini"),
            ("SOLVER_TEMPERATURE", "0.3"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("CORS_ALLOWED_ORIGINS", "https://app.example"),
            ("OTLP_ENDPOINT", "http://tempo:4317"),
        ])
        .expect("Failed to load configuration");

        assert_eq!(config.common.port, 9100);
        assert!(config.common.debug);
        assert_eq!(
            config.provider.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk-test")
        );
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert!((config.provider.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.http.max_upload_bytes, 1024);
        assert_eq!(config.http.cors_allowed_origins, vec!["https://app.example"]);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://tempo:4317"));
    }

    #[test]
    fn load_treats_empty_api_key_as_missing() {
        let config =
            load_with_env(&[("OPENAI_API_KEY", "")]).expect("Failed to load configuration");
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn production_requires_api_key() {
        let err = load_with_env(&[("ENVIRONMENT", "prod")]).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn production_requires_base_url() {
        let err = load_with_env(&[("ENVIRONMENT", "prod"), ("OPENAI_API_KEY", "sk-test")])
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_BASE_URL"));
    }

    #[test]
    fn load_rejects_invalid_upload_limit() {
        let err = load_with_env(&[("MAX_UPLOAD_BYTES", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_BYTES"));
    }

    #[test]
    fn parse_origins_splits_and_trims() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn parse_origins_defaults_to_any() {
        assert_eq!(parse_origins(" , "), vec!["*"]);
    }

    #[test]
    fn parse_env_reports_key_on_failure() {
        let err = parse_env::<usize>("MAX_UPLOAD_BYTES", "lots").unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_BYTES"));

        let value: f32 = parse_env("SOLVER_TEMPERATURE", "0.1").unwrap();
        assert!((value - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn wildcard_origin_allows_any() {
        let http = HttpConfig {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: vec!["*".to_string()],
        };
        assert!(http.allows_any_origin());

        let http = HttpConfig {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: vec!["https://app.example".to_string()],
        };
        assert!(!http.allows_any_origin());
    }
}
