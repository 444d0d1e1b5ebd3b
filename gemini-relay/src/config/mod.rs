use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default Gemini REST endpoint.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default upload size limit (20MB).
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub model: ModelConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier (e.g., gemini-2.0-flash)
    pub name: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where uploads are staged until the model call finishes.
    pub dir: String,
    pub max_bytes: usize,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(RelayConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", None, is_prod)?,
            },
            model: ModelConfig {
                name: get_env("GEMINI_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_API_BASE), is_prod)?,
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS, is_prod)?,
            },
            uploads: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                max_bytes: parse_env("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES, is_prod)?,
            },
        })
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(&default.to_string()), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_falls_back_to_default_outside_prod() {
        let value = get_env("GEMINI_RELAY_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_key_in_prod() {
        let err = get_env("GEMINI_RELAY_TEST_UNSET_KEY", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn get_env_without_default_is_an_error() {
        let err = get_env("GEMINI_RELAY_TEST_UNSET_KEY", None, false).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn parse_env_uses_typed_default() {
        let value: u64 = parse_env("GEMINI_RELAY_TEST_UNSET_NUMBER", 42, false).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        std::env::set_var("GEMINI_RELAY_TEST_BAD_NUMBER", "not-a-number");
        let err = parse_env::<usize>("GEMINI_RELAY_TEST_BAD_NUMBER", 1, false).unwrap_err();
        assert!(err.to_string().contains("GEMINI_RELAY_TEST_BAD_NUMBER is invalid"));
    }
}
