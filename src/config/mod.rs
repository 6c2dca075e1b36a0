use std::env;
use std::str::FromStr;

use crate::services::error::AuthError;

const DEV_ACCESS_SECRET: &str = "dev-access-secret";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret";

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub token: TokenConfig,
    pub rate_limit: RateLimitConfig,
    /// Re-read the principal's live status on every authenticated request
    /// instead of trusting the status snapshot embedded in the token.
    pub revalidate_status: bool,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window_seconds: u64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AuthError::Config(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("campushub-auth"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            token: TokenConfig {
                access_secret: get_secret("ACCESS_TOKEN_SECRET", DEV_ACCESS_SECRET, is_prod)?,
                refresh_secret: get_secret("REFRESH_TOKEN_SECRET", DEV_REFRESH_SECRET, is_prod)?,
                access_expiry_minutes: parse_env("ACCESS_TOKEN_EXPIRY_MINUTES", "15", is_prod)?,
                refresh_expiry_days: parse_env("REFRESH_TOKEN_EXPIRY_DAYS", "7", is_prod)?,
                issuer: get_env("TOKEN_ISSUER", Some("campushub-auth"), is_prod)?,
                audience: get_env("TOKEN_AUDIENCE", Some("campushub"), is_prod)?,
            },
            rate_limit: RateLimitConfig {
                max_attempts: parse_env("AUTH_RATE_LIMIT_ATTEMPTS", "5", is_prod)?,
                window_seconds: parse_env("AUTH_RATE_LIMIT_WINDOW_SECONDS", "900", is_prod)?,
            },
            revalidate_status: parse_env("REVALIDATE_STATUS", "false", is_prod)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.token.access_expiry_minutes <= 0 {
            return Err(AuthError::Config(anyhow::anyhow!(
                "ACCESS_TOKEN_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.token.refresh_expiry_days <= 0 {
            return Err(AuthError::Config(anyhow::anyhow!(
                "REFRESH_TOKEN_EXPIRY_DAYS must be positive"
            )));
        }

        if self.token.access_secret.is_empty() || self.token.refresh_secret.is_empty() {
            return Err(AuthError::Config(anyhow::anyhow!(
                "Token signing secrets must not be empty"
            )));
        }

        if self.token.access_secret == self.token.refresh_secret {
            return Err(AuthError::Config(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
            )));
        }

        if self.rate_limit.max_attempts == 0 || self.rate_limit.window_seconds == 0 {
            return Err(AuthError::Config(anyhow::anyhow!(
                "Rate limit attempts and window must be positive"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AuthError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AuthError::Config(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AuthError::Config(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like `get_env` but warns loudly when a signing secret falls back to its
/// development default.
fn get_secret(key: &str, dev_default: &str, is_prod: bool) -> Result<String, AuthError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) if is_prod => Err(AuthError::Config(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        Err(_) => {
            tracing::warn!(key, "signing secret not set, using development default");
            Ok(dev_default.to_string())
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AuthError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AuthError::Config(anyhow::anyhow!("{}: {}", key, e)))
}
