use std::env;

use auth::AuthSettings;
use auth::AuthSettingsError;
use auth::HashingParams;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub grpc_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

/// Argon2id work factor.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// There are no built-in defaults: every key must come from one of these sources.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }

    /// Validated settings for token issuance and password hashing.
    ///
    /// # Errors
    /// * `AuthSettingsError` - Secret too short, non-positive lifetimes or bad work factor
    pub fn auth_settings(&self) -> Result<AuthSettings, AuthSettingsError> {
        AuthSettings::new(
            self.jwt.secret.as_bytes().to_vec(),
            chrono::Duration::minutes(self.jwt.access_token_ttl_minutes),
            chrono::Duration::days(self.jwt.refresh_token_ttl_days),
            HashingParams {
                memory_kib: self.password.memory_kib,
                iterations: self.password.iterations,
                parallelism: self.password.parallelism,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgresql://localhost/identity".to_string(),
            },
            server: ServerConfig {
                http_port: 3000,
                grpc_port: 50051,
            },
            jwt: JwtConfig {
                secret: secret.to_string(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_days: 7,
            },
            password: PasswordConfig {
                memory_kib: 19456,
                iterations: 2,
                parallelism: 1,
            },
            kafka: KafkaConfig {
                brokers: "localhost:9092".to_string(),
                topic: "identity-events".to_string(),
            },
        }
    }

    #[test]
    fn test_auth_settings_from_config() {
        let settings = config("a-signing-secret-that-is-long-enough-123")
            .auth_settings()
            .expect("Settings should be valid");

        assert_eq!(settings.access_token_ttl(), chrono::Duration::minutes(15));
        assert_eq!(settings.refresh_token_ttl(), chrono::Duration::days(7));
        assert_eq!(settings.hashing().memory_kib, 19456);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            config("short").auth_settings(),
            Err(AuthSettingsError::SecretTooShort { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config("a-signing-secret-that-is-long-enough-123"));
        assert!(!rendered.contains("a-signing-secret"));
    }
}
