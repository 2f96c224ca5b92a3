//! Configuration management

use clap::Parser;
use config::{
    builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder,
    ConfigError as BuilderError, Environment, File,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// Prefix for nested environment overrides, e.g. `AUTHGATE_SERVER__PORT=8080`
const ENV_PREFIX: &str = "AUTHGATE";

/// Stand-alone variables honoured for compatibility with existing deployments
const LEGACY_SECRET_VAR: &str = "JWT_SECRET";
const LEGACY_TTL_VAR: &str = "JWT_EXPIRE_MINUTES";

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: u64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence:
    /// CLI args > JWT_* variables > AUTHGATE_* variables > config file > defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::from_args(&cli_args)
    }

    /// Load configuration for already-parsed command-line arguments
    pub fn from_args(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = with_defaults(ConfigBuilder::builder())?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string(),
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(secret) = std::env::var(LEGACY_SECRET_VAR) {
            builder = builder.set_override("security.jwt_secret", secret)?;
        }
        if let Ok(minutes) = std::env::var(LEGACY_TTL_VAR) {
            let minutes: u64 = minutes.trim().parse().map_err(|_| {
                ConfigError::InvalidSecurity(format!(
                    "{} must be a whole number of minutes",
                    LEGACY_TTL_VAR
                ))
            })?;
            builder = builder.set_override("security.token_ttl_minutes", minutes)?;
        }

        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn with_defaults(
    builder: Builder<DefaultState>,
) -> Result<Builder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("database.path", "./data/authgate.db")?
        .set_default("database.connection_pool_size", 10)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("database.operation_timeout", 10000)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.max_backups", 5)?
        // No usable default: an empty secret fails validation
        .set_default("security.jwt_secret", "")?
        .set_default("security.token_ttl_minutes", 30)?
        .set_default("security.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
        .set_default("security.allowed_origins", vec!["*"])?)
}

/// Command-line arguments for configuration override
#[derive(Debug, Default, Parser)]
#[command(name = "authgate")]
#[command(about = "User registration and token authentication service", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: u32,
    pub busy_timeout: u64,      // milliseconds
    pub operation_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase(
                "connection_pool_size must be greater than 0".to_string(),
            ));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase(
                "busy_timeout must be greater than 0".to_string(),
            ));
        }

        if self.operation_timeout == 0 {
            return Err(ConfigError::InvalidDatabase(
                "operation_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "level must be one of: {:?}",
                valid_levels
            )));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "format must be one of: {:?}",
                valid_formats
            )));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "output must be one of: {:?}",
                valid_outputs
            )));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string(),
            ));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging(
                "max_backups must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: u64,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
}

// Keeps the signing secret out of `{:?}` output
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidSecurity(
                "jwt_secret must be set (security.jwt_secret or JWT_SECRET)".to_string(),
            ));
        }

        if self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(ConfigError::InvalidSecurity(format!(
                "token_ttl_minutes must be at most {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidSecurity(
                "bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity(
                "allowed_origins cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.token_ttl_minutes)
            .ok()
            .filter(|minutes| *minutes as u64 <= MAX_TOKEN_TTL_MINUTES)
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                ConfigError::InvalidSecurity(format!(
                    "token_ttl_minutes out of range: {}",
                    self.token_ttl_minutes
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    /// Variables `from_args` reads, cleared around every environment test
    const ENV_VARS: &[&str] = &[
        LEGACY_SECRET_VAR,
        LEGACY_TTL_VAR,
        "AUTHGATE_SECURITY__JWT_SECRET",
        "AUTHGATE_SECURITY__TOKEN_TTL_MINUTES",
        "AUTHGATE_SERVER__PORT",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes access to the process environment for one test
    struct EnvGuard {
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn new(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            for name in ENV_VARS {
                std::env::remove_var(name);
            }
            for (name, value) in vars {
                std::env::set_var(name, value);
            }
            Self { _lock: lock }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for name in ENV_VARS {
                std::env::remove_var(name);
            }
        }
    }

    fn args_with_file(file: &tempfile::NamedTempFile) -> CliArgs {
        CliArgs {
            config: Some(file.path().to_path_buf()),
            ..CliArgs::default()
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_minutes: 30,
            bcrypt_cost: 4,
            allowed_origins: vec!["*".to_string()],
        }
    }

    #[test]
    fn test_file_on_top_of_defaults() {
        let _env = EnvGuard::new(&[]);
        let file = write_config(
            r#"
            [security]
            jwt_secret = "file-secret"
            "#,
        );

        let config = Config::from_args(&args_with_file(&file)).unwrap();
        assert_eq!(config.security.jwt_secret, "file-secret");
        assert_eq!(config.security.token_ttl_minutes, 30);
        assert_eq!(config.security.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.connection_pool_size, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_without_secret_is_fatal() {
        let _env = EnvGuard::new(&[]);
        let file = write_config(
            r#"
            [server]
            port = 9000
            "#,
        );

        let err = Config::from_args(&args_with_file(&file)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSecurity(_)));
    }

    #[test]
    fn test_from_args_prefixed_env_overrides_file() {
        let _env = EnvGuard::new(&[
            ("AUTHGATE_SECURITY__JWT_SECRET", "prefixed-secret"),
            ("AUTHGATE_SERVER__PORT", "9100"),
        ]);
        let file = write_config(
            r#"
            [server]
            port = 9000

            [security]
            jwt_secret = "file-secret"
            token_ttl_minutes = 45
            "#,
        );

        let config = Config::from_args(&args_with_file(&file)).unwrap();
        assert_eq!(config.security.jwt_secret, "prefixed-secret");
        assert_eq!(config.security.token_ttl_minutes, 45);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_from_args_legacy_vars_override_prefixed() {
        let _env = EnvGuard::new(&[
            ("AUTHGATE_SECURITY__JWT_SECRET", "prefixed-secret"),
            ("AUTHGATE_SECURITY__TOKEN_TTL_MINUTES", "60"),
            (LEGACY_SECRET_VAR, "legacy-secret"),
            (LEGACY_TTL_VAR, " 15 "),
        ]);
        let file = write_config(
            r#"
            [security]
            jwt_secret = "file-secret"
            token_ttl_minutes = 45
            "#,
        );

        let config = Config::from_args(&args_with_file(&file)).unwrap();
        assert_eq!(config.security.jwt_secret, "legacy-secret");
        assert_eq!(config.security.token_ttl_minutes, 15);
    }

    #[test]
    fn test_from_args_cli_overrides_env() {
        let _env = EnvGuard::new(&[
            (LEGACY_SECRET_VAR, "legacy-secret"),
            ("AUTHGATE_SERVER__PORT", "9100"),
        ]);

        let args = CliArgs {
            host: Some("0.0.0.0".to_string()),
            port: Some(9200),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };

        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.security.token_ttl_minutes, 30);
    }

    #[test]
    fn test_from_args_requires_secret() {
        {
            let _env = EnvGuard::new(&[]);
            let err = Config::from_args(&CliArgs::default()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSecurity(_)));
        }

        let _env = EnvGuard::new(&[(LEGACY_SECRET_VAR, "   ")]);
        let err = Config::from_args(&CliArgs::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSecurity(_)));
    }

    #[test]
    fn test_from_args_rejects_bad_legacy_ttl() {
        for minutes in ["soon", "-5", "9223372036854775807"] {
            let _env = EnvGuard::new(&[
                (LEGACY_SECRET_VAR, "legacy-secret"),
                (LEGACY_TTL_VAR, minutes),
            ]);

            let err = Config::from_args(&CliArgs::default()).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidSecurity(_)),
                "{}: {:?}",
                minutes,
                err
            );
        }
    }

    #[test]
    fn test_from_args_missing_config_file() {
        let _env = EnvGuard::new(&[(LEGACY_SECRET_VAR, "legacy-secret")]);

        let args = CliArgs {
            config: Some(PathBuf::from("/nonexistent/authgate.toml")),
            ..CliArgs::default()
        };
        assert!(matches!(
            Config::from_args(&args),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_security_validation() {
        assert!(security().validate().is_ok());

        let blank = SecurityConfig {
            jwt_secret: "   ".to_string(),
            ..security()
        };
        assert!(blank.validate().is_err());

        let weak = SecurityConfig {
            bcrypt_cost: 3,
            ..security()
        };
        assert!(weak.validate().is_err());
    }

    #[test]
    fn test_security_debug_redacts_secret() {
        let rendered = format!("{:?}", security());
        assert!(!rendered.contains("unit-test-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_zero_ttl_is_allowed() {
        let config = SecurityConfig {
            token_ttl_minutes: 0,
            ..security()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.token_ttl().unwrap(), chrono::Duration::zero());
    }

    #[test]
    fn test_oversized_ttl_is_rejected() {
        let at_limit = SecurityConfig {
            token_ttl_minutes: MAX_TOKEN_TTL_MINUTES,
            ..security()
        };
        assert!(at_limit.validate().is_ok());
        assert_eq!(at_limit.token_ttl().unwrap(), chrono::Duration::days(365));

        for minutes in [MAX_TOKEN_TTL_MINUTES + 1, u64::MAX / 2, u64::MAX] {
            let config = SecurityConfig {
                token_ttl_minutes: minutes,
                ..security()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidSecurity(_))
            ));
            assert!(matches!(
                config.token_ttl(),
                Err(ConfigError::InvalidSecurity(_))
            ));
        }
    }

    #[test]
    fn test_logging_validation() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            output: "file".to_string(),
            log_file: None,
            max_backups: 5,
        };
        assert!(config.validate().is_err());

        let config = LoggingConfig {
            log_file: Some(PathBuf::from("./logs/authgate.log")),
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
