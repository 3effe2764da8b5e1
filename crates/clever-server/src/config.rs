use clever_auth::session::MAX_SESSION_TTL;
use clever_auth::{CleverConfig, ConfigError};
use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Clever endpoints, credentials and authorization parameters
    #[serde(default)]
    pub provider: CleverConfig,
    /// Session cookie and store settings
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port must be > 0".into()));
        }
        self.provider.validate()?;
        if self.session.secret_key.is_empty() {
            return Err(ConfigError::Missing("session.secret_key".into()));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "session.cookie_name must not be empty".into(),
            ));
        }
        if self.session.ttl.is_zero() {
            return Err(ConfigError::InvalidValue("session.ttl must be > 0".into()));
        }
        if self.session.ttl > MAX_SESSION_TTL {
            return Err(ConfigError::InvalidValue(format!(
                "session.ttl must be at most {} days",
                MAX_SESSION_TTL.as_secs() / 86_400
            )));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Redirect URI registered with Clever for the current deployment mode.
    pub fn redirect_uri(&self) -> &str {
        self.provider.resolve_redirect_uri(self.server.production)
    }

    /// Whether session cookies carry the `Secure` attribute.
    /// Follows `server.production` unless `session.secure` is set.
    pub fn secure_cookies(&self) -> bool {
        self.session.secure.unwrap_or(self.server.production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Production mode: selects the production redirect URI and secure cookies.
    #[serde(default)]
    pub production: bool,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            production: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret the cookie signing key is derived from.
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Idle lifetime of a session.
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub ttl: Duration,
    #[serde(default)]
    pub secure: Option<bool>,
}

fn default_cookie_name() -> String {
    "clever_session".into()
}
fn default_session_ttl() -> Duration {
    clever_auth::session::DEFAULT_SESSION_TTL
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            cookie_name: default_cookie_name(),
            ttl: default_session_ttl(),
            secure: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("ttl", &self.ttl)
            .field("secure", &self.secure)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Prefix for structured overrides, e.g. `CLEVER__SERVER__PORT=9090`.
    pub const ENV_PREFIX: &str = "CLEVER";

    /// Default configuration file, read when present.
    pub const DEFAULT_CONFIG_PATH: &str = "clever.toml";

    /// Flat variables accepted for the settings deployments usually set directly.
    /// The first non-empty variable in each list wins.
    const ENV_ALIASES: &[(&str, &[&str])] = &[
        ("provider.client_id", &["CLEVER_CLIENT_ID", "CLIENT_ID"]),
        (
            "provider.client_secret",
            &["CLEVER_CLIENT_SECRET", "CLIENT_SECRET"],
        ),
        (
            "session.secret_key",
            &["CLEVER_APP_SECRET_KEY", "APP_SECRET_KEY"],
        ),
        ("server.port", &["PORT"]),
    ];

    #[derive(Debug, thiserror::Error)]
    pub enum LoadError {
        #[error("config build error: {0}")]
        Build(#[from] config::ConfigError),
        #[error("config validation error: {0}")]
        Invalid(#[from] clever_auth::ConfigError),
    }

    /// Loads configuration from the file at `path` (or `clever.toml`) and the process environment.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, LoadError> {
        load_config_from_env(path, std::env::vars().collect())
    }

    /// Loads configuration from a file and an explicit set of environment variables.
    pub fn load_config_from_env(
        path: Option<&str>,
        vars: HashMap<String, String>,
    ) -> Result<AppConfig, LoadError> {
        let path = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        let mut builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("provider.scopes")
                    .source(Some(vars.clone().into_iter().collect())),
            );

        for (key, names) in ENV_ALIASES {
            let value = names
                .iter()
                .find_map(|name| vars.get(*name).filter(|v| !v.is_empty()));
            if let Some(value) = value {
                builder = builder.set_override(*key, value.as_str())?;
            }
        }

        if let Some(flag) = vars.get("PRODUCTION") {
            builder = builder.set_override("server.production", is_production_flag(flag))?;
        }

        let merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        Ok(merged)
    }

    /// `PRODUCTION=TRUE` turns production mode on; any other value leaves it off.
    pub fn is_production_flag(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.provider.client_id = "abc".into();
        cfg.provider.client_secret = "shh".into();
        cfg.session.secret_key = "app-secret".into();
        cfg
    }

    #[test]
    fn default_config_is_incomplete() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_secret_key_fails() {
        let mut cfg = valid();
        cfg.session.secret_key.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Missing(field)) if field == "session.secret_key"
        ));
    }

    #[test]
    fn session_ttl_is_bounded() {
        let mut cfg = valid();
        cfg.session.ttl = Duration::ZERO;
        assert!(cfg.validate().is_err());

        cfg.session.ttl = MAX_SESSION_TTL;
        assert!(cfg.validate().is_ok());

        cfg.session.ttl = Duration::from_secs(20_000 * 365 * 24 * 3600);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue(msg)) if msg.contains("session.ttl")
        ));
    }

    #[test]
    fn invalid_log_level_fails() {
        let mut cfg = valid();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn production_switches_redirect_and_cookies() {
        let mut cfg = valid();
        assert_eq!(cfg.redirect_uri(), "http://localhost:8000/redirect");
        assert!(!cfg.secure_cookies());

        cfg.server.production = true;
        assert_eq!(
            cfg.redirect_uri(),
            "https://cleverinstantlogin.herokuapp.com/redirect"
        );
        assert!(cfg.secure_cookies());

        cfg.session.secure = Some(false);
        assert!(!cfg.secure_cookies());
    }

    #[test]
    fn addr_falls_back_to_unspecified() {
        let mut cfg = valid();
        cfg.server.host = "not-an-ip".into();
        cfg.server.port = 9000;
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = valid();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("app-secret"));
        assert!(!debug.contains("\"shh\""));
    }

    #[test]
    fn production_flag_parsing() {
        assert!(loader::is_production_flag("TRUE"));
        assert!(loader::is_production_flag("true"));
        assert!(!loader::is_production_flag("1"));
        assert!(!loader::is_production_flag(""));
        assert!(!loader::is_production_flag("FALSE"));
    }
}
