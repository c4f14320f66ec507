//! Configuration loading and constants.
//!
//! Every setting has a default, so running without a configuration file gives
//! the fixed behavior: HTTPS on `0.0.0.0:8443`, `cert.pem`/`key.pem` in the
//! working directory, and the working directory served as static content.
//! `AppConfig` is the root configuration struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Network
// =============================================================================

/// Default HTTPS port
pub const DEFAULT_PORT: u16 = 8443;

/// Bind address for all interfaces
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Public address used only to learn which local interface has an outbound route.
/// No datagram is ever sent to it.
pub const ROUTE_LOOKUP_ADDR: &str = "8.8.8.8:80";

/// Host shown to the operator when the LAN address cannot be determined
pub const FALLBACK_HOST: &str = "localhost";

/// Loopback URL without the port, shown in the operator banner
pub const LOOPBACK_URL_BASE: &str = formatcp!("https://{}", FALLBACK_HOST);

// =============================================================================
// Certificate
// =============================================================================

/// Default certificate file, relative to the working directory
pub const DEFAULT_CERT_FILE: &str = "cert.pem";

/// Default private key file, relative to the working directory
pub const DEFAULT_KEY_FILE: &str = "key.pem";

/// Subject common name of generated certificates
pub const DEFAULT_COMMON_NAME: &str = "localhost";

/// Validity of generated certificates in days
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

// =============================================================================
// Response headers added to every response
// =============================================================================

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const PERMISSIONS_POLICY: &str = "camera=(*)";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default directory to serve
pub const DEFAULT_SERVE_ROOT: &str = ".";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "lanserve=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTPS listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Certificate provisioning
    #[serde(default)]
    pub tls: TlsConfig,
    /// Static file serving
    #[serde(default)]
    pub serve: ServeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTPS listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }
}

/// Self-signed certificate settings
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path of the PEM certificate (default: cert.pem)
    #[serde(default = "TlsConfig::default_cert_path")]
    pub cert_path: PathBuf,
    /// Path of the unencrypted PEM private key (default: key.pem)
    #[serde(default = "TlsConfig::default_key_path")]
    pub key_path: PathBuf,
    /// Subject CN for generated certificates (default: localhost)
    #[serde(default = "TlsConfig::default_common_name")]
    pub common_name: String,
    /// Validity of generated certificates in days (default: 365)
    #[serde(default = "TlsConfig::default_validity_days")]
    pub validity_days: u32,
    /// Replace an existing certificate whose notAfter has passed (default: true)
    #[serde(default = "TlsConfig::default_regenerate_expired")]
    pub regenerate_expired: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            common_name: Self::default_common_name(),
            validity_days: Self::default_validity_days(),
            regenerate_expired: Self::default_regenerate_expired(),
        }
    }
}

impl TlsConfig {
    fn default_cert_path() -> PathBuf {
        PathBuf::from(DEFAULT_CERT_FILE)
    }

    fn default_key_path() -> PathBuf {
        PathBuf::from(DEFAULT_KEY_FILE)
    }

    fn default_common_name() -> String {
        DEFAULT_COMMON_NAME.to_string()
    }

    fn default_validity_days() -> u32 {
        DEFAULT_VALIDITY_DAYS
    }

    fn default_regenerate_expired() -> bool {
        true
    }
}

/// Static file serving
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Directory served as the document root (default: working directory)
    #[serde(default = "ServeConfig::default_root")]
    pub root: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
        }
    }
}

impl ServeConfig {
    fn default_root() -> PathBuf {
        PathBuf::from(DEFAULT_SERVE_ROOT)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` when given, otherwise use the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tls.validity_days == 0 {
            return Err(ConfigError::Validation(
                "tls.validity_days must be greater than zero".to_string(),
            ));
        }
        if self.tls.common_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tls.common_name must not be empty".to_string(),
            ));
        }
        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
