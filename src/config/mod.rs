//! Configuration management.

use crate::observability::LogFormat;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

/// Default API base URL (local development backend).
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Main configuration for reachme.
#[derive(Debug, Clone)]
pub struct ReachmeConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Bearer token of the signed-in creator.
    pub api_token: Option<SecretString>,
    /// HTTP client settings.
    pub http: HttpSettings,
    /// Log output format.
    pub log_format: LogFormat,
    /// Log filter directive (overridden by `RUST_LOG`).
    pub log_filter: Option<String>,
}

/// HTTP client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// API base URL.
    pub api_url: Option<String>,
    /// API token.
    pub api_token: Option<String>,
    /// HTTP section.
    pub http: Option<ConfigFileHttp>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// HTTP section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileHttp {
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `reachme=debug`.
    pub filter: Option<String>,
}

impl Default for ReachmeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            http: HttpSettings::default(),
            log_format: LogFormat::default(),
            log_filter: None,
        }
    }
}

impl ReachmeConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config TOML.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/reachme/` on macOS)
    /// 2. XDG config dir (`~/.config/reachme/`)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("reachme").join("config.toml");
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("reachme")
            .join("config.toml");

        for candidate in [platform_config, xdg_config] {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %candidate.display(), "Ignoring config file: {e}"),
            }
        }

        Self::default()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    #[must_use]
    pub fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("REACHME_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = normalize_url(&url);
        }
        if let Some(token) = var("REACHME_API_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.api_token = Some(SecretString::from(token));
        }
        if let Some(timeout_ms) = var("REACHME_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.http.timeout_ms = timeout_ms;
        }
        if let Some(connect_ms) = var("REACHME_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.http.connect_timeout_ms = connect_ms;
        }
        if let Some(format) = var("REACHME_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format);
        }
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl AsRef<str>) -> Self {
        self.api_url = normalize_url(url.as_ref());
        self
    }

    /// Sets the API token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Converts a `ConfigFile` to `ReachmeConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(url) = file.api_url {
            config.api_url = normalize_url(&url);
        }
        config.api_token = file.api_token.map(SecretString::from);
        if let Some(http) = file.http {
            if let Some(timeout_ms) = http.timeout_ms {
                config.http.timeout_ms = timeout_ms;
            }
            if let Some(connect_timeout_ms) = http.connect_timeout_ms {
                config.http.connect_timeout_ms = connect_timeout_ms;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.log_format = LogFormat::parse(&format);
            }
            config.log_filter = logging.filter;
        }

        config
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
