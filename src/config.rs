// src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::auth::TokenVerifier;

/// Signing secret used when nothing else is configured. Only fit for a
/// laptop: anyone who knows it can mint tokens.
pub const DEV_JWT_SECRET: &str = "siraaj-local-development-secret";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/siraaj.db")
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Embedded SQLite store.
    Local {
        #[serde(default = "default_database_path")]
        database_path: PathBuf,
    },
    /// Hosted table and credential API.
    Rest {
        url: String,
        anon_key: String,
        service_key: String,
        #[serde(default)]
        timeout_seconds: Option<u64>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            database_path: default_database_path(),
        }
    }
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Local { .. } => "local",
            BackendConfig::Rest { .. } => "rest",
        }
    }
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct AuthConfig {
    /// Secret the access tokens are signed with (the project's JWT secret
    /// when the hosted backend is used).
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Base64 key for Rocket's private cookies; generated per launch if unset.
    #[serde(default)]
    pub cookie_secret: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend: BackendConfig::default(),
            auth: AuthConfig::default(),
            cookie_secret: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<AppConfig>,
    #[serde(default)]
    production: Option<AppConfig>,
}

impl AppConfig {
    /// Load the section of `path` matching the current environment, then
    /// apply environment variable overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content, &environment)?
        } else {
            warn!("{} not found, using local defaults", path.display());
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set JWT_SECRET outside local development");
        }
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("SIRAAJ_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        let section = match environment {
            "production" => file.production,
            _ => file.local,
        };
        section.with_context(|| format!("config.yaml has no '{}' section", environment))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("ROCKET_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("ROCKET_PORT is not a valid port: {}", port))?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        let kind = lookup("BACKEND_KIND").unwrap_or_else(|| self.backend.kind().to_string());
        self.backend = match kind.as_str() {
            "local" => {
                let current = match &self.backend {
                    BackendConfig::Local { database_path } => Some(database_path.clone()),
                    BackendConfig::Rest { .. } => None,
                };
                BackendConfig::Local {
                    database_path: lookup("DATABASE_PATH")
                        .map(PathBuf::from)
                        .or(current)
                        .unwrap_or_else(default_database_path),
                }
            }
            "rest" => {
                let (url, anon_key, service_key, timeout_seconds) = match &self.backend {
                    BackendConfig::Rest {
                        url,
                        anon_key,
                        service_key,
                        timeout_seconds,
                    } => (
                        Some(url.clone()),
                        Some(anon_key.clone()),
                        Some(service_key.clone()),
                        *timeout_seconds,
                    ),
                    BackendConfig::Local { .. } => (None, None, None, None),
                };
                BackendConfig::Rest {
                    url: lookup("BACKEND_URL")
                        .or(url)
                        .context("BACKEND_URL is required for the rest backend")?,
                    anon_key: lookup("BACKEND_ANON_KEY")
                        .or(anon_key)
                        .context("BACKEND_ANON_KEY is required for the rest backend")?,
                    service_key: lookup("BACKEND_SERVICE_KEY")
                        .or(service_key)
                        .context("BACKEND_SERVICE_KEY is required for the rest backend")?,
                    timeout_seconds,
                }
            }
            other => bail!("Unknown backend kind '{}' (expected local or rest)", other),
        };
        Ok(())
    }

    pub fn token_verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.auth.jwt_secret.clone(), self.auth.token_ttl_secs)
    }
}
