//! Configuration loading for BetterBobcats.
//! Reads bobcats.toml from the current directory or the path in BOBCATS_CONFIG,
//! then applies environment overrides (a `.env` file is honored).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Invalid config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub careers: CareersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 8000 }
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string(), "http://localhost:8080".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), cors_origins: default_cors_origins() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. When absent the server falls back to the in-memory store.
    pub url: Option<SecretString>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "bool_true")]
    pub create_schema: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn bool_true() -> bool { true }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            create_schema: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<SecretString>,
    pub service_role_key: Option<SecretString>,
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
}

fn default_bucket() -> String { "club-assets".to_string() }

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self { url: None, anon_key: None, service_role_key: None, storage_bucket: default_bucket() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub worker_secret: Option<SecretString>,
    #[serde(default = "bool_true")]
    pub trigger_enabled: bool,
    #[serde(default = "default_trigger_timeout")]
    pub trigger_timeout_secs: u64,
}

fn default_trigger_timeout() -> u64 { 10 }

impl Default for EmailConfig {
    fn default() -> Self {
        Self { worker_secret: None, trigger_enabled: true, trigger_timeout_secs: default_trigger_timeout() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Bearer token that platform-admin endpoints require.
    pub session_token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CareersConfig {
    /// Directory of extra career path files: `<id>.json` for CS/CSE,
    /// `<degree>/<id>.json` for any other degree.
    pub data_dir: Option<String>,
}


impl Config {
    /// Load configuration from bobcats.toml plus environment overrides.
    /// A missing file is not an error: defaults and the environment are used.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let path = std::env::var("BOBCATS_CONFIG").unwrap_or_else(|_| "bobcats.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            tracing::info!(path = %path, "Config file not found, using defaults and environment");
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|source| ConfigError::Read { path: display.clone(), source })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse { path: display, source })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Override file values with environment variables. `lookup` is injected so
    /// tests do not have to mutate the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let secret = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(SecretString::from);

        if let Some(url) = secret("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(url) = lookup("SUPABASE_URL").filter(|v| !v.is_empty()) {
            self.supabase.url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(key) = secret("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = Some(key);
        }
        if let Some(key) = secret("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = Some(key);
        }
        if let Some(key) = secret("SEND_EMAILS_SECRET") {
            self.email.worker_secret = Some(key);
        }
        if let Some(token) = secret("BOBCATS_ADMIN_TOKEN") {
            self.admin.session_token = Some(token);
        }
        if let Some(port) = lookup("BOBCATS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: "BOBCATS_PORT", value: port.clone() })?;
        }
        Ok(())
    }

    pub fn has_database(&self) -> bool {
        self.database.url.as_ref().is_some_and(|u| !u.expose_secret().is_empty())
    }

    /// Whether every value the email edge function call needs is present.
    pub fn email_trigger_ready(&self) -> bool {
        self.email.trigger_enabled
            && self.supabase.url.is_some()
            && self.supabase.anon_key.is_some()
            && self.email.worker_secret.is_some()
    }

    pub fn storage_ready(&self) -> bool {
        self.supabase.url.is_some() && self.supabase.service_role_key.is_some()
    }
}
