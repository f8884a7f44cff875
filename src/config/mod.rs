use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: BackendConfig,
    pub rest: RestConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which data backend a deployment talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Supabase,
    Rest,
}

impl BackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" | "baas" => Some(BackendKind::Supabase),
            "rest" | "api" | "legacy" => Some(BackendKind::Rest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Where confirmation emails send the user back to after sign-up
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub token_key: String,
    pub rest_token_key: String,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

pub const DEFAULT_TOKEN_KEY: &str = "supabase_token";
pub const DEFAULT_REST_TOKEN_KEY: &str = "token";
pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:3001/api";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Backend overrides
        if let Some(kind) = env::var("POETRY_BACKEND").ok().as_deref().and_then(BackendKind::parse) {
            self.backend.kind = kind;
        }
        if let Some(v) = first_env(&["SUPABASE_URL", "VITE_SUPABASE_URL"]) {
            self.backend.supabase_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = first_env(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]) {
            self.backend.supabase_anon_key = v;
        }
        if let Ok(v) = env::var("POETRY_SITE_URL") {
            self.backend.site_url = Some(v);
        }

        // Legacy REST overrides
        if let Some(v) = first_env(&["API_BASE_URL", "VITE_API_BASE_URL"]) {
            self.rest.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("API_TIMEOUT_SECS") {
            self.rest.timeout_secs = v.parse().unwrap_or(self.rest.timeout_secs);
        }

        // Storage overrides
        if let Ok(v) = env::var("POETRY_CONFIG_DIR") {
            self.storage.dir = Some(PathBuf::from(v));
        }

        if let Ok(v) = env::var("POETRY_LOG") {
            self.logging.filter = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: BackendConfig {
                kind: BackendKind::Supabase,
                supabase_url: "http://localhost:54321".to_string(),
                supabase_anon_key: String::new(),
                site_url: Some("http://localhost:5173".to_string()),
            },
            rest: RestConfig {
                base_url: DEFAULT_REST_BASE_URL.to_string(),
                timeout_secs: 10,
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                filter: "poetry_client=debug,warn".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            backend: BackendConfig {
                kind: BackendKind::Supabase,
                supabase_url: String::new(),
                supabase_anon_key: String::new(),
                site_url: None,
            },
            rest: RestConfig {
                base_url: DEFAULT_REST_BASE_URL.to_string(),
                timeout_secs: 10,
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                filter: "poetry_client=info,warn".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: BackendConfig {
                kind: BackendKind::Supabase,
                supabase_url: String::new(),
                supabase_anon_key: String::new(),
                site_url: None,
            },
            rest: RestConfig {
                base_url: DEFAULT_REST_BASE_URL.to_string(),
                timeout_secs: 10,
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                filter: "warn".to_string(),
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            rest_token_key: DEFAULT_REST_TOKEN_KEY.to_string(),
            dir: None,
        }
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
