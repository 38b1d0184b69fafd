use std::{env, fmt, path::PathBuf, time::Duration};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE: &str = "roamconnect";
const UPLOAD_DIR: &str = "uploads";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-4";
const OPENAI_TEMPERATURE: f32 = 0.5;
const OPENAI_MAX_TOKENS: u32 = 3000;
const OPENAI_TIMEOUT_SECS: u64 = 60;
const PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

#[derive(Debug)]
pub enum ConfigError {
    Missing(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the text generation service.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Process-wide configuration. Loaded once in `main` and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub upload_dir: PathBuf,
    pub password_cost: u32,
    pub generation: GenerationConfig,
    pub maps_api_key: Option<String>,
    pub places_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match optional("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{}' is not a port number", raw)))?,
            None => PORT,
        };

        let timeout_secs = match optional("OPENAI_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::Invalid(format!("OPENAI_TIMEOUT_SECS '{}' is not a number", raw))
            })?,
            None => OPENAI_TIMEOUT_SECS,
        };

        let password_cost = match optional("PASSWORD_HASH_COST") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::Invalid(format!("PASSWORD_HASH_COST '{}' is not a number", raw))
            })?,
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| HOST.to_string()),
            port,
            mongodb_uri: optional("MONGODB_URI")
                .ok_or_else(|| ConfigError::Missing("MONGODB_URI".to_string()))?,
            mongodb_database: optional("MONGODB_DATABASE").unwrap_or_else(|| DATABASE.to_string()),
            upload_dir: PathBuf::from(
                optional("UPLOAD_DIR").unwrap_or_else(|| UPLOAD_DIR.to_string()),
            ),
            password_cost,
            generation: GenerationConfig {
                api_key: optional("OPENAI_API_KEY"),
                base_url: optional("OPENAI_BASE_URL")
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                model: optional("OPENAI_MODEL").unwrap_or_else(|| OPENAI_MODEL.to_string()),
                temperature: OPENAI_TEMPERATURE,
                max_tokens: OPENAI_MAX_TOKENS,
                timeout: Duration::from_secs(timeout_secs),
            },
            maps_api_key: optional("GOOGLE_MAPS_API_KEY"),
            places_base_url: optional("GOOGLE_PLACES_URL")
                .unwrap_or_else(|| PLACES_BASE_URL.to_string()),
        })
    }
}

// Empty values count as unset so a blank line in .env doesn't override a default.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
