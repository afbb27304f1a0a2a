use std::env;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "JapanItinerary";
const DEFAULT_JWT_TTL_HOURS: i64 = 24;
// bcrypt rejects costs below 4.
const MIN_BCRYPT_COST: u32 = 4;
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Requests fail with `NotConfigured` when this is missing.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub gemini: GeminiConfig,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// `MONGODB_URI` is only required when the Mongo backend is selected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            Err(_) => PORT,
        };

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value).ok_or(ConfigError::InvalidValue {
                name: "STORAGE_BACKEND",
                value,
            })?,
            Err(_) => StorageBackend::Mongo,
        };

        let mongodb_uri = env::var("MONGODB_URI").ok();
        if storage == StorageBackend::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::MissingVar("MONGODB_URI"));
        }

        let jwt_ttl_hours = match env::var("JWT_TTL_HOURS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "JWT_TTL_HOURS",
                value,
            })?,
            Err(_) => DEFAULT_JWT_TTL_HOURS,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(value) => match value.parse::<u32>() {
                Ok(cost) if (MIN_BCRYPT_COST..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "BCRYPT_COST",
                        value,
                    })
                }
            },
            Err(_) => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port,
            storage,
            mongodb_uri,
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
            jwt_ttl_hours,
            bcrypt_cost,
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty()),
                model: env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
        })
    }

    /// Configuration used by the in-memory test harness.
    pub fn for_memory(jwt_secret: &str) -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            storage: StorageBackend::Memory,
            mongodb_uri: None,
            mongodb_database: DEFAULT_DATABASE.to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_ttl_hours: DEFAULT_JWT_TTL_HOURS,
            bcrypt_cost: MIN_BCRYPT_COST,
            gemini: GeminiConfig::default(),
            cors_allowed_origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_accepts_aliases() {
        assert_eq!(StorageBackend::parse("MongoDB"), Some(StorageBackend::Mongo));
        assert_eq!(StorageBackend::parse("memory"), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("mysql"), None);
    }

    #[test]
    fn memory_config_has_gemini_defaults() {
        let config = AppConfig::for_memory("secret");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert!(config.gemini.api_key.is_none());
    }
}
