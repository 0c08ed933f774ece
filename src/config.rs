use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Errors raised while assembling the client configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid base URL for {field}: {value}")]
    InvalidBaseUrl { field: &'static str, value: String },
}

impl ConfigError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::MissingApiKey => {
                "No TMDB API key configured. Pass --api-key or set TMDB_API_KEY.".to_string()
            }
            ConfigError::InvalidBaseUrl { field, value } => {
                format!("{} must be an http(s) URL, got '{}'", field, value)
            }
        }
    }
}

/// Connection settings for the movie database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub image_base: String,
    pub language: String,
}

impl Config {
    /// Build a configuration, normalising trailing slashes on the base URLs.
    pub fn new(
        api_key: Option<String>,
        api_base: &str,
        image_base: &str,
        language: &str,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            api_base: normalize_base("api-base", api_base)?,
            image_base: normalize_base("image-base", image_base)?,
            language: language.to_string(),
        })
    }

    /// Configuration with the public TMDB defaults and the given key.
    #[cfg(test)]
    pub fn with_key(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

fn normalize_base(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
