use crate::config::Config;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// The only message a failed fetch ever shows to the user.
pub const FETCH_ERROR_MESSAGE: &str = "An error occurred while fetching movies";

/// A single movie entry from a TMDB result page.
///
/// Fields are read leniently: an entry with an unexpected shape is kept
/// and rendered as-is rather than failing the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overview: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub release_date: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub poster_path: Option<String>,
}

impl Movie {
    /// Poster path, treating an empty string the same as a missing one.
    pub fn poster_path(&self) -> Option<&str> {
        self.poster_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Full poster image URL at the `w500` size, if the movie has a poster.
    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.poster_path()
            .map(|path| format!("{}/w500{}", image_base, path))
    }

    /// Build a movie from an arbitrary result entry. Non-objects become an empty movie.
    fn from_entry(entry: Value) -> Self {
        serde_json::from_value(entry).unwrap_or_default()
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(id.unwrap_or(0))
}

fn lenient_results<'de, D>(deserializer: D) -> Result<Vec<Movie>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries.into_iter().map(Movie::from_entry).collect())
}

/// Response body of both list endpoints. Paging fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    #[serde(deserialize_with = "lenient_results")]
    pub results: Vec<Movie>,
}

/// Which listing a fetch targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Popular,
    Search(String),
}

impl Endpoint {
    /// An empty query lists popular movies, anything else is a search.
    pub fn for_query(query: &str) -> Self {
        if query.is_empty() {
            Self::Popular
        } else {
            Self::Search(query.to_string())
        }
    }

    pub fn url(&self, config: &Config) -> String {
        match self {
            Self::Popular => format!(
                "{}/movie/popular?api_key={}&language={}&page=1",
                config.api_base,
                urlencoding::encode(&config.api_key),
                urlencoding::encode(&config.language),
            ),
            Self::Search(query) => format!(
                "{}/search/movie?api_key={}&language={}&query={}&page=1",
                config.api_base,
                urlencoding::encode(&config.api_key),
                urlencoding::encode(&config.language),
                urlencoding::encode(query),
            ),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Popular => "popular",
            Self::Search(_) => "search",
        }
    }
}

/// Anything that can go wrong during a single fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Every failure kind collapses to the same message.
    pub fn user_message(&self) -> String {
        FETCH_ERROR_MESSAGE.to_string()
    }
}

/// Source of movie result pages.
pub trait MovieSource: Send + Sync + 'static {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<MoviePage, FetchError>> + Send;
}

/// HTTP client for the TMDB v3 API.
pub struct TmdbClient {
    http: reqwest::Client,
}

impl TmdbClient {
    pub fn new() -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("movie-search/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl MovieSource for TmdbClient {
    async fn fetch_page(&self, url: &str) -> Result<MoviePage, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
