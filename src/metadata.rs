//! Springer Nature metadata API client.
//!
//! One GET per query: the request URL is the fixed
//! endpoint with the key and the query text concatenated verbatim, and the
//! body is parsed as JSON. There is no retry and no status check; a bad
//! response surfaces as a JSON or facet error further down.

use crate::error::{OptionExt, Result, SpringerError};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Springer metadata API host
pub const SPRINGER_API_BASE: &str = "http://api.springer.com";

/// JSON metadata endpoint, relative to the host
const METADATA_PATH: &str = "/metadata/json";

const USER_AGENT: &str = "rustspringer/0.1";

/// Position of the country facet, counted from the end of `facets`.
///
/// The API returns its facets in a fixed order (subject, keyword, pub, year,
/// country, type) and nothing in the payload marks which one is the country
/// breakdown. Only the `type` facet follows it.
pub const COUNTRY_FACET_FROM_END: usize = 2;

/// One `{value, count}` record of the country facet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacetEntry {
    #[serde(rename = "value")]
    pub country: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub count: u64,
}

/// The API sends counts as strings; plain numbers are accepted too.
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Number(u64),
        Text(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Number(n) => Ok(n),
        RawCount::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Extract the country facet from a metadata response.
///
/// # Errors
///
/// * [`SpringerError::FacetMissing`] if `facets` has fewer than
///   [`COUNTRY_FACET_FROM_END`] entries
/// * [`SpringerError::Parse`] if `facets` or the facet's `values` is absent
/// * [`SpringerError::Json`] if an entry is not `{value, count}`
pub fn country_facet(data: &Value) -> Result<Vec<FacetEntry>> {
    let facets = data
        .get("facets")
        .and_then(Value::as_array)
        .ok_or_parse("response has no `facets` array")?;

    let index = facets
        .len()
        .checked_sub(COUNTRY_FACET_FROM_END)
        .ok_or(SpringerError::FacetMissing {
            found: facets.len(),
            needed: COUNTRY_FACET_FROM_END,
        })?;

    let values = facets[index]
        .get("values")
        .ok_or_parse("country facet has no `values` array")?;

    Ok(serde_json::from_value(values.clone())?)
}

/// Build the request URL. Key and query are concatenated as-is, so any
/// `&`, `+` or `:` in them keeps its query-string meaning.
pub fn build_url(base_url: &str, api_key: &str, query: &str) -> String {
    format!(
        "{}{}?api_key={}&q={}",
        base_url.trim_end_matches('/'),
        METADATA_PATH,
        api_key,
        query
    )
}

/// Anything that can answer a metadata query with a JSON document.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Run one search and return the parsed response body.
    async fn get_metadata(&self, query: &str) -> Result<Value>;
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host, e.g. `http://api.springer.com`
    pub base_url: String,
    /// Static API key sent as `api_key`
    pub api_key: String,
    /// Request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: SPRINGER_API_BASE.to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }
}

/// HTTP client for the Springer metadata endpoint
pub struct SpringerClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl SpringerClient {
    /// Create a new SpringerClient
    ///
    /// Fails with [`SpringerError::Config`] if the base URL does not parse.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            SpringerError::Config(format!("Invalid base URL {:?}: {}", config.base_url, e))
        })?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SpringerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Full request URL for a query string
    pub fn url_for(&self, query: &str) -> String {
        build_url(&self.config.base_url, &self.config.api_key, query)
    }
}

#[async_trait]
impl MetadataSource for SpringerClient {
    async fn get_metadata(&self, query: &str) -> Result<Value> {
        let url = self.url_for(query);
        debug!(query = query, "Fetching Springer metadata");

        let body = self.client.get(&url).send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
