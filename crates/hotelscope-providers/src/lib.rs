//! External collaborators for hotelscope.
//!
//! - [`NominatimGeocoder`]: reverse geocoding against an OpenStreetMap Nominatim server
//! - [`ElasticsearchClient`]: batched `_msearch` against the travel index
//! - [`CountryTable`]: country name resolution backed by GeoNames `countryInfo.txt`
//!
//! The clients expose blocking APIs, matching the synchronous core traits. Each owns a
//! small Tokio runtime that drives its HTTP calls.

use std::time::Duration;

mod country_info;
mod elasticsearch;
mod nominatim;

pub use country_info::{COUNTRY_INFO_URL, CountryTable, download_country_info};
pub use elasticsearch::ElasticsearchClient;
pub use error::{ProviderError, Result};
pub use nominatim::NominatimGeocoder;

/// Connection settings shared by the provider clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub nominatim_base_url: String,
    pub elasticsearch_base_url: String,
    pub country_info_url: String,
    /// Sent with every request; Nominatim rejects anonymous clients.
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            elasticsearch_base_url: "http://localhost:9200".to_string(),
            country_info_url: COUNTRY_INFO_URL.to_string(),
            user_agent: "ent_travel".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()?)
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ProviderError {
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error("Polars error: {0}")]
        Polars(#[from] polars::prelude::PolarsError),
        #[error("Unexpected response: {0}")]
        UnexpectedResponse(String),
    }
    pub type Result<T> = std::result::Result<T, ProviderError>;
}
