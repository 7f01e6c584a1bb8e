use hotelscope::{Address, GeoPoint, ReverseGeocoder, geo::GeoError};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{ProviderConfig, Result, runtime, trim_base_url};

/// Reverse geocoder backed by the Nominatim `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimAddress {
    city: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl From<NominatimAddress> for Address {
    fn from(raw: NominatimAddress) -> Self {
        Self {
            city: raw.city,
            state: raw.state,
            county: raw.county,
            country: raw.country,
            country_code: raw.country_code.map(|code| code.to_uppercase()),
        }
    }
}

impl NominatimGeocoder {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            runtime: runtime()?,
            base_url: trim_base_url(&config.nominatim_base_url),
        })
    }

    /// Looks up the address at `point`. `Ok(None)` when Nominatim has nothing there.
    #[instrument(name = "Nominatim reverse", skip(self), level = "debug")]
    pub fn lookup(&self, point: GeoPoint) -> Result<Option<Address>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = point.latitude.to_string();
        let lon = point.longitude.to_string();

        let response = self.runtime.block_on(async {
            self.client
                .get(&url)
                .query(&[
                    ("format", "jsonv2"),
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("accept-language", "en"),
                ])
                .send()
                .await?
                .error_for_status()?
                .json::<ReverseResponse>()
                .await
        })?;

        if let Some(error) = response.error {
            debug!(%error, "Nominatim returned no address");
            return Ok(None);
        }
        Ok(response.address.map(Address::from))
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, point: GeoPoint) -> std::result::Result<Option<Address>, GeoError> {
        self.lookup(point).map_err(|e| {
            warn!(error = %e, "Reverse geocoding failed");
            GeoError::Geocoding(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_town_does_not_hide_state() {
        let raw: NominatimAddress = serde_json::from_str(
            r#"{"town": "Hatta", "state": "Dubai", "country": "United Arab Emirates", "country_code": "ae"}"#,
        )
        .unwrap();
        let address = Address::from(raw);
        assert_eq!(address.city, None);
        assert_eq!(address.locality(), Some("Dubai"));
        assert_eq!(address.country_code.as_deref(), Some("AE"));

        let village_only: NominatimAddress = serde_json::from_str(r#"{"village": "Al Hajar", "county": "Fujairah"}"#).unwrap();
        assert_eq!(Address::from(village_only).locality(), Some("Fujairah"));
    }

    #[test]
    fn test_error_response_parses() {
        let response: ReverseResponse =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(response.address.is_none());
        assert_eq!(response.error.as_deref(), Some("Unable to geocode"));
    }
}
