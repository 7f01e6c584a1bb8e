//! Decides whether a user's GPS position matches the destination they typed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{GeoError, GeoPoint};
use crate::search::SearchType;

/// Minimum similarity (0..=100) between the reverse-geocoded label and the query.
pub const MINIMUM_FUZZY_MATCH_RATIO: u8 = 90;

/// Address components returned by a reverse geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    /// Locality label used for city searches: city, else state, else county.
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.state, &self.county]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .find(|part| !part.trim().is_empty())
    }
}

/// A country with its ISO 3166 alpha-2 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub alpha_2: String,
    pub name: String,
}

/// Port to a reverse-geocoding service.
pub trait ReverseGeocoder: Send + Sync {
    /// Address at `point`, or `None` when the provider has no answer.
    fn reverse(&self, point: GeoPoint) -> Result<Option<Address>, GeoError>;
}

/// Port resolving a free-text country name to its best match.
pub trait CountryResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Country>;
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Arc<T> {
    fn reverse(&self, point: GeoPoint) -> Result<Option<Address>, GeoError> {
        (**self).reverse(point)
    }
}

impl<T: CountryResolver + ?Sized> CountryResolver for Arc<T> {
    fn resolve(&self, name: &str) -> Option<Country> {
        (**self).resolve(name)
    }
}

/// Case-insensitive similarity ratio, rounded to an integer in `0..=100`.
pub fn match_ratio(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    // rapidfuzz reports a normalized similarity in 0.0..=1.0
    let ratio = rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}

pub const fn meets_match_threshold(ratio: u8) -> bool {
    ratio >= MINIMUM_FUZZY_MATCH_RATIO
}

/// Matches a device position against a typed destination.
#[derive(Debug, Clone)]
pub struct LocationMatcher<G, C> {
    geocoder: G,
    countries: C,
}

impl<G: ReverseGeocoder, C: CountryResolver> LocationMatcher<G, C> {
    pub const fn new(geocoder: G, countries: C) -> Self {
        Self {
            geocoder,
            countries,
        }
    }

    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub const fn countries(&self) -> &C {
        &self.countries
    }

    /// Whether the user at `point` is searching for the place they are in.
    ///
    /// Returns `false` without calling the geocoder when the point is missing or
    /// zero, or when the query is empty. Geocoder failures count as "no match".
    #[instrument(name = "Is Current Location", level = "debug", skip(self))]
    pub fn is_current_location(
        &self,
        point: Option<GeoPoint>,
        search_type: SearchType,
        search_query: &str,
    ) -> bool {
        let Some(point) = GeoPoint::usable(point) else {
            return false;
        };
        if search_query.trim().is_empty() || search_type == SearchType::Hotel {
            return false;
        }

        let Some(label) = self.resolve_label(point, search_type) else {
            return false;
        };

        let ratio = match_ratio(&label, search_query);
        debug!(label, ratio, "Compared user location with search query");
        meets_match_threshold(ratio)
    }

    /// The label to compare against the query: a locality name or a country code.
    fn resolve_label(&self, point: GeoPoint, search_type: SearchType) -> Option<String> {
        let address = match self.geocoder.reverse(point) {
            Ok(Some(address)) => address,
            Ok(None) => {
                debug!("Reverse geocoding returned no address");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, treating as no match");
                return None;
            }
        };

        match search_type {
            SearchType::City => address.locality().map(str::to_owned),
            SearchType::Country => {
                let country = address.country.as_deref().filter(|c| !c.trim().is_empty())?;
                let resolved = self.countries.resolve(country);
                if resolved.is_none() {
                    debug!(country, "Country name could not be resolved to a code");
                }
                resolved.map(|c| c.alpha_2)
            }
            SearchType::Hotel => None,
        }
    }
}
