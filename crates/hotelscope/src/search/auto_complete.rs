//! Auto-complete for the travel search bar.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{
    Result, SearchConfig, SearchType,
    query::{Fuzziness, QueryDocument, build_query},
};
use crate::geo::{GeoPoint, Located};
use crate::lenient;

const ELLIPSIS: &str = "...";

/// A document stored in the travel index: a city, a country or a hotel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexDocument {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub lng: Option<f64>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub outlet_id: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub merchant_id: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_flag")]
    pub is_hww_instant_booking: Option<bool>,
}

impl IndexDocument {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn doc_type(&self) -> &str {
        self.doc_type.as_deref().unwrap_or_default()
    }
}

impl Located for IndexDocument {
    fn location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.lat?, self.lng?))
    }
}

/// One query of a batched search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub query: QueryDocument,
}

/// Port to the search backend.
pub trait SearchIndex: Send + Sync {
    /// Runs all requests in one round trip, returning the hits of each in order.
    fn multi_search(&self, requests: &[SearchRequest]) -> Result<Vec<Vec<IndexDocument>>>;
}

impl<T: SearchIndex + ?Sized> SearchIndex for std::sync::Arc<T> {
    fn multi_search(&self, requests: &[SearchRequest]) -> Result<Vec<Vec<IndexDocument>>> {
        (**self).multi_search(requests)
    }
}

/// What the follow-up listing call should search for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "search_type", rename_all = "lowercase")]
pub enum SearchTarget {
    City {
        billing_city: String,
    },
    Country {
        billing_country: String,
    },
    Hotel {
        #[serde(skip_serializing_if = "Option::is_none")]
        outlet_id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        merchant_id: Option<u64>,
        /// `1` for instant booking, `0` for inquiry-only hotels.
        #[serde(skip_serializing_if = "Option::is_none")]
        is_hww_instant_booking: Option<u8>,
    },
}

impl SearchTarget {
    pub const fn search_type(&self) -> SearchType {
        match self {
            Self::City { .. } => SearchType::City,
            Self::Country { .. } => SearchType::Country,
            Self::Hotel { .. } => SearchType::Hotel,
        }
    }
}

/// Parameters a client sends to the listing endpoint after picking a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_lng: Option<f64>,
    #[serde(flatten)]
    pub target: SearchTarget,
}

/// An auto-complete entry as shown in the search bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSuggestion {
    pub title: String,
    pub full_title: String,
    pub sub_title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub icon_image: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub is_hww_instant_booking: Option<u8>,
    pub api_params: SearchParams,
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let cut: String = title.chars().take(max_chars).collect();
        format!("{cut}{ELLIPSIS}")
    } else {
        title.to_string()
    }
}

/// Turns an index hit into a suggestion with its follow-up listing parameters.
pub fn suggestion_from_document(document: &IndexDocument, config: &SearchConfig) -> SearchSuggestion {
    let full_title = document.name().to_string();
    let search_type = SearchType::from_doc_type(document.doc_type());
    let icon_image = match search_type {
        SearchType::Hotel if document.doc_type() == SearchType::Hotel.as_str() => {
            config.hotel_pin_icon.clone()
        }
        _ => config.location_pin_icon.clone(),
    };

    let instant_flag = document.is_hww_instant_booking.map(u8::from);
    let target = match search_type {
        SearchType::City => SearchTarget::City {
            billing_city: document.city.clone().unwrap_or_default(),
        },
        SearchType::Country => SearchTarget::Country {
            billing_country: document.country.clone().unwrap_or_default(),
        },
        SearchType::Hotel => SearchTarget::Hotel {
            outlet_id: document.outlet_id,
            merchant_id: document.merchant_id,
            is_hww_instant_booking: instant_flag,
        },
    };

    SearchSuggestion {
        title: truncate_title(&full_title, config.title_max_chars),
        full_title: full_title.clone(),
        sub_title: document.address.clone().unwrap_or_default(),
        latitude: document.lat.unwrap_or(0.0),
        longitude: document.lng.unwrap_or(0.0),
        icon_image,
        doc_type: document.doc_type().to_string(),
        is_hww_instant_booking: instant_flag,
        api_params: SearchParams {
            query: Some(full_title),
            map_lat: document.lat,
            map_lng: document.lng,
            target,
        },
    }
}

/// Auto-complete over a [`SearchIndex`].
#[derive(Debug, Clone)]
pub struct TravelSearch<I> {
    index: I,
    config: SearchConfig,
}

impl<I: SearchIndex> TravelSearch<I> {
    pub const fn new(index: I, config: SearchConfig) -> Self {
        Self { index, config }
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub const fn index(&self) -> &I {
        &self.index
    }

    /// Suggestions for `text`, exact matches preferred over fuzzy ones.
    ///
    /// An exact and a fuzzy query go out in one batched call. Fuzzy hits are used only
    /// when the exact query found nothing. An unreachable index yields no suggestions.
    #[instrument(name = "Auto Complete", level = "debug", skip(self))]
    pub fn auto_complete(&self, text: &str, origin: Option<GeoPoint>) -> Vec<SearchSuggestion> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.fetch_hits(text, origin)
            .iter()
            .map(|document| suggestion_from_document(document, &self.config))
            .collect()
    }

    fn fetch_hits(&self, text: &str, origin: Option<GeoPoint>) -> Vec<IndexDocument> {
        let requests: Vec<SearchRequest> = [Fuzziness::Exact, Fuzziness::Auto]
            .into_iter()
            .map(|fuzziness| SearchRequest {
                index: self.config.index_name.clone(),
                query: build_query(text, origin, fuzziness).with_limit(self.config.max_hits),
            })
            .collect();

        let responses = match self.index.multi_search(&requests) {
            Ok(responses) => responses,
            Err(e) => {
                warn!(error = %e, "Search index unavailable, returning no suggestions");
                Vec::new()
            }
        };

        let mut responses = responses.into_iter();
        let exact = responses.next().unwrap_or_default();
        let fuzzy = responses.next().unwrap_or_default();
        debug!(
            exact_hits = exact.len(),
            fuzzy_hits = fuzzy.len(),
            "Auto-complete hits received"
        );

        if exact.is_empty() { fuzzy } else { exact }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::search::SearchError;

    /// Returns canned hit lists and records what was asked.
    struct CannedIndex {
        responses: Option<Vec<Vec<IndexDocument>>>,
        seen: Mutex<Vec<Vec<SearchRequest>>>,
    }

    impl CannedIndex {
        fn new(responses: Vec<Vec<IndexDocument>>) -> Self {
            Self {
                responses: Some(responses),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                responses: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl SearchIndex for CannedIndex {
        fn multi_search(&self, requests: &[SearchRequest]) -> Result<Vec<Vec<IndexDocument>>> {
            self.seen.lock().unwrap().push(requests.to_vec());
            self.responses
                .clone()
                .ok_or_else(|| SearchError::Unavailable("connection refused".into()))
        }
    }

    fn doc(value: serde_json::Value) -> IndexDocument {
        serde_json::from_value(value).unwrap()
    }

    fn city(name: &str) -> IndexDocument {
        doc(json!({"name": name, "type": "city", "city": name, "lat": 25.2, "lng": 55.3}))
    }

    fn search(index: CannedIndex) -> TravelSearch<CannedIndex> {
        TravelSearch::new(index, SearchConfig::default())
    }

    #[test]
    fn test_exact_hits_win() {
        let s = search(CannedIndex::new(vec![vec![city("Dubai")], vec![city("Dubrovnik"), city("Dublin")]]));
        let results = s.auto_complete("dubai", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dubai");
    }

    #[test]
    fn test_fuzzy_fallback_when_exact_is_empty() {
        let s = search(CannedIndex::new(vec![vec![], vec![city("Dubrovnik"), city("Dublin")]]));
        let titles: Vec<String> = s.auto_complete("dubrovnk", None).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Dubrovnik", "Dublin"]);
    }

    #[test]
    fn test_one_batched_call_with_exact_then_auto() {
        let s = search(CannedIndex::new(vec![vec![], vec![]]));
        assert!(s.auto_complete("dubai", Some(GeoPoint::new(25.2, 55.3))).is_empty());

        let seen = s.index().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let fuzziness: Vec<Fuzziness> = seen[0].iter().map(|r| r.query.fuzziness).collect();
        assert_eq!(fuzziness, vec![Fuzziness::Exact, Fuzziness::Auto]);
        assert!(seen[0].iter().all(|r| r.index == "et_travel"));
    }

    #[test]
    fn test_empty_query_issues_no_call() {
        let s = search(CannedIndex::new(vec![vec![city("Dubai")], vec![]]));
        assert!(s.auto_complete("", Some(GeoPoint::new(25.2, 55.3))).is_empty());
        assert!(s.auto_complete("   ", None).is_empty());
        assert_eq!(s.index().calls(), 0);
    }

    #[test]
    fn test_unreachable_index_degrades_to_empty() {
        let s = search(CannedIndex::unreachable());
        assert!(s.auto_complete("dubai", None).is_empty());
        assert_eq!(s.index().calls(), 1);
    }

    #[test]
    fn test_title_truncation() {
        let long_name = "The Grand Palace Hotel and Residences at the Marina Walk";
        let hotel = doc(json!({"name": long_name, "type": "hotel", "outlet_id": 7, "merchant_id": "9"}));
        let suggestion = suggestion_from_document(&hotel, &SearchConfig::default());
        assert_eq!(suggestion.title, format!("{}...", &long_name[..40]));
        assert_eq!(suggestion.full_title, long_name);

        let exactly_forty = "a".repeat(40);
        let short = doc(json!({"name": exactly_forty, "type": "city"}));
        assert_eq!(suggestion_from_document(&short, &SearchConfig::default()).title, exactly_forty);
    }

    #[test]
    fn test_params_by_type() {
        let config = SearchConfig::default();

        let hotel = doc(json!({
            "name": "Marina Hotel", "address": "Dubai Marina", "type": "hotel",
            "outlet_id": 7, "merchant_id": 9, "is_hww_instant_booking": 1, "lat": 25.08, "lng": 55.14
        }));
        let suggestion = suggestion_from_document(&hotel, &config);
        assert_eq!(suggestion.icon_image, config.hotel_pin_icon);
        assert_eq!(suggestion.is_hww_instant_booking, Some(1));
        assert_eq!(suggestion.sub_title, "Dubai Marina");
        assert_eq!(
            serde_json::to_value(&suggestion.api_params).unwrap(),
            json!({
                "query": "Marina Hotel", "map_lat": 25.08, "map_lng": 55.14,
                "search_type": "hotel", "outlet_id": 7, "merchant_id": 9, "is_hww_instant_booking": 1
            })
        );

        let country = doc(json!({"name": "France", "type": "country", "country": "FR"}));
        let suggestion = suggestion_from_document(&country, &config);
        assert_eq!(suggestion.icon_image, config.location_pin_icon);
        assert_eq!(
            suggestion.api_params.target,
            SearchTarget::Country { billing_country: "FR".into() }
        );

        let city = doc(json!({"name": "Paris", "type": "city", "city": "Paris"}));
        assert_eq!(
            suggestion_from_document(&city, &config).api_params.target,
            SearchTarget::City { billing_city: "Paris".into() }
        );
    }

    #[test]
    fn test_missing_coordinates_default_to_zero() {
        let suggestion = suggestion_from_document(&doc(json!({"name": "Nowhere"})), &SearchConfig::default());
        assert!(suggestion.latitude.abs() < f64::EPSILON);
        assert_eq!(suggestion.api_params.map_lat, None);
        assert_eq!(suggestion.doc_type, "");
        assert_eq!(suggestion.icon_image, SearchConfig::default().location_pin_icon);
    }
}
