use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{
    FormatOptions, ListingConfig, OutletView, SortMenuOption, ViewedHotel, apply_recency_order,
    format_outlets, sort_menu_options,
};
use crate::geo::{CountryResolver, GeoPoint, LocationMatcher, RadiusFilterSpec, ReverseGeocoder, filter_by_radius};
use crate::search::SearchType;

/// Everything a listing request carries that affects ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRequest {
    pub query: Option<String>,
    pub search_type: Option<SearchType>,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,
    /// Where the user is.
    pub user_location: Option<GeoPoint>,
    /// Centre of the visible map for map searches.
    pub map_center: Option<GeoPoint>,
    pub radius_meters: Option<f64>,
    pub is_map_search: bool,
    pub is_recently_viewed_listing: bool,
    pub currency: String,
    /// Selected sort key.
    pub sort: Option<String>,
    /// Total reported by the outlet service, if known.
    pub total_records: Option<u64>,
}

impl ListingRequest {
    /// Text compared with the user's location: the query, else the billing city,
    /// else the billing country.
    pub fn location_query(&self) -> Option<&str> {
        [&self.query, &self.billing_city, &self.billing_country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .find(|part| !part.trim().is_empty())
    }

    pub fn is_destination_search(&self) -> bool {
        [&self.billing_city, &self.billing_country]
            .into_iter()
            .any(|part| part.as_deref().is_some_and(|p| !p.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSection {
    pub section_identifier: String,
    pub section_title: String,
    pub section_list: Vec<OutletView>,
}

/// A ranked listing ready for the response layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub is_current_location: bool,
    pub sort_options: Vec<SortMenuOption>,
    pub section: ListingSection,
    pub total_records: u64,
}

/// Runs the listing flow: location matching, formatting, recency ordering and map filtering.
#[derive(Debug, Clone)]
pub struct ListingRanker<G, C> {
    matcher: LocationMatcher<G, C>,
    config: ListingConfig,
}

impl<G: ReverseGeocoder, C: CountryResolver> ListingRanker<G, C> {
    pub const fn new(matcher: LocationMatcher<G, C>, config: ListingConfig) -> Self {
        Self { matcher, config }
    }

    pub const fn config(&self) -> &ListingConfig {
        &self.config
    }

    #[instrument(name = "Rank Listing", skip_all, fields(num_outlets = outlets.len(), search_type = ?request.search_type))]
    pub fn rank(
        &self,
        request: &ListingRequest,
        outlets: &[Value],
        recently_viewed: &[ViewedHotel],
    ) -> ListingPage {
        let is_current_location = match (request.search_type, request.location_query()) {
            (Some(search_type), Some(query)) => {
                self.matcher
                    .is_current_location(request.user_location, search_type, query)
            }
            _ => false,
        };

        let options = FormatOptions {
            is_current_location,
            is_destination_search: request.is_destination_search(),
            currency: request.currency.clone(),
        };
        let mut views = format_outlets(outlets, &options, &self.config);

        if request.is_recently_viewed_listing && !recently_viewed.is_empty() {
            views = apply_recency_order(views, recently_viewed);
        }

        if request.is_map_search {
            match request.radius_meters {
                Some(radius_meters) => {
                    let spec = RadiusFilterSpec::new(radius_meters, request.map_center);
                    views = filter_by_radius(views, &spec);
                }
                None => warn!("Map search without a radius, returning the listing unfiltered"),
            }
        }

        let total_records = request.total_records.unwrap_or(views.len() as u64);
        debug!(is_current_location, total_records, "Listing ranked");
        info!(listed = views.len(), "Listing ready");

        ListingPage {
            is_current_location,
            sort_options: sort_menu_options(is_current_location, request.sort.as_deref(), &self.config),
            section: ListingSection {
                section_identifier: self.config.section_identifier.clone(),
                section_title: self.config.section_title(total_records),
                section_list: views,
            },
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::geo::{Address, Country, GeoError};

    struct FixedGeocoder {
        city: &'static str,
        calls: AtomicUsize,
    }

    impl ReverseGeocoder for FixedGeocoder {
        fn reverse(&self, _point: GeoPoint) -> Result<Option<Address>, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Address {
                city: Some(self.city.to_string()),
                ..Address::default()
            }))
        }
    }

    struct NoCountries;

    impl CountryResolver for NoCountries {
        fn resolve(&self, _name: &str) -> Option<Country> {
            None
        }
    }

    fn ranker(city: &'static str) -> ListingRanker<FixedGeocoder, NoCountries> {
        ListingRanker::new(
            LocationMatcher::new(
                FixedGeocoder {
                    city,
                    calls: AtomicUsize::new(0),
                },
                NoCountries,
            ),
            ListingConfig::default(),
        )
    }

    fn outlet(id: u64, lat: f64, lng: f64) -> Value {
        json!({
            "id": id, "hotel": format!("Hotel {id}"), "lat": lat, "lng": lng,
            "merchant": {"id": 3, "logo_small_url": "logo.png"}, "images_url": [],
            "is_hww_instant_booking": 1, "hww_title": "Book now", "package_price": 100, "no_of_nights": 1,
            "billing_city": "Dubai", "billing_country": "UAE", "neighborhood": "Marina", "distance": 2500
        })
    }

    fn ids(page: &ListingPage) -> Vec<u64> {
        page.section.section_list.iter().map(|v| v.hotel_id).collect()
    }

    #[test]
    fn test_current_location_listing() {
        let request = ListingRequest {
            query: Some("Dubai".into()),
            search_type: Some(SearchType::City),
            user_location: Some(GeoPoint::new(25.2, 55.3)),
            currency: "AED".into(),
            sort: Some("nearest_to_me".into()),
            ..ListingRequest::default()
        };
        let page = ranker("Dubai").rank(&request, &[outlet(1, 25.0, 55.0)], &[]);

        assert!(page.is_current_location);
        assert_eq!(page.section.section_list[0].hotel_subtitle, "Marina");
        assert_eq!(page.section.section_list[0].distance.as_deref(), Some("3 km"));
        assert!(page.sort_options.iter().any(|o| o.key == "nearest_to_me" && o.selected));
        assert_eq!(page.section.section_title, "1 Hotels");
    }

    #[test]
    fn test_destination_search_uses_billing_city_for_matching() {
        let r = ranker("Paris");
        let request = ListingRequest {
            search_type: Some(SearchType::City),
            billing_city: Some("Dubai".into()),
            user_location: Some(GeoPoint::new(48.85, 2.35)),
            total_records: Some(240),
            ..ListingRequest::default()
        };
        let page = r.rank(&request, &[outlet(1, 25.0, 55.0)], &[]);

        assert!(!page.is_current_location);
        assert_eq!(r.matcher.geocoder().calls.load(Ordering::SeqCst), 1);
        assert_eq!(page.section.section_list[0].hotel_subtitle, "");
        assert_eq!(page.section.section_title, "240 Hotels");
        assert_eq!(page.sort_options.len(), 3);
    }

    #[test]
    fn test_map_search_filters_by_radius() {
        let request = ListingRequest {
            is_map_search: true,
            radius_meters: Some(1_000.0),
            map_center: Some(GeoPoint::new(25.0, 55.0)),
            ..ListingRequest::default()
        };
        let outlets = vec![outlet(1, 25.005, 55.0), outlet(2, 25.5, 55.5), outlet(3, 25.0, 55.009)];
        let page = ranker("Dubai").rank(&request, &outlets, &[]);
        assert_eq!(ids(&page), vec![1, 3]);
        assert_eq!(page.total_records, 2);
    }

    #[test]
    fn test_recently_viewed_listing() {
        let viewed = vec![
            ViewedHotel {
                outlet_id: 2,
                viewed_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            },
            ViewedHotel {
                outlet_id: 1,
                viewed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        ];
        let outlets = vec![outlet(1, 25.0, 55.0), outlet(2, 25.0, 55.0), outlet(3, 25.0, 55.0)];

        let recent = ListingRequest {
            is_recently_viewed_listing: true,
            ..ListingRequest::default()
        };
        assert_eq!(ids(&ranker("Dubai").rank(&recent, &outlets, &viewed)), vec![2, 1, 3]);

        let plain = ListingRequest::default();
        assert_eq!(ids(&ranker("Dubai").rank(&plain, &outlets, &viewed)), vec![1, 2, 3]);
    }

    #[test]
    fn test_location_query_fallbacks() {
        let request = ListingRequest {
            query: Some("  ".into()),
            billing_country: Some("FR".into()),
            ..ListingRequest::default()
        };
        assert_eq!(request.location_query(), Some("FR"));
        assert!(request.is_destination_search());
        assert!(!ListingRequest::default().is_destination_search());
    }
}
