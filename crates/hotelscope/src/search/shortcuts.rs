//! Search bar shortcuts shown before the user types: recent searches and
//! curated popular destinations.

use serde::{Deserialize, Serialize};

use super::{SearchParams, SearchTarget, SearchType};
use crate::lenient;

/// A stored search of one customer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecentSearch {
    pub title: String,
    pub search_type: String,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub outlet_id: Option<u64>,
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub merchant_id: Option<u64>,
}

/// A curated destination for a locale.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopularDestination {
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(rename = "type")]
    pub destination_type: String,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchShortcut {
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SearchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<u64>,
    pub api_params: SearchParams,
}

pub fn recent_search_shortcuts(recent: &[RecentSearch]) -> Vec<SearchShortcut> {
    recent
        .iter()
        .map(|search| {
            let search_type = SearchType::from_doc_type(&search.search_type);
            let target = match search_type {
                SearchType::City => SearchTarget::City {
                    billing_city: search.city.clone().unwrap_or_default(),
                },
                SearchType::Country => SearchTarget::Country {
                    billing_country: search.country.clone().unwrap_or_default(),
                },
                SearchType::Hotel => SearchTarget::Hotel {
                    outlet_id: search.outlet_id,
                    merchant_id: search.merchant_id,
                    is_hww_instant_booking: None,
                },
            };
            SearchShortcut {
                title: search.title.clone(),
                search_type: Some(search_type),
                destination_id: None,
                api_params: SearchParams {
                    query: Some(search.title.clone()),
                    map_lat: None,
                    map_lng: None,
                    target,
                },
            }
        })
        .collect()
}

/// Destinations carry only their city or country; hotel destinations get a bare target.
pub fn popular_destination_shortcuts(destinations: &[PopularDestination]) -> Vec<SearchShortcut> {
    destinations
        .iter()
        .map(|destination| {
            let target = match SearchType::from_doc_type(&destination.destination_type) {
                SearchType::City => SearchTarget::City {
                    billing_city: destination.billing_city.clone().unwrap_or_default(),
                },
                SearchType::Country => SearchTarget::Country {
                    billing_country: destination.billing_country.clone().unwrap_or_default(),
                },
                SearchType::Hotel => SearchTarget::Hotel {
                    outlet_id: None,
                    merchant_id: None,
                    is_hww_instant_booking: None,
                },
            };
            SearchShortcut {
                title: destination.title.clone(),
                search_type: None,
                destination_id: destination.id,
                api_params: SearchParams {
                    query: None,
                    map_lat: None,
                    map_lng: None,
                    target,
                },
            }
        })
        .collect()
}
