//! Hotel listing: turns outlet service records into listing cards and orders them.
//!
//! Formatting is per record: a record that cannot be turned into a card is logged
//! and skipped so the rest of the batch still renders. [`ListingRanker`] runs the
//! whole listing flow for one request.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

mod menu;
mod ranker;
mod record;

pub use error::{ListingError, Result};
pub use menu::{SortMenuOption, SortOption, sort_menu_options};
pub use ranker::{ListingPage, ListingRanker, ListingRequest, ListingSection};
pub use record::{
    ANALYTICS_SOURCE_CONNECTED, INQUIRE_FOR_RATES, INSTANT_BOOKING, Merchant, OutletApiParams,
    OutletRecord, OutletView, night_text,
};

use crate::lenient;
use crate::sort::{SortKey, multi_key_sort};

const VIEWED_AT_FIELD: &str = "viewed_at";

/// Per-request formatting switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// The user is searching for the place they are standing in.
    pub is_current_location: bool,
    /// The listing is scoped by an explicit billing city or country.
    pub is_destination_search: bool,
    /// Currency code printed in front of prices.
    pub currency: String,
}

/// Configuration for listing responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingConfig {
    /// Offer image shown on inquiry-only outlets.
    pub inquiry_image_url: String,
    /// Section title, `{}` is replaced by the record count.
    pub section_title_template: String,
    pub section_identifier: String,
    pub default_sort_title: String,
    pub nearest_sort_title: String,
    pub best_reviewed_sort_title: String,
    pub most_reviewed_sort_title: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            inquiry_image_url: "icons/inquire_for_rates.png".to_string(),
            section_title_template: "{} Hotels".to_string(),
            section_identifier: "search_similar_results".to_string(),
            default_sort_title: "Recommended for you".to_string(),
            nearest_sort_title: "Nearest to me".to_string(),
            best_reviewed_sort_title: "Best reviewed".to_string(),
            most_reviewed_sort_title: "Most reviewed".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn builder() -> crate::ListingConfigBuilder {
        crate::ListingConfigBuilder::new()
    }

    pub fn section_title(&self, total: u64) -> String {
        self.section_title_template.replace("{}", &total.to_string())
    }
}

/// A hotel the customer looked at, newest entries last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewedHotel {
    #[serde(deserialize_with = "viewed_outlet_id")]
    pub outlet_id: u64,
    #[serde(alias = "date_updated")]
    pub viewed_at: DateTime<Utc>,
}

fn viewed_outlet_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient::opt_u64(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("outlet_id must be a non-negative integer"))
}

/// Formats raw outlet records into listing cards, in input order.
///
/// Records are decoded and formatted in parallel. A record that does not decode or
/// lacks a required field is skipped with a warning.
#[instrument(name = "Format Outlets", skip(outlets, config), fields(num_outlets = outlets.len()))]
pub fn format_outlets(
    outlets: &[Value],
    options: &FormatOptions,
    config: &ListingConfig,
) -> Vec<OutletView> {
    let views: Vec<OutletView> = outlets
        .par_iter()
        .enumerate()
        .filter_map(|(position, raw)| match format_outlet(raw, options, config) {
            Ok(view) => Some(view),
            Err(e) => {
                warn!(position, error = %e, "Skipping malformed outlet record");
                None
            }
        })
        .collect();

    debug!(formatted = views.len(), skipped = outlets.len() - views.len(), "Outlets formatted");
    views
}

fn format_outlet(raw: &Value, options: &FormatOptions, config: &ListingConfig) -> Result<OutletView> {
    let record = OutletRecord::deserialize(raw)?;
    OutletView::from_record(record, options, config)
}

/// Orders cards by when the customer last viewed them, newest first.
///
/// Cards never viewed keep their relative order after the viewed ones. When an
/// outlet appears more than once in `recently_viewed` the later entry wins.
#[instrument(name = "Apply Recency Order", level = "debug", skip_all, fields(num_outlets = outlets.len(), num_viewed = recently_viewed.len()))]
pub fn apply_recency_order(
    mut outlets: Vec<OutletView>,
    recently_viewed: &[ViewedHotel],
) -> Vec<OutletView> {
    let viewed_at: AHashMap<u64, DateTime<Utc>> = recently_viewed
        .iter()
        .map(|viewed| (viewed.outlet_id, viewed.viewed_at))
        .collect();

    for outlet in &mut outlets {
        if let Some(at) = viewed_at.get(&outlet.hotel_id) {
            outlet.viewed_at = Some(*at);
        }
    }

    multi_key_sort(outlets, &[SortKey::descending(VIEWED_AT_FIELD)])
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ListingError {
        #[error("Outlet record is missing required field `{0}`")]
        MissingField(&'static str),
        #[error("Outlet record could not be decoded: {0}")]
        Decode(#[from] serde_json::Error),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, ListingError>;
}
