//! hotelscope - ranking and geofiltering core for hotel listing and search
//!
//! hotelscope turns raw outlet records, search index hits and reverse-geocoding answers
//! into ranked, geo-constrained view models for a hotel booking app. Everything here is
//! request scoped: external services are reached through small traits
//! ([`ReverseGeocoder`], [`CountryResolver`], [`SearchIndex`]) and nothing is cached.
//!
//! # Quick Start
//!
//! ```rust
//! use hotelscope::{GeoPoint, IndexDocument, SearchConfig, TravelIndex, TravelSearch};
//!
//! let documents: Vec<IndexDocument> = serde_json::from_value(serde_json::json!([
//!     {"name": "Dubai", "type": "city", "city": "Dubai", "lat": 25.2, "lng": 55.27},
//!     {"name": "Dubai Marina Hotel", "type": "hotel", "outlet_id": 7, "merchant_id": 3},
//! ]))?;
//! let index = TravelIndex::from_documents("et_travel", documents)?;
//! let search = TravelSearch::new(index, SearchConfig::default());
//!
//! // A typo still finds the city through the fuzzy fallback
//! let suggestions = search.auto_complete("dubia", Some(GeoPoint::new(25.1, 55.2)));
//! assert_eq!(suggestions[0].title, "Dubai");
//! # Ok::<(), hotelscope::error::HotelScopeError>(())
//! ```
//!
//! # Features
//!
//! - **Search**: boosting + gaussian decay query construction, exact-then-fuzzy auto-complete
//! - **Geo**: point-in-circle map filtering and "is the user searching where they stand" matching
//! - **Listing**: outlet cards, recently-viewed ordering and sort menus
//! - **Sorting**: one stable multi-key sort shared by listings, bookings and packages
//! - **Local index**: an in-memory Tantivy index that executes the same queries offline
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub mod bookings;
mod config;
pub mod error;
pub mod geo;
mod index;
mod lenient;
pub mod listing;
pub mod packages;
pub mod search;
pub mod sort;

pub use bookings::{BookingSummary, BookingTimeline, split_bookings};
pub use config::{ListingConfigBuilder, SearchConfigBuilder, SortTitlesBuilder};
pub use geo::{
    Address, Country, CountryResolver, GeoPoint, LocationMatcher, RadiusFilterSpec,
    ReverseGeocoder, filter_by_radius,
};
pub use index::{IndexError, TravelIndex};
pub use listing::{
    FormatOptions, ListingConfig, ListingPage, ListingRanker, ListingRequest, OutletView,
    ViewedHotel, apply_recency_order, format_outlets, sort_menu_options,
};
pub use packages::{PackageOffer, order_packages};
pub use search::{
    Fuzziness, IndexDocument, QueryDocument, SearchConfig, SearchIndex, SearchSuggestion,
    SearchType, TravelSearch, build_query,
};
pub use sort::{SortKey, multi_key_sort};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for hotelscope.
///
/// Sets up a `tracing` subscriber honouring `RUST_LOG` when present, falling back to
/// `level`. Safe to call more than once; only the first call installs the subscriber.
///
/// ```rust
/// use hotelscope::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), hotelscope::error::HotelScopeError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::HotelScopeError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("tantivy=warn".parse()?)
            .add_directive("hyper_util=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
