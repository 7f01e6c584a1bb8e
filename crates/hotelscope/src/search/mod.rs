//! Travel search: query construction, auto-complete and search shortcuts.
//!
//! The search backend is reached through the [`SearchIndex`] port. Queries are
//! built as typed [`QueryDocument`]s which render to the Elasticsearch DSL and
//! can also be executed by the local [`crate::TravelIndex`].

use serde::{Deserialize, Serialize};

mod auto_complete;
mod query;
mod shortcuts;

pub use auto_complete::{
    IndexDocument, SearchIndex, SearchParams, SearchRequest, SearchSuggestion, SearchTarget,
    TravelSearch, suggestion_from_document,
};
pub use error::{Result, SearchError};
pub use query::{
    DEFAULT_HIT_LIMIT, Fuzziness, HOTEL_NEGATIVE_BOOST, PROXIMITY_SCALE_KM, ProximityDecay,
    QueryDocument, WeightedField, build_query,
};
pub use shortcuts::{
    PopularDestination, RecentSearch, SearchShortcut, popular_destination_shortcuts,
    recent_search_shortcuts,
};

/// Kind of destination a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    City,
    Country,
    Hotel,
}

impl SearchType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Country => "country",
            Self::Hotel => "hotel",
        }
    }

    /// Maps an index document type. Anything that is not a city or a country is a hotel.
    pub fn from_doc_type(doc_type: &str) -> Self {
        match doc_type.trim().to_ascii_lowercase().as_str() {
            "city" => Self::City,
            "country" => Self::Country,
            _ => Self::Hotel,
        }
    }
}

/// Configuration for auto-complete searches.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Index holding cities, countries and hotels.
    pub index_name: String,
    /// Maximum hits requested per query.
    pub max_hits: usize,
    /// Display titles longer than this many characters are cut and get `...`.
    pub title_max_chars: usize,
    pub location_pin_icon: String,
    pub hotel_pin_icon: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_name: "et_travel".to_string(),
            max_hits: DEFAULT_HIT_LIMIT,
            title_max_chars: 40,
            location_pin_icon: "icons/location_pin.png".to_string(),
            hotel_pin_icon: "icons/hotel_pin.png".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn builder() -> crate::SearchConfigBuilder {
        crate::SearchConfigBuilder::new()
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Search backend unavailable: {0}")]
        Unavailable(String),
        #[error("Index error: {0}")]
        IndexError(#[from] crate::index::IndexError),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_from_doc_type() {
        assert_eq!(SearchType::from_doc_type("city"), SearchType::City);
        assert_eq!(SearchType::from_doc_type("Country"), SearchType::Country);
        assert_eq!(SearchType::from_doc_type("hotel"), SearchType::Hotel);
        assert_eq!(SearchType::from_doc_type("resort"), SearchType::Hotel);
    }

    #[test]
    fn test_search_type_serde() {
        assert_eq!(serde_json::to_string(&SearchType::City).unwrap(), "\"city\"");
        let parsed: SearchType = serde_json::from_str("\"country\"").unwrap();
        assert_eq!(parsed, SearchType::Country);
    }
}
