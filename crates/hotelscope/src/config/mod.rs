use crate::{error::HotelScopeError, listing::ListingConfig, search::SearchConfig};

const COUNT_PLACEHOLDER: &str = "{}";

/// Builder for auto-complete search configuration
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with the production defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Set the index holding cities, countries and hotels
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    /// Set the maximum number of hits requested per query
    pub fn max_hits(mut self, max_hits: usize) -> Self {
        self.config.max_hits = max_hits;
        self
    }

    /// Set the display title length; must be at least one character
    pub fn title_max_chars(mut self, max_chars: usize) -> Result<Self, HotelScopeError> {
        if max_chars == 0 {
            return Err(HotelScopeError::ConfigError(
                "Title length must be at least one character".to_string(),
            ));
        }
        self.config.title_max_chars = max_chars;
        Ok(self)
    }

    /// Set the pin icons for locations and hotels
    pub fn icons(mut self, location_pin: impl Into<String>, hotel_pin: impl Into<String>) -> Self {
        self.config.location_pin_icon = location_pin.into();
        self.config.hotel_pin_icon = hotel_pin.into();
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Builder for listing configuration
#[derive(Debug, Clone, Default)]
pub struct ListingConfigBuilder {
    config: ListingConfig,
}

impl ListingConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ListingConfig::default(),
        }
    }

    /// Set the offer image shown on inquiry-only outlets
    pub fn inquiry_image_url(mut self, url: impl Into<String>) -> Self {
        self.config.inquiry_image_url = url.into();
        self
    }

    /// Set the section title template; it must contain `{}` for the hotel count
    pub fn section_title_template(
        mut self,
        template: impl Into<String>,
    ) -> Result<Self, HotelScopeError> {
        let template = template.into();
        if !template.contains(COUNT_PLACEHOLDER) {
            return Err(HotelScopeError::ConfigError(format!(
                "Section title template must contain {COUNT_PLACEHOLDER}, got {template:?}"
            )));
        }
        self.config.section_title_template = template;
        Ok(self)
    }

    pub fn section_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.config.section_identifier = identifier.into();
        self
    }

    /// Configure the titles of the sort menu
    pub fn sort_titles(self) -> SortTitlesBuilder {
        SortTitlesBuilder::new(self)
    }

    /// Build the final configuration
    pub fn build(self) -> ListingConfig {
        self.config
    }
}

/// Builder for the sort menu titles of a listing
pub struct SortTitlesBuilder {
    parent: ListingConfigBuilder,
}

impl SortTitlesBuilder {
    fn new(parent: ListingConfigBuilder) -> Self {
        Self { parent }
    }

    pub fn recommended(mut self, title: impl Into<String>) -> Self {
        self.parent.config.default_sort_title = title.into();
        self
    }

    pub fn nearest_to_me(mut self, title: impl Into<String>) -> Self {
        self.parent.config.nearest_sort_title = title.into();
        self
    }

    pub fn best_reviewed(mut self, title: impl Into<String>) -> Self {
        self.parent.config.best_reviewed_sort_title = title.into();
        self
    }

    pub fn most_reviewed(mut self, title: impl Into<String>) -> Self {
        self.parent.config.most_reviewed_sort_title = title.into();
        self
    }

    /// Return to the listing configuration builder
    pub fn done(self) -> ListingConfigBuilder {
        self.parent
    }
}
