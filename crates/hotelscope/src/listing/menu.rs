use serde::Serialize;

use super::ListingConfig;

/// Sort choices offered on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOption {
    Default,
    NearestToMe,
    BestReviewed,
    MostReviewed,
}

impl SortOption {
    pub const ALL: [Self; 4] = [
        Self::Default,
        Self::NearestToMe,
        Self::BestReviewed,
        Self::MostReviewed,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::NearestToMe => "nearest_to_me",
            Self::BestReviewed => "best_reviewed",
            Self::MostReviewed => "most_reviewed",
        }
    }

    fn title(self, config: &ListingConfig) -> &str {
        match self {
            Self::Default => &config.default_sort_title,
            Self::NearestToMe => &config.nearest_sort_title,
            Self::BestReviewed => &config.best_reviewed_sort_title,
            Self::MostReviewed => &config.most_reviewed_sort_title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortMenuOption {
    pub key: String,
    pub title: String,
    pub selected: bool,
}

/// The sort menu. "Nearest to me" only makes sense when the user is searching
/// where they are.
pub fn sort_menu_options(
    is_current_location: bool,
    selected: Option<&str>,
    config: &ListingConfig,
) -> Vec<SortMenuOption> {
    SortOption::ALL
        .into_iter()
        .filter(|option| is_current_location || *option != SortOption::NearestToMe)
        .map(|option| SortMenuOption {
            key: option.key().to_string(),
            title: option.title(config).to_string(),
            selected: selected == Some(option.key()),
        })
        .collect()
}
