//! Hotel package ordering for the detail screen.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::sort::{SortFields, SortKey, SortValue, multi_key_sort};

/// Best offers first, then the cheapest.
pub const PACKAGE_SORT_ORDER: [&str; 2] = ["-is_best_offer", "discounted_price_value"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageOffer {
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub room_id: Option<u64>,
    #[serde(default)]
    pub offer_title: String,
    #[serde(default)]
    pub is_best_offer: bool,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub actual_price_value: Option<f64>,
    #[serde(deserialize_with = "required_price")]
    pub discounted_price_value: f64,
}

fn required_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient::opt_f64(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("discounted_price_value must be a number"))
}

impl PackageOffer {
    /// Whole percent saved against the actual price, `None` when there is no saving.
    pub fn percentage_off(&self) -> Option<u32> {
        let actual = self.actual_price_value.filter(|p| *p > 0.0)?;
        let off = ((actual - self.discounted_price_value) / actual * 100.0).floor();
        (off > 0.0).then(|| off.min(100.0) as u32)
    }
}

impl SortFields for PackageOffer {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "is_best_offer" => Some(self.is_best_offer.into()),
            "discounted_price_value" => Some(self.discounted_price_value.into()),
            "actual_price_value" => self.actual_price_value.map(SortValue::from),
            "offer_title" => Some(self.offer_title.as_str().into()),
            _ => None,
        }
    }
}

pub fn order_packages(packages: Vec<PackageOffer>) -> Vec<PackageOffer> {
    multi_key_sort(packages, &SortKey::parse_all(PACKAGE_SORT_ORDER))
}
