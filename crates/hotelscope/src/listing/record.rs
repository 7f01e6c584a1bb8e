//! Raw outlet records and the listing view model built from them.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{FormatOptions, ListingConfig, ListingError, Result};
use crate::geo::{GeoPoint, Located};
use crate::lenient;
use crate::sort::{SortFields, SortValue};

pub const INQUIRE_FOR_RATES: &str = "Inquire For Rates";
pub const INSTANT_BOOKING: &str = "Instant Booking";
pub const ANALYTICS_SOURCE_CONNECTED: &str = "connected";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Merchant {
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    pub logo_small_url: Option<String>,
}

/// An outlet as returned by the outlet service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutletRecord {
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    pub hotel: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub hotel_rating: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub lng: Option<f64>,
    pub merchant: Option<Merchant>,
    pub images_url: Value,
    #[serde(deserialize_with = "lenient::opt_flag")]
    pub is_hww_instant_booking: Option<bool>,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,
    pub neighborhood: Option<String>,
    /// Distance from the user, in metres.
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub distance: Option<f64>,
    pub hww_title: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub package_price: Option<String>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub no_of_nights: Option<u32>,
}

impl OutletRecord {
    pub fn is_inquiry_only(&self) -> bool {
        self.hww_title.as_deref() == Some(INQUIRE_FOR_RATES)
    }
}

/// Parameters for the hotel detail call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletApiParams {
    pub merchant_id: u64,
    pub outlet_id: u64,
    /// Upstream instant-booking flag, `1` or `0`.
    pub is_hww_instant_booking: u8,
}

/// One hotel card in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletView {
    pub hotel_id: u64,
    pub hotel_title: String,
    pub hotel_rating: f64,
    pub hotel_logo_url: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub merchant_id: u64,
    pub images_url: Value,
    pub analytics_source_type: String,
    pub is_connected: bool,
    pub billing_city: String,
    pub billing_country: String,
    pub hotel_subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    pub hotel_offer_title: String,
    pub hotel_offer_price_text: String,
    pub hotel_offer_night_text: String,
    pub hotel_offer_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_offer_image_url: Option<String>,
    /// `1` for instant booking, `0` for inquiry-only outlets.
    pub is_hww_instant_booking: u8,
    pub web_api_params: Map<String, Value>,
    pub api_params: OutletApiParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Offer block of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Offer {
    title: String,
    price_text: String,
    night_text: String,
    description: String,
    image_url: Option<String>,
    instant_flag: u8,
}

/// `for 1 Night`, `for N Nights`, or nothing for zero nights.
pub fn night_text(nights: u32) -> String {
    match nights {
        0 => String::new(),
        1 => "for 1 Night".to_string(),
        n => format!("for {n} Nights"),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl OutletView {
    /// Builds the card for one record, failing on the first missing required field.
    pub fn from_record(
        record: OutletRecord,
        options: &FormatOptions,
        config: &ListingConfig,
    ) -> Result<Self> {
        let hotel_id = record.id.ok_or(ListingError::MissingField("id"))?;
        let hotel_title = record.hotel.clone().ok_or(ListingError::MissingField("hotel"))?;
        let merchant = record.merchant.clone().ok_or(ListingError::MissingField("merchant"))?;
        let merchant_id = merchant.id.ok_or(ListingError::MissingField("merchant.id"))?;
        let lat = record.lat.ok_or(ListingError::MissingField("lat"))?;
        let lng = record.lng.ok_or(ListingError::MissingField("lng"))?;
        let is_connected = record
            .is_hww_instant_booking
            .ok_or(ListingError::MissingField("is_hww_instant_booking"))?;
        // Without a title the booking mode of the outlet is unknown.
        if record.hww_title.is_none() {
            return Err(ListingError::MissingField("hww_title"));
        }

        let (hotel_subtitle, distance) = subtitle(&record, options);
        let offer = offer(&record, options, config)?;

        Ok(Self {
            hotel_id,
            hotel_title,
            hotel_rating: record.hotel_rating.unwrap_or(0.0),
            hotel_logo_url: merchant.logo_small_url,
            lat,
            lng,
            merchant_id,
            images_url: record.images_url,
            analytics_source_type: ANALYTICS_SOURCE_CONNECTED.to_string(),
            is_connected,
            billing_city: record.billing_city.unwrap_or_default(),
            billing_country: record.billing_country.unwrap_or_default(),
            hotel_subtitle,
            distance,
            hotel_offer_title: offer.title,
            hotel_offer_price_text: offer.price_text,
            hotel_offer_night_text: offer.night_text,
            hotel_offer_description: offer.description,
            hotel_offer_image_url: offer.image_url,
            is_hww_instant_booking: offer.instant_flag,
            web_api_params: Map::new(),
            api_params: OutletApiParams {
                merchant_id,
                outlet_id: hotel_id,
                is_hww_instant_booking: u8::from(is_connected),
            },
            viewed_at: None,
        })
    }
}

/// Neighborhood (with distance) for searches around the user, else `city, country`
/// outside destination searches.
fn subtitle(record: &OutletRecord, options: &FormatOptions) -> (String, Option<String>) {
    if options.is_current_location
        && let Some(neighborhood) = non_empty(record.neighborhood.as_deref())
    {
        let distance = record
            .distance
            .filter(|d| *d > 0.0)
            .map(|d| format!("{} km", (d / 1000.0).ceil()));
        return (neighborhood.to_string(), distance);
    }

    if !options.is_destination_search {
        let city_country = [record.billing_city.as_deref(), record.billing_country.as_deref()]
            .into_iter()
            .filter_map(non_empty)
            .join(", ");
        return (city_country, None);
    }

    (String::new(), None)
}

fn offer(record: &OutletRecord, options: &FormatOptions, config: &ListingConfig) -> Result<Offer> {
    if record.is_inquiry_only() {
        return Ok(Offer {
            title: INQUIRE_FOR_RATES.to_string(),
            price_text: INQUIRE_FOR_RATES.to_string(),
            image_url: Some(config.inquiry_image_url.clone()),
            instant_flag: 0,
            ..Offer::default()
        });
    }

    let price = record
        .package_price
        .as_deref()
        .ok_or(ListingError::MissingField("package_price"))?;
    let price_text = format!("From {} {price}", options.currency);
    let night_text = night_text(record.no_of_nights.unwrap_or(0));
    let title = if night_text.is_empty() {
        price_text.clone()
    } else {
        format!("{price_text} {night_text}")
    };

    Ok(Offer {
        title,
        price_text,
        night_text,
        description: INSTANT_BOOKING.to_string(),
        image_url: None,
        instant_flag: 1,
    })
}

impl Located for OutletView {
    fn location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.lat, self.lng))
    }
}

impl SortFields for OutletView {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "viewed_at" => self.viewed_at.map(SortValue::from),
            "hotel_id" => Some(self.hotel_id.into()),
            "hotel_title" => Some(self.hotel_title.as_str().into()),
            "hotel_rating" => Some(self.hotel_rating.into()),
            "merchant_id" => Some(self.merchant_id.into()),
            "is_hww_instant_booking" => Some(SortValue::Number(f64::from(self.is_hww_instant_booking))),
            _ => None,
        }
    }
}
