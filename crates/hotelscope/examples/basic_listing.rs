//! Listing and auto-complete without any network services
//!
//! This example demonstrates:
//! - Auto-complete over a local travel index
//! - Ranking a listing with an offline geocoder
//! - Reordering packages with the shared sort composer

use hotelscope::{
    Address, Country, CountryResolver, GeoPoint, IndexDocument, ListingConfig, ListingRanker,
    ListingRequest, LocationMatcher, ReverseGeocoder, SearchConfig, SearchType, TravelIndex,
    TravelSearch, geo::GeoError, order_packages,
};
use serde_json::json;

/// Pretends every position is in Dubai.
struct DubaiGeocoder;

impl ReverseGeocoder for DubaiGeocoder {
    fn reverse(&self, _point: GeoPoint) -> Result<Option<Address>, GeoError> {
        Ok(Some(Address {
            city: Some("Dubai".into()),
            country: Some("United Arab Emirates".into()),
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    hotelscope::init_logging(tracing::Level::INFO)?;

    let documents: Vec<IndexDocument> = serde_json::from_value(json!([
        {"name": "Dubai", "type": "city", "city": "Dubai", "lat": 25.2048, "lng": 55.2708},
        {"name": "Burj Al Arab", "address": "Jumeirah, Dubai", "type": "hotel", "outlet_id": 1, "merchant_id": 9},
    ]))?;
    let search = TravelSearch::new(
        TravelIndex::from_documents("et_travel", documents)?,
        SearchConfig::default(),
    );

    println!("Suggestions for 'duba':");
    for suggestion in search.auto_complete("duba", None) {
        println!("  {} ({}) -> {}", suggestion.title, suggestion.doc_type, serde_json::to_string(&suggestion.api_params)?);
    }

    let ranker = ListingRanker::new(
        LocationMatcher::new(DubaiGeocoder, NoCountries),
        ListingConfig::default(),
    );
    let request = ListingRequest {
        query: Some("Dubai".into()),
        search_type: Some(SearchType::City),
        user_location: Some(GeoPoint::new(25.2, 55.27)),
        currency: "AED".into(),
        ..ListingRequest::default()
    };
    let outlets = vec![json!({
        "id": 1, "hotel": "Burj Al Arab", "hotel_rating": 5, "lat": 25.1412, "lng": 55.1853,
        "merchant": {"id": 9, "logo_small_url": null}, "images_url": [],
        "is_hww_instant_booking": 1, "hww_title": "Book now", "package_price": 2400, "no_of_nights": 1,
        "neighborhood": "Jumeirah", "distance": 9400
    })];

    let page = ranker.rank(&request, &outlets, &[]);
    println!("\n{}:", page.section.section_title);
    for card in &page.section.section_list {
        println!(
            "  {} - {} [{}] {}",
            card.hotel_title,
            card.hotel_subtitle,
            card.distance.as_deref().unwrap_or("-"),
            card.hotel_offer_title
        );
    }

    let packages = order_packages(serde_json::from_value(json!([
        {"offer_title": "Room only", "discounted_price_value": 1900},
        {"offer_title": "Half board", "discounted_price_value": 2400, "is_best_offer": true},
    ]))?);
    println!("\nPackages:");
    for package in packages {
        println!("  {} {}", package.offer_title, package.discounted_price_value);
    }

    Ok(())
}
