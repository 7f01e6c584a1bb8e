//! Scored text + geo query for the travel index.
//!
//! The query matches all terms of the user's text against the weighted `name` and
//! `address` fields, pushes hotels slightly below cities and countries with a
//! negative boost, and lifts hotels close to the user with a gaussian decay.
//! Neither adjustment filters anything out.

use serde_json::{Value, json};

use crate::geo::{GeoPoint, haversine_km};

/// Score multiplier for documents of type `hotel`.
pub const HOTEL_NEGATIVE_BOOST: f64 = 0.9;
/// Distance at which the proximity decay halves a hotel's score.
pub const PROXIMITY_SCALE_KM: f64 = 10.0;
pub const DEFAULT_HIT_LIMIT: usize = 10;

const HOTEL_DOC_TYPE: &str = "hotel";
const GEO_FIELD: &str = "geo_location";
/// Decay value reached at `scale` distance, the backend default.
const DECAY_AT_SCALE: f64 = 0.5;

/// Permitted edit distance between query terms and indexed terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fuzziness {
    /// No edits, exact term matches only.
    Exact,
    /// Edit distance grows with term length.
    Auto,
}

impl Fuzziness {
    /// Value sent to the search backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "0",
            Self::Auto => "AUTO",
        }
    }

    /// Maximum edits allowed for `term`: none up to 2 characters, one up to 5, then two.
    pub fn max_edits(self, term: &str) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Auto => match term.chars().count() {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
        }
    }
}

/// A searchable field and its boost.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedField {
    pub name: String,
    pub boost: f64,
}

impl WeightedField {
    pub fn new(name: impl Into<String>, boost: f64) -> Self {
        Self {
            name: name.into(),
            boost,
        }
    }

    /// `name^boost`, or the bare name for a boost of 1.
    fn to_dsl(&self) -> String {
        if (self.boost - 1.0).abs() < f64::EPSILON {
            self.name.clone()
        } else {
            format!("{}^{}", self.name, self.boost)
        }
    }
}

/// Gaussian distance decay around the user's position.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityDecay {
    pub origin: GeoPoint,
    pub scale_km: f64,
    /// Only documents of this type are decayed.
    pub doc_type: String,
}

impl ProximityDecay {
    /// Multiplier for a document at `point`: 1 at the origin, 0.5 at `scale_km`.
    pub fn factor(&self, point: GeoPoint) -> f64 {
        if self.scale_km <= 0.0 {
            return 1.0;
        }
        let distance = haversine_km(self.origin, point);
        DECAY_AT_SCALE.powf((distance / self.scale_km).powi(2))
    }

    pub fn applies_to(&self, doc_type: &str) -> bool {
        self.doc_type == doc_type
    }
}

/// A complete auto-suggest query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    pub text: String,
    pub fields: Vec<WeightedField>,
    pub fuzziness: Fuzziness,
    /// Documents of this type get `negative_boost` applied to their score.
    pub negative_type: String,
    pub negative_boost: f64,
    pub proximity: Option<ProximityDecay>,
    pub limit: usize,
}

/// Builds the travel auto-suggest query for `text`.
///
/// The proximity decay is only attached when `origin` is a usable point.
pub fn build_query(text: &str, origin: Option<GeoPoint>, fuzziness: Fuzziness) -> QueryDocument {
    QueryDocument {
        text: text.trim().to_string(),
        fields: vec![WeightedField::new("name", 2.0), WeightedField::new("address", 1.0)],
        fuzziness,
        negative_type: HOTEL_DOC_TYPE.to_string(),
        negative_boost: HOTEL_NEGATIVE_BOOST,
        proximity: GeoPoint::usable(origin).map(|origin| ProximityDecay {
            origin,
            scale_km: PROXIMITY_SCALE_KM,
            doc_type: HOTEL_DOC_TYPE.to_string(),
        }),
        limit: DEFAULT_HIT_LIMIT,
    }
}

impl QueryDocument {
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Score multiplier from the negative boost for a document of `doc_type`.
    pub fn type_boost(&self, doc_type: &str) -> f64 {
        if doc_type == self.negative_type {
            self.negative_boost
        } else {
            1.0
        }
    }

    /// Renders the Elasticsearch request body.
    pub fn to_json(&self) -> Value {
        let fields: Vec<String> = self.fields.iter().map(WeightedField::to_dsl).collect();
        let mut function_score = json!({
            "query": {
                "boosting": {
                    "positive": {
                        "multi_match": {
                            "query": self.text,
                            "fields": fields,
                            "operator": "and",
                            "fuzziness": self.fuzziness.as_str(),
                        }
                    },
                    "negative": {
                        "bool": {
                            "should": {
                                "term": { "type": self.negative_type }
                            }
                        }
                    },
                    "negative_boost": self.negative_boost,
                }
            }
        });

        if let Some(decay) = &self.proximity {
            function_score["functions"] = json!([{
                "filter": {
                    "term": { "type": decay.doc_type }
                },
                "gauss": {
                    GEO_FIELD: {
                        "origin": {
                            "lat": decay.origin.latitude,
                            "lon": decay.origin.longitude,
                        },
                        "scale": format!("{}km", decay.scale_km),
                    }
                }
            }]);
        }

        json!({
            "size": self.limit,
            "query": { "function_score": function_score },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUBAI: GeoPoint = GeoPoint::new(25.2048, 55.2708);

    #[test]
    fn test_query_shape() {
        let body = build_query("dubai marina", Some(DUBAI), Fuzziness::Exact).to_json();
        let function_score = &body["query"]["function_score"];
        let boosting = &function_score["query"]["boosting"];

        let multi_match = &boosting["positive"]["multi_match"];
        assert_eq!(multi_match["query"], "dubai marina");
        assert_eq!(multi_match["fields"], json!(["name^2", "address"]));
        assert_eq!(multi_match["operator"], "and");
        assert_eq!(multi_match["fuzziness"], "0");

        assert_eq!(boosting["negative"]["bool"]["should"]["term"]["type"], "hotel");
        assert_eq!(boosting["negative_boost"], json!(0.9));

        let function = &function_score["functions"][0];
        assert_eq!(function["filter"]["term"]["type"], "hotel");
        assert_eq!(function["gauss"]["geo_location"]["scale"], "10km");
        assert_eq!(function["gauss"]["geo_location"]["origin"]["lat"], json!(25.2048));
        assert_eq!(function["gauss"]["geo_location"]["origin"]["lon"], json!(55.2708));
        assert_eq!(body["size"], json!(10));
    }

    #[test]
    fn test_auto_fuzziness_value() {
        let body = build_query("dubai", Some(DUBAI), Fuzziness::Auto).to_json();
        assert_eq!(
            body["query"]["function_score"]["query"]["boosting"]["positive"]["multi_match"]["fuzziness"],
            "AUTO"
        );
    }

    #[test]
    fn test_no_origin_drops_decay() {
        let query = build_query("paris", None, Fuzziness::Exact);
        assert!(query.proximity.is_none());
        assert!(query.to_json()["query"]["function_score"].get("functions").is_none());

        let zero = build_query("paris", Some(GeoPoint::new(0.0, 0.0)), Fuzziness::Exact);
        assert!(zero.proximity.is_none());
    }

    #[test]
    fn test_decay_factor() {
        let query = build_query("x", Some(DUBAI), Fuzziness::Exact);
        let decay = query.proximity.unwrap();
        assert!((decay.factor(DUBAI) - 1.0).abs() < 1e-12);

        // roughly 10 km north
        let ten_km = GeoPoint::new(DUBAI.latitude + 10.0 / 111.195, DUBAI.longitude);
        assert!((decay.factor(ten_km) - 0.5).abs() < 0.01);
        assert!(decay.applies_to("hotel"));
        assert!(!decay.applies_to("city"));
    }

    #[test]
    fn test_type_boost() {
        let query = build_query("x", None, Fuzziness::Auto);
        assert!((query.type_boost("hotel") - 0.9).abs() < f64::EPSILON);
        assert!((query.type_boost("city") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_auto_edit_distances() {
        assert_eq!(Fuzziness::Auto.max_edits("ab"), 0);
        assert_eq!(Fuzziness::Auto.max_edits("paris"), 1);
        assert_eq!(Fuzziness::Auto.max_edits("marina"), 2);
        assert_eq!(Fuzziness::Exact.max_edits("marina"), 0);
    }
}
