use serde_json::{Map, Value};
use tracing::debug;

use super::types::FilterSpec;
use crate::models::lenient::non_negative;

/// Drop entries that carry no value (`null`, empty or blank strings) and trim
/// the strings that remain. "Nothing entered" and "field absent" come out the
/// same, and normalising twice changes nothing.
pub fn normalize(raw: &Map<String, Value>) -> Map<String, Value> {
    raw.iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| (key.clone(), Value::String(trimmed.to_string())))
            }
            other => Some((key.clone(), other.clone())),
        })
        .collect()
}

impl FilterSpec {
    /// Build a filter from the view layer's key/value state.
    ///
    /// Keys are the web client's: `city`, `type`, `minPrice`, `maxPrice`,
    /// `bedrooms`, `bathrooms`, `availableOnly`. Values that can't be coerced
    /// are treated as absent, unknown keys are ignored.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let active = normalize(raw);
        let mut filter = FilterSpec::default();

        for (key, value) in &active {
            match key.as_str() {
                "city" => filter.city = text(value),
                "type" => filter.property_type = text(value),
                "minPrice" => filter.min_price = whole(key, value, f64::ceil),
                "maxPrice" => filter.max_price = whole(key, value, f64::floor),
                "bedrooms" => filter.bedrooms = number(key, value),
                "bathrooms" => filter.bathrooms = number(key, value).map(|n| n as f32),
                "availableOnly" => filter.available_only = flag(key, value),
                _ => debug!(key = %key, "ignoring unknown filter key"),
            }
        }

        filter
    }

    /// Build a filter from a URL query string such as
    /// `city=nairobi&type=Apartment&minPrice=20000`.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let raw: Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Self::from_raw(&raw)
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(key: &str, value: &Value) -> Option<f64> {
    let n = non_negative(value);
    if n.is_none() {
        debug!(key, value = %value, "ignoring non-numeric filter value");
    }
    n
}

/// Integral price bound. `round` picks the direction that keeps an inclusive
/// bound from admitting anything outside the entered value.
fn whole(key: &str, value: &Value, round: fn(f64) -> f64) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    number(key, value).map(|n| round(n) as u64)
}

fn flag(key: &str, value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                debug!(key, value = %s, "ignoring non-boolean filter value");
                None
            }
        },
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyRecord;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_normalize_strips_empty_values() {
        let raw = map(json!({
            "city": "",
            "type": "   ",
            "minPrice": null,
            "bedrooms": 2,
            "availableOnly": false,
            "location": " Kilimani "
        }));

        let active = normalize(&raw);
        assert_eq!(
            Value::Object(active),
            json!({ "bedrooms": 2, "availableOnly": false, "location": "Kilimani" })
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = map(json!({ "city": " Nairobi ", "type": "", "maxPrice": "90000" }));
        let once = normalize(&raw);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_raw_coerces_values() {
        let filter = FilterSpec::from_raw(&map(json!({
            "city": "Nairobi",
            "type": "House",
            "minPrice": "20000",
            "maxPrice": 80000,
            "bedrooms": "3",
            "bathrooms": 1.5,
            "availableOnly": "true",
            "sort": "newest"
        })));

        assert_eq!(
            filter,
            FilterSpec {
                city: Some("Nairobi".to_string()),
                property_type: Some("House".to_string()),
                min_price: Some(20_000),
                max_price: Some(80_000),
                bedrooms: Some(3.0),
                bathrooms: Some(1.5),
                available_only: Some(true),
            }
        );
    }

    #[test]
    fn test_from_raw_blank_and_bad_values_are_absent() {
        let filter = FilterSpec::from_raw(&map(json!({
            "city": "",
            "minPrice": "lots",
            "maxPrice": -5,
            "bedrooms": null,
            "availableOnly": "maybe"
        })));
        assert!(filter.is_identity());
    }

    #[test]
    fn test_from_query() {
        let filter = FilterSpec::from_query("?city=nairobi&type=Apartment&minPrice=10000&bedrooms=2&maxPrice=");
        assert_eq!(filter.city.as_deref(), Some("nairobi"));
        assert_eq!(filter.property_type.as_deref(), Some("Apartment"));
        assert_eq!(filter.min_price, Some(10_000));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.bedrooms, Some(2.0));
    }

    #[test]
    fn test_fractional_price_bounds_stay_inclusive() {
        let filter = FilterSpec::from_query("minPrice=59999.5&maxPrice=60000.5");
        assert_eq!(filter.min_price, Some(60_000));
        assert_eq!(filter.max_price, Some(60_000));

        let below = PropertyRecord { id: "below".to_string(), price: 59_999, ..Default::default() };
        let at = PropertyRecord { id: "at".to_string(), price: 60_000, ..Default::default() };
        let above = PropertyRecord { id: "above".to_string(), price: 60_001, ..Default::default() };
        assert!(!filter.matches(&below));
        assert!(filter.matches(&at));
        assert!(!filter.matches(&above));
    }

    #[test]
    fn test_fractional_bedrooms_match_nothing() {
        let filter = FilterSpec::from_raw(&map(json!({ "bedrooms": 2.7 })));
        assert_eq!(filter.bedrooms, Some(2.7));
        assert!(!filter.is_identity());

        let records: Vec<PropertyRecord> = [2, 3]
            .into_iter()
            .map(|bedrooms| PropertyRecord { bedrooms, ..Default::default() })
            .collect();
        assert!(records.iter().all(|r| !filter.matches(r)));
        assert!(FilterSpec::from_query("bedrooms=2.7").bedrooms.is_some());
    }

    #[test]
    fn test_from_query_decodes_escapes() {
        let filter = FilterSpec::from_query("city=Nairobi%2C+Westlands");
        assert_eq!(filter.city.as_deref(), Some("Nairobi, Westlands"));
    }
}
