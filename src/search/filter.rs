use super::types::FilterSpec;
use crate::models::PropertyRecord;

impl FilterSpec {
    /// True when the record passes every predicate that is set
    pub fn matches(&self, record: &PropertyRecord) -> bool {
        self.matches_city(record)
            && self.matches_type(record)
            && self.matches_price(record)
            && self.matches_rooms(record)
            && self.matches_availability(record)
    }

    fn matches_city(&self, record: &PropertyRecord) -> bool {
        match &self.city {
            Some(city) => record
                .location
                .to_lowercase()
                .contains(&city.to_lowercase()),
            None => true,
        }
    }

    fn matches_type(&self, record: &PropertyRecord) -> bool {
        match &self.property_type {
            Some(wanted) => record.property_type.to_lowercase() == wanted.to_lowercase(),
            None => true,
        }
    }

    fn matches_price(&self, record: &PropertyRecord) -> bool {
        self.min_price.map_or(true, |min| record.price >= min)
            && self.max_price.map_or(true, |max| record.price <= max)
    }

    fn matches_rooms(&self, record: &PropertyRecord) -> bool {
        self.bedrooms.map_or(true, |n| f64::from(record.bedrooms) == n)
            && self.bathrooms.map_or(true, |n| record.bathrooms == n)
    }

    fn matches_availability(&self, record: &PropertyRecord) -> bool {
        match self.available_only {
            Some(true) => record.is_available(),
            _ => true,
        }
    }
}
