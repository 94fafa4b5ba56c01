pub(crate) mod lenient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication state of a listing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Rented,
    Draft,
    /// Missing or unrecognised status as stored by the backend
    #[default]
    #[serde(other)]
    Unknown,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rented => "rented",
            Self::Draft => "draft",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rental listing as held by the listing store.
///
/// Every field tolerates a missing or malformed value: numbers fall back to
/// zero, strings and lists to empty, timestamps to absent. The defaults are
/// applied here, when a record is deserialised, so the search code never has
/// to second-guess a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    /// Monthly rent in whole currency units
    #[serde(default, deserialize_with = "lenient::u64")]
    pub price: u64,
    /// City / neighbourhood, e.g. "Nairobi, Westlands"
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub full_address: String,
    /// "Apartment", "House", ... Open set, compared case-insensitively.
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub property_type: String,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub bedrooms: u32,
    /// Half baths are expressed as `.5`
    #[serde(default, deserialize_with = "lenient::f32")]
    pub bathrooms: f32,
    /// Square feet
    #[serde(default, deserialize_with = "lenient::u32")]
    pub area: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub amenities: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub year_built: Option<u32>,
    /// Free-text availability, e.g. "Available Now" or "From 1 March"
    #[serde(default, deserialize_with = "lenient::string")]
    pub available: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: PropertyStatus,
    #[serde(default, deserialize_with = "lenient::string")]
    pub owner_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub owner_name: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PropertyRecord {
    /// Creation time in epoch seconds, 0 when the record carries none
    pub fn created_at_seconds(&self) -> i64 {
        self.created_at.map(|t| t.timestamp()).unwrap_or(0)
    }

    pub fn is_available(&self) -> bool {
        self.status == PropertyStatus::Active
    }

    /// Required listing fields that are still blank
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.price == 0 {
            missing.push("price");
        }
        if self.property_type.trim().is_empty() {
            missing.push("type");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        missing
    }

    /// Fill the fallbacks the listing form applies before saving
    pub fn with_listing_defaults(mut self) -> Self {
        if self.full_address.trim().is_empty() {
            self.full_address = self.location.clone();
        }
        if self.available.trim().is_empty() {
            self.available = "Available Now".to_string();
        }
        if self.owner_name.trim().is_empty() {
            self.owner_name = "Property Owner".to_string();
        }
        self
    }

    /// Copy every field set in `update` onto this record
    pub fn apply(&mut self, update: &PropertyUpdate) {
        if let Some(v) = &update.title {
            self.title = v.clone();
        }
        if let Some(v) = update.price {
            self.price = v;
        }
        if let Some(v) = &update.location {
            self.location = v.clone();
        }
        if let Some(v) = &update.full_address {
            self.full_address = v.clone();
        }
        if let Some(v) = &update.property_type {
            self.property_type = v.clone();
        }
        if let Some(v) = update.bedrooms {
            self.bedrooms = v;
        }
        if let Some(v) = update.bathrooms {
            self.bathrooms = v;
        }
        if let Some(v) = update.area {
            self.area = v;
        }
        if let Some(v) = &update.description {
            self.description = v.clone();
        }
        if let Some(v) = &update.amenities {
            self.amenities = v.clone();
        }
        if let Some(v) = &update.available {
            self.available = v.clone();
        }
        if let Some(v) = &update.images {
            self.images = v.clone();
        }
        if let Some(v) = update.status {
            self.status = v;
        }
        if let Some(year) = update.year_built {
            self.year_built = Some(year);
        }
    }
}

/// Partial edit of a listing. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
}

impl PropertyUpdate {
    pub fn status(status: PropertyStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Account role chosen at registration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Owner,
    Seeker,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Profile document kept next to the identity provider account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub user_type: UserType,
}

impl UserProfile {
    /// Contact address exposed to seekers, if the owner has one on file
    pub fn contact_email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_default() {
        let record: PropertyRecord = serde_json::from_value(json!({ "id": "p1" })).unwrap();
        assert_eq!(record.id, "p1");
        assert_eq!(record.price, 0);
        assert_eq!(record.bedrooms, 0);
        assert_eq!(record.bathrooms, 0.0);
        assert!(record.location.is_empty());
        assert!(record.images.is_empty());
        assert_eq!(record.status, PropertyStatus::Unknown);
        assert_eq!(record.created_at_seconds(), 0);
    }

    #[test]
    fn test_malformed_fields_default() {
        let record: PropertyRecord = serde_json::from_value(json!({
            "id": "p2",
            "title": null,
            "price": "not a number",
            "bedrooms": -3,
            "bathrooms": "1.5",
            "area": 850.7,
            "images": "https://img/1.jpg",
            "status": "archived",
            "createdAt": { "seconds": 1700000000, "nanoseconds": 0 }
        }))
        .unwrap();

        assert!(record.title.is_empty());
        assert_eq!(record.price, 0);
        assert_eq!(record.bedrooms, 0);
        assert_eq!(record.bathrooms, 1.5);
        assert_eq!(record.area, 850);
        assert!(record.images.is_empty());
        assert_eq!(record.status, PropertyStatus::Unknown);
        assert_eq!(record.created_at_seconds(), 1_700_000_000);
    }

    #[test]
    fn test_wire_names() {
        let record: PropertyRecord = serde_json::from_value(json!({
            "id": "p3",
            "type": "Apartment",
            "fullAddress": "12 Ngong Rd",
            "ownerId": "u1",
            "status": "active",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.property_type, "Apartment");
        assert_eq!(record.full_address, "12 Ngong Rd");
        assert_eq!(record.owner_id, "u1");
        assert!(record.is_available());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["type"], "Apartment");
        assert_eq!(back["ownerId"], "u1");
        assert_eq!(back["status"], "active");
    }

    #[test]
    fn test_available_text_survives_round_trip() {
        let record: PropertyRecord =
            serde_json::from_value(json!({ "id": "p4", "available": "From 1 March" })).unwrap();
        assert_eq!(record.available, "From 1 March");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["available"], "From 1 March");
    }

    #[test]
    fn test_required_fields_and_defaults() {
        let blank = PropertyRecord::default();
        assert_eq!(blank.missing_required_fields(), vec!["title", "price", "type", "location"]);

        let record = PropertyRecord {
            title: "Bedsitter".to_string(),
            price: 12_000,
            property_type: "Studio".to_string(),
            location: "Nairobi, Ngara".to_string(),
            ..Default::default()
        }
        .with_listing_defaults();
        assert!(record.missing_required_fields().is_empty());
        assert_eq!(record.full_address, "Nairobi, Ngara");
        assert_eq!(record.available, "Available Now");
        assert_eq!(record.owner_name, "Property Owner");
    }

    #[test]
    fn test_apply_update() {
        let mut record = PropertyRecord {
            title: "Old".to_string(),
            price: 10,
            status: PropertyStatus::Draft,
            ..Default::default()
        };
        let update = PropertyUpdate {
            price: Some(20),
            year_built: Some(2015),
            ..PropertyUpdate::status(PropertyStatus::Active)
        };
        record.apply(&update);
        assert_eq!(record.title, "Old");
        assert_eq!(record.price, 20);
        assert_eq!(record.status, PropertyStatus::Active);
        assert_eq!(record.year_built, Some(2015));

        let fields = serde_json::to_value(&update).unwrap();
        assert_eq!(fields, json!({ "price": 20, "yearBuilt": 2015, "status": "active" }));
        assert!(PropertyUpdate::default().is_empty());
    }

    #[test]
    fn test_contact_email() {
        let mut user = UserProfile {
            id: "u1".to_string(),
            email: "  owner@example.com ".to_string(),
            ..Default::default()
        };
        assert_eq!(user.contact_email(), Some("owner@example.com"));

        user.email.clear();
        assert_eq!(user.contact_email(), None);
    }
}
