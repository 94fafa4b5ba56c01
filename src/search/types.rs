use serde::{Deserialize, Serialize};

/// Search criteria collected from the filter panel.
///
/// Every field is optional; an absent field places no constraint on the
/// results. `min_price > max_price` is accepted as-is and simply matches
/// nothing.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring of the listing location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Case-insensitive property type, e.g. "Apartment"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Inclusive lower bound on monthly rent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    /// Inclusive upper bound on monthly rent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    /// Exact number of bedrooms. Kept as entered, so a fractional value
    /// matches no listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    /// Exact number of bathrooms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    /// Only listings that are currently active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_only: Option<bool>,
}

impl FilterSpec {
    /// True when no field is set, i.e. the filter matches every record
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: u32) -> Self {
        self.bedrooms = Some(f64::from(bedrooms));
        self
    }

    pub fn with_bathrooms(mut self, bathrooms: f32) -> Self {
        self.bathrooms = Some(bathrooms);
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = Some(true);
        self
    }
}

/// Result ordering offered by the search page
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Most recently created first
    #[default]
    Newest,
    /// Cheapest first
    PriceLow,
    /// Most expensive first
    PriceHigh,
    /// Most bedrooms first
    Bedrooms,
    /// Largest floor area first
    Area,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Newest,
        SortKey::PriceLow,
        SortKey::PriceHigh,
        SortKey::Bedrooms,
        SortKey::Area,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Bedrooms => "bedrooms",
            Self::Area => "area",
        }
    }

    /// Label shown in the sort dropdown
    pub fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Bedrooms => "Most Bedrooms",
            Self::Area => "Largest Area",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key `{0}` (expected newest, price-low, price-high, bedrooms or area)")]
pub struct UnknownSortKey(pub String);

impl std::str::FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}
