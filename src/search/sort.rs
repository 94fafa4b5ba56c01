use std::cmp::Ordering;

use super::types::SortKey;
use crate::models::PropertyRecord;

impl SortKey {
    /// Ordering of two records under this key. Missing values have already
    /// been defaulted to zero, so an undated record sorts as the oldest.
    pub fn compare(&self, a: &PropertyRecord, b: &PropertyRecord) -> Ordering {
        match self {
            Self::Newest => b.created_at_seconds().cmp(&a.created_at_seconds()),
            Self::PriceLow => a.price.cmp(&b.price),
            Self::PriceHigh => b.price.cmp(&a.price),
            Self::Bedrooms => b.bedrooms.cmp(&a.bedrooms),
            Self::Area => b.area.cmp(&a.area),
        }
    }
}
