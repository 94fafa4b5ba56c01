use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::models::{PropertyRecord, PropertyStatus};

/// Headline numbers for an owner's dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    pub total: usize,
    pub active: usize,
    pub drafts: usize,
    pub rented: usize,
    /// Sum of the asking rent across every listing, whatever its status
    pub monthly_rent_total: u64,
    /// Listings created within the last calendar month
    pub added_last_month: usize,
}

impl OwnerSummary {
    pub fn from_records(records: &[PropertyRecord]) -> Self {
        Self::from_records_at(records, Utc::now())
    }

    pub fn from_records_at(records: &[PropertyRecord], now: DateTime<Utc>) -> Self {
        let month_ago = now.checked_sub_months(Months::new(1));
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.total += 1;
            if matches!((record.created_at, month_ago), (Some(created), Some(cutoff)) if created > cutoff) {
                summary.added_last_month += 1;
            }
            summary.monthly_rent_total = summary.monthly_rent_total.saturating_add(record.price);
            match record.status {
                PropertyStatus::Active => summary.active += 1,
                PropertyStatus::Draft => summary.drafts += 1,
                PropertyStatus::Rented => summary.rented += 1,
                PropertyStatus::Unknown => {}
            }
            summary
        })
    }

    /// Listings seekers can currently contact the owner about
    pub fn available(&self) -> usize {
        self.active
    }
}
