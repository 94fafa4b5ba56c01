pub mod error;
pub mod file;
pub mod firestore;
pub mod traits;

pub use error::StoreError;
pub use file::FileStore;
pub use firestore::FirestoreStore;
pub use traits::ListingStore;

use chrono::{DateTime, Utc};

use crate::models::PropertyRecord;
use crate::search::{self, FilterSpec, SortKey};

/// Order an owner's listings the way the dashboard shows them
pub(crate) fn newest_first(records: Vec<PropertyRecord>) -> Vec<PropertyRecord> {
    search::query_owned(&records, &FilterSpec::default(), SortKey::Newest)
}

/// Creation stamp applied to every new listing
pub(crate) fn stamp_new(mut listing: PropertyRecord, now: DateTime<Utc>) -> PropertyRecord {
    listing.created_at = Some(now);
    listing.updated_at = Some(now);
    listing
}
