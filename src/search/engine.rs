use super::types::{FilterSpec, SortKey};
use crate::models::PropertyRecord;

/// Filter then sort a snapshot of listings.
///
/// Returns references into `records` in display order. The input is left
/// untouched; records that compare equal keep their input order.
pub fn query<'a>(
    records: &'a [PropertyRecord],
    filter: &FilterSpec,
    sort: SortKey,
) -> Vec<&'a PropertyRecord> {
    let mut results: Vec<&PropertyRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    // `sort_by` is stable
    results.sort_by(|a, b| sort.compare(a, b));
    results
}

/// Owned variant of [`query`] for callers that keep the results around
pub fn query_owned(records: &[PropertyRecord], filter: &FilterSpec, sort: SortKey) -> Vec<PropertyRecord> {
    query(records, filter, sort).into_iter().cloned().collect()
}
