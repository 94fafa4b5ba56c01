//! Search session state for a single results page.
//!
//! Every filter or sort change issues a [`RequestTicket`] with a sequence
//! number one higher than the last. Only the response for the newest ticket
//! is applied; anything older that arrives late is dropped, so a slow fetch
//! can never overwrite the results for the criteria currently on screen.

use tracing::{debug, info, warn};

use crate::models::PropertyRecord;
use crate::search::{self, FilterSpec, SortKey};
use crate::stores::{ListingStore, StoreError};

/// One issued search request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub seq: u64,
    pub filter: FilterSpec,
    pub sort: SortKey,
}

impl RequestTicket {
    /// Fetch the snapshot this ticket will be completed with
    pub async fn execute<S>(&self, store: &S) -> Result<Vec<PropertyRecord>, StoreError>
    where
        S: ListingStore + ?Sized,
    {
        debug!(seq = self.seq, source = store.source_name(), "Fetching listings");
        store.fetch_all().await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading { seq: u64 },
    /// Results for the latest request; may be empty
    Ready { seq: u64, results: Vec<PropertyRecord> },
    /// The latest request could not fetch any data
    Failed { seq: u64, message: String },
}

impl SearchState {
    pub fn results(&self) -> Option<&[PropertyRecord]> {
        match self {
            Self::Ready { results, .. } => Some(results),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// What happened to a completed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was issued in the meantime
    Superseded { latest: u64 },
}

#[derive(Debug, Default)]
pub struct SearchSession {
    issued: u64,
    state: SearchState,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Sequence number of the newest ticket, 0 before the first request
    pub fn latest(&self) -> u64 {
        self.issued
    }

    pub fn begin(&mut self, filter: FilterSpec, sort: SortKey) -> RequestTicket {
        self.issued += 1;
        self.state = SearchState::Loading { seq: self.issued };
        RequestTicket { seq: self.issued, filter, sort }
    }

    pub fn complete(
        &mut self,
        ticket: &RequestTicket,
        response: Result<Vec<PropertyRecord>, StoreError>,
    ) -> Completion {
        if ticket.seq != self.issued {
            debug!(seq = ticket.seq, latest = self.issued, "Discarding superseded response");
            return Completion::Superseded { latest: self.issued };
        }

        self.state = match response {
            Ok(records) => {
                let results = search::query_owned(&records, &ticket.filter, ticket.sort);
                info!(
                    seq = ticket.seq,
                    fetched = records.len(),
                    matched = results.len(),
                    sort = %ticket.sort,
                    "Search results ready"
                );
                SearchState::Ready { seq: ticket.seq, results }
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "Failed to load listings");
                SearchState::Failed { seq: ticket.seq, message: e.to_string() }
            }
        };
        Completion::Applied
    }

    /// Issue, fetch and complete one request
    pub async fn refresh<S>(&mut self, store: &S, filter: FilterSpec, sort: SortKey) -> &SearchState
    where
        S: ListingStore + ?Sized,
    {
        let ticket = self.begin(filter, sort);
        let response = ticket.execute(store).await;
        self.complete(&ticket, response);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyStatus;

    fn listings() -> Vec<PropertyRecord> {
        vec![
            PropertyRecord {
                id: "a".to_string(),
                price: 30_000,
                status: PropertyStatus::Active,
                ..Default::default()
            },
            PropertyRecord {
                id: "b".to_string(),
                price: 90_000,
                status: PropertyStatus::Rented,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut session = SearchSession::new();
        assert_eq!(session.latest(), 0);
        let first = session.begin(FilterSpec::default(), SortKey::Newest);
        let second = session.begin(FilterSpec::default(), SortKey::Newest);
        assert!(second.seq > first.seq);
        assert!(session.state().is_loading());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = SearchSession::new();
        let old = session.begin(FilterSpec::default(), SortKey::PriceLow);
        let new = session.begin(FilterSpec::default().available_only(), SortKey::PriceLow);

        assert_eq!(session.complete(&new, Ok(listings())), Completion::Applied);
        assert_eq!(
            session.complete(&old, Ok(listings())),
            Completion::Superseded { latest: new.seq }
        );

        let ids: Vec<_> = session.state().results().unwrap().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_results() {
        let mut session = SearchSession::new();
        let old = session.begin(FilterSpec::default(), SortKey::Newest);
        let new = session.begin(FilterSpec::default(), SortKey::Newest);
        session.complete(&new, Ok(listings()));
        session.complete(&old, Err(StoreError::Decode("late".to_string())));
        assert_eq!(session.state().results().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_failure_is_not_an_empty_result() {
        let mut session = SearchSession::new();
        let ticket = session.begin(FilterSpec::default(), SortKey::Newest);
        session.complete(&ticket, Err(StoreError::Decode("boom".to_string())));
        assert!(matches!(session.state(), SearchState::Failed { .. }));
        assert_eq!(session.state().results(), None);

        let ticket = session.begin(FilterSpec::default(), SortKey::Newest);
        session.complete(&ticket, Ok(Vec::new()));
        assert_eq!(session.state().results(), Some(&[][..]));
    }
}
