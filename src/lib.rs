//! Rental listing search: a pure filter/sort engine over listings fetched
//! from an external store, with the surrounding session, store and display
//! plumbing used by the `house-finder` binary.

pub mod config;
pub mod dashboard;
pub mod format;
pub mod models;
pub mod search;
pub mod session;
pub mod stores;

pub use models::{PropertyRecord, PropertyStatus, PropertyUpdate, UserProfile, UserType};
pub use search::{normalize, query, FilterSpec, SortKey};
pub use session::{Completion, RequestTicket, SearchSession, SearchState};
pub use stores::{FileStore, FirestoreStore, ListingStore, StoreError};
