pub mod engine;
pub mod filter;
pub mod normalize;
pub mod sort;
pub mod types;

pub use engine::{query, query_owned};
pub use normalize::normalize;
pub use types::{FilterSpec, SortKey, UnknownSortKey};
