use crate::models::{PropertyRecord, PropertyUpdate};
use crate::stores::StoreError;
use async_trait::async_trait;

/// Access to the externally owned listing collection.
/// Implemented once per backend (JSON snapshot, managed document database).
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Every listing in the collection. Filtering happens client-side.
    async fn fetch_all(&self) -> Result<Vec<PropertyRecord>, StoreError>;

    /// Listings belonging to one owner, newest first
    async fn fetch_by_owner(&self, owner_id: &str) -> Result<Vec<PropertyRecord>, StoreError>;

    /// A single listing, `StoreError::NotFound` when it doesn't exist
    async fn fetch_by_id(&self, id: &str) -> Result<PropertyRecord, StoreError>;

    /// Contact email of a listing owner, if they have one on file
    async fn fetch_owner_email(&self, owner_id: &str) -> Result<Option<String>, StoreError>;

    /// Store a new listing. The store assigns its id and stamps
    /// `createdAt` / `updatedAt`; the stored record is returned.
    async fn add_property(&self, listing: PropertyRecord) -> Result<PropertyRecord, StoreError>;

    /// Apply a partial edit and bump `updatedAt`
    async fn update_property(
        &self,
        id: &str,
        update: &PropertyUpdate,
    ) -> Result<PropertyRecord, StoreError>;

    /// Remove a listing, `StoreError::NotFound` when it doesn't exist
    async fn delete_property(&self, id: &str) -> Result<(), StoreError>;

    /// Get the name of the backing source
    fn source_name(&self) -> &'static str;
}
