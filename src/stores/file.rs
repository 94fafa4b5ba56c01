use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{PropertyRecord, PropertyUpdate, UserProfile};
use crate::stores::{newest_first, stamp_new, ListingStore, StoreError};

/// On-disk export of the listing collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingsSnapshot {
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

/// Accepts both a bare array of properties and the full snapshot object
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Bare(Vec<PropertyRecord>),
    Full(ListingsSnapshot),
}

impl ListingsSnapshot {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(match serde_json::from_str::<SnapshotFile>(json)? {
            SnapshotFile::Bare(properties) => Self { properties, users: Vec::new() },
            SnapshotFile::Full(snapshot) => snapshot,
        })
    }

    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), json).await?;
        info!(
            path = %path.as_ref().display(),
            properties = self.properties.len(),
            users = self.users.len(),
            "💾 Saved listings snapshot"
        );
        Ok(())
    }
}

/// Listing store backed by a JSON snapshot file.
/// The file is re-read on every call so edits show up on the next query.
/// Writes rewrite the whole snapshot, one at a time.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<ListingsSnapshot, StoreError> {
        debug!(path = %self.path.display(), "Reading listings snapshot");
        let json = tokio::fs::read_to_string(&self.path).await?;
        ListingsSnapshot::from_json(&json)
    }

    /// Read-modify-write under the write lock. A missing file starts as an
    /// empty snapshot so the first `add` creates it.
    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut ListingsSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = match self.load().await {
            Ok(snapshot) => snapshot,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                ListingsSnapshot::default()
            }
            Err(e) => return Err(e),
        };
        let out = change(&mut snapshot)?;
        snapshot.write_to(&self.path).await?;
        Ok(out)
    }
}

#[async_trait]
impl ListingStore for FileStore {
    async fn fetch_all(&self) -> Result<Vec<PropertyRecord>, StoreError> {
        Ok(self.load().await?.properties)
    }

    async fn fetch_by_owner(&self, owner_id: &str) -> Result<Vec<PropertyRecord>, StoreError> {
        let owned = self
            .load()
            .await?
            .properties
            .into_iter()
            .filter(|p| p.owner_id == owner_id)
            .collect();
        Ok(newest_first(owned))
    }

    async fn fetch_by_id(&self, id: &str) -> Result<PropertyRecord, StoreError> {
        self.load()
            .await?
            .properties
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::property_not_found(id))
    }

    async fn fetch_owner_email(&self, owner_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .load()
            .await?
            .users
            .iter()
            .find(|u| u.id == owner_id)
            .and_then(|u| u.contact_email().map(str::to_string)))
    }

    async fn add_property(&self, listing: PropertyRecord) -> Result<PropertyRecord, StoreError> {
        let mut listing = stamp_new(listing, Utc::now());
        listing.id = Uuid::new_v4().simple().to_string();

        let stored = self
            .modify(|snapshot| {
                snapshot.properties.push(listing.clone());
                Ok(listing)
            })
            .await?;
        info!(id = %stored.id, owner = %stored.owner_id, "➕ Added listing");
        Ok(stored)
    }

    async fn update_property(
        &self,
        id: &str,
        update: &PropertyUpdate,
    ) -> Result<PropertyRecord, StoreError> {
        let updated = self
            .modify(|snapshot| {
                let record = snapshot
                    .properties
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| StoreError::property_not_found(id))?;
                record.apply(update);
                record.updated_at = Some(Utc::now());
                Ok(record.clone())
            })
            .await?;
        info!(id, status = ?updated.status, "✏️ Updated listing");
        Ok(updated)
    }

    async fn delete_property(&self, id: &str) -> Result<(), StoreError> {
        self.modify(|snapshot| {
            let before = snapshot.properties.len();
            snapshot.properties.retain(|p| p.id != id);
            if snapshot.properties.len() == before {
                return Err(StoreError::property_not_found(id));
            }
            Ok(())
        })
        .await?;
        info!(id, "🗑️ Deleted listing");
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyStatus;
    use serde_json::json;

    fn snapshot_json() -> String {
        json!({
            "properties": [
                { "id": "a", "ownerId": "u1", "price": 40000, "createdAt": "2024-01-01T00:00:00Z" },
                { "id": "b", "ownerId": "u2", "price": 55000 },
                { "id": "c", "ownerId": "u1", "price": 90000, "createdAt": "2024-06-01T00:00:00Z" }
            ],
            "users": [
                { "id": "u1", "email": "wanjiru@example.com", "userType": "owner" },
                { "id": "u2", "email": "" }
            ]
        })
        .to_string()
    }

    async fn store_with(contents: &str) -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        tokio::fs::write(&path, contents).await.unwrap();
        (dir, FileStore::new(path))
    }

    #[test]
    fn test_bare_array_snapshot() {
        let snapshot = ListingsSnapshot::from_json(r#"[{"id":"x"},{"id":"y"}]"#).unwrap();
        assert_eq!(snapshot.properties.len(), 2);
        assert!(snapshot.users.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_and_by_id() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        assert_eq!(store.fetch_all().await.unwrap().len(), 3);
        assert_eq!(store.fetch_by_id("b").await.unwrap().price, 55_000);
        assert!(store.fetch_by_id("zzz").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_by_owner_newest_first() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        let owned = store.fetch_by_owner("u1").await.unwrap();
        let ids: Vec<_> = owned.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_owner_email() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        assert_eq!(
            store.fetch_owner_email("u1").await.unwrap().as_deref(),
            Some("wanjiru@example.com")
        );
        assert_eq!(store.fetch_owner_email("u2").await.unwrap(), None);
        assert_eq!(store.fetch_owner_email("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.fetch_all().await, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_add_stamps_and_assigns_id() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        let listing = PropertyRecord {
            id: "ignored".to_string(),
            title: "Garden flat".to_string(),
            owner_id: "u1".to_string(),
            price: 65_000,
            ..Default::default()
        };

        let stored = store.add_property(listing).await.unwrap();
        assert_ne!(stored.id, "ignored");
        assert!(stored.created_at.is_some());
        assert_eq!(stored.created_at, stored.updated_at);

        let reread = store.fetch_by_id(&stored.id).await.unwrap();
        assert_eq!(reread, stored);
        assert_eq!(store.fetch_all().await.unwrap().len(), 4);
        // users survive the rewrite
        assert!(store.fetch_owner_email("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("new.json"));
        let stored = store.add_property(PropertyRecord::default()).await.unwrap();
        assert_eq!(store.fetch_all().await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn test_update_applies_fields_and_bumps_updated_at() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        let update = PropertyUpdate {
            price: Some(42_000),
            ..PropertyUpdate::status(PropertyStatus::Rented)
        };

        let updated = store.update_property("a", &update).await.unwrap();
        assert_eq!(updated.price, 42_000);
        assert_eq!(updated.status, PropertyStatus::Rented);
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(store.fetch_by_id("a").await.unwrap(), updated);

        let missing = store.update_property("zzz", &update).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = store_with(&snapshot_json()).await;
        store.delete_property("b").await.unwrap();
        assert!(store.fetch_by_id("b").await.unwrap_err().is_not_found());
        assert_eq!(store.fetch_all().await.unwrap().len(), 2);
        assert!(store.delete_property("b").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_snapshot_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let snapshot = ListingsSnapshot::from_json(&snapshot_json()).unwrap();
        snapshot.write_to(&path).await.unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.fetch_all().await.unwrap(), snapshot.properties);
    }
}
