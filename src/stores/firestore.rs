use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use tracing::{debug, info, warn};

use crate::config::FirestoreConfig;
use crate::models::{PropertyRecord, PropertyUpdate, UserProfile};
use crate::stores::{newest_first, stamp_new, ListingStore, StoreError};

const PROPERTIES: &str = "properties";
const USERS: &str = "users";
const PAGE_SIZE: u32 = 300;
/// Fields stored as `timestampValue` rather than plain strings
const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// Listing store backed by the managed document database, spoken to over
/// its REST API.
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    id_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("house-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            config.base_url.trim_end_matches('/'),
            config.project_id
        );

        Ok(Self {
            client,
            documents_url,
            api_key: config.api_key.clone(),
            id_token: config.id_token.clone(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.id_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(status = %status, "Listing backend returned an error");
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status: status.as_u16(), body })
    }

    /// GET a single document, `None` on 404
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, id);
        debug!(url = %url, "Fetching document");

        match self.send(self.request(Method::GET, &url)).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(StoreError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Send a write addressed at one property, a 404 becomes `NotFound`
    async fn write_property(&self, builder: RequestBuilder, id: &str) -> Result<Response, StoreError> {
        match self.send(builder).await {
            Err(StoreError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(StoreError::property_not_found(id))
            }
            other => other,
        }
    }
}

#[async_trait]
impl ListingStore for FirestoreStore {
    async fn fetch_all(&self) -> Result<Vec<PropertyRecord>, StoreError> {
        let url = format!("{}/{}", self.documents_url, PROPERTIES);
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, &url)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let body: Value = self.send(builder).await?.json().await?;
            let (page, next) = parse_list_page(body)?;
            debug!(count = page.len(), "Fetched page of listings");
            properties.extend(page);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(count = properties.len(), "Fetched listings from document store");
        Ok(properties)
    }

    async fn fetch_by_owner(&self, owner_id: &str) -> Result<Vec<PropertyRecord>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = owner_query(owner_id);

        let response: Value = self
            .send(self.request(Method::POST, &url).json(&body))
            .await?
            .json()
            .await?;

        let properties = parse_run_query(response)?;
        info!(owner_id, count = properties.len(), "Fetched owner listings");
        Ok(newest_first(properties))
    }

    async fn fetch_by_id(&self, id: &str) -> Result<PropertyRecord, StoreError> {
        match self.get_document(PROPERTIES, id).await? {
            Some(document) => decode_document(document),
            None => Err(StoreError::property_not_found(id)),
        }
    }

    async fn fetch_owner_email(&self, owner_id: &str) -> Result<Option<String>, StoreError> {
        let Some(document) = self.get_document(USERS, owner_id).await? else {
            debug!(owner_id, "Owner has no profile document");
            return Ok(None);
        };
        let user: UserProfile = serde_json::from_value(Value::Object(decode_fields(document)?))?;
        Ok(user.contact_email().map(str::to_string))
    }

    async fn add_property(&self, listing: PropertyRecord) -> Result<PropertyRecord, StoreError> {
        let url = format!("{}/{}", self.documents_url, PROPERTIES);
        let body = json!({ "fields": encode_fields(&stamp_new(listing, Utc::now()))? });

        let document: Value = self
            .send(self.request(Method::POST, &url).json(&body))
            .await?
            .json()
            .await?;
        let stored = decode_document(document)?;
        info!(id = %stored.id, owner = %stored.owner_id, "➕ Added listing");
        Ok(stored)
    }

    async fn update_property(
        &self,
        id: &str,
        update: &PropertyUpdate,
    ) -> Result<PropertyRecord, StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, PROPERTIES, id);
        let fields = update_fields(update, Utc::now())?;

        let mut builder = self
            .request(Method::PATCH, &url)
            .query(&[("currentDocument.exists", "true")]);
        for path in fields.keys() {
            builder = builder.query(&[("updateMask.fieldPaths", path)]);
        }

        let document: Value = self
            .write_property(builder.json(&json!({ "fields": fields })), id)
            .await?
            .json()
            .await?;
        let updated = decode_document(document)?;
        info!(id, status = ?updated.status, "✏️ Updated listing");
        Ok(updated)
    }

    async fn delete_property(&self, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, PROPERTIES, id);
        let builder = self
            .request(Method::DELETE, &url)
            .query(&[("currentDocument.exists", "true")]);
        self.write_property(builder, id).await?;
        info!(id, "🗑️ Deleted listing");
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "firestore"
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    documents: Vec<Value>,
    next_page_token: Option<String>,
}

fn parse_list_page(body: Value) -> Result<(Vec<PropertyRecord>, Option<String>), StoreError> {
    let page: ListPage = serde_json::from_value(body)?;
    let properties = page
        .documents
        .into_iter()
        .map(decode_document)
        .collect::<Result<Vec<_>, _>>()?;
    let next = page.next_page_token.filter(|t| !t.is_empty());
    Ok((properties, next))
}

/// `runQuery` answers with one entry per match; an entry without a
/// `document` only carries the read time.
fn parse_run_query(body: Value) -> Result<Vec<PropertyRecord>, StoreError> {
    let Value::Array(entries) = body else {
        return Err(StoreError::Decode("runQuery response is not an array".to_string()));
    };
    entries
        .into_iter()
        .filter_map(|mut entry| entry.get_mut("document").map(Value::take))
        .map(decode_document)
        .collect()
}

fn owner_query(owner_id: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": PROPERTIES }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "ownerId" },
                    "op": "EQUAL",
                    "value": { "stringValue": owner_id }
                }
            }
        }
    })
}

fn decode_document(document: Value) -> Result<PropertyRecord, StoreError> {
    let fields = decode_fields(document)?;
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Flatten a document into plain JSON, with its id taken from the resource name
fn decode_fields(document: Value) -> Result<Map<String, Value>, StoreError> {
    let Value::Object(mut document) = document else {
        return Err(StoreError::Decode("document is not an object".to_string()));
    };

    let id = document
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Decode("document has no name".to_string()))?;

    let mut fields = match document.remove("fields") {
        Some(Value::Object(fields)) => fields
            .into_iter()
            .map(|(k, v)| (k, decode_value(&v)))
            .collect(),
        _ => Map::new(),
    };
    fields.insert("id".to_string(), Value::String(id));
    Ok(fields)
}

/// Convert a typed value (`{"integerValue": "3"}`, ...) to plain JSON
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

/// Encode a record as document fields. The id lives in the resource name,
/// so it is not written as a field.
fn encode_fields(value: &impl Serialize) -> Result<Map<String, Value>, StoreError> {
    let Value::Object(mut plain) = serde_json::to_value(value)? else {
        return Err(StoreError::Decode("listing did not serialise to an object".to_string()));
    };
    plain.remove("id");
    Ok(plain
        .into_iter()
        .map(|(key, value)| {
            let typed = match &value {
                Value::String(s) if TIMESTAMP_FIELDS.contains(&key.as_str()) => {
                    json!({ "timestampValue": s })
                }
                _ => encode_value(&value),
            };
            (key, typed)
        })
        .collect())
}

/// Fields written by a partial update. Their keys double as the update mask,
/// and `updatedAt` is always among them.
fn update_fields(update: &PropertyUpdate, now: DateTime<Utc>) -> Result<Map<String, Value>, StoreError> {
    let mut fields = encode_fields(update)?;
    fields.insert(
        "updatedAt".to_string(),
        json!({ "timestampValue": serde_json::to_value(now)? }),
    );
    Ok(fields)
}

/// Convert plain JSON to a typed value, whole numbers as `integerValue`
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({
            "mapValue": {
                "fields": fields
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect::<Map<String, Value>>()
            }
        }),
    }
}
