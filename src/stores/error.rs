use thiserror::Error;

/// Why a listing store could not deliver data.
///
/// A failed fetch means "no data", which callers must keep apart from a
/// successful fetch that happens to return nothing.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to listing backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    #[error("failed to read listings snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed listings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected document shape: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn property_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "property", id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
