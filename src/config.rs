use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_LISTINGS_FILE: &str = "listings.json";

/// Which listing backend to read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    File,
    Firestore,
}

impl std::str::FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "firestore" => Ok(Self::Firestore),
            other => bail!("unknown listing source `{other}` (expected file or firestore)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub id_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub listings_file: PathBuf,
    /// Present when `FIRESTORE_PROJECT_ID` is set
    pub firestore: Option<FirestoreConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match var("HOUSE_FINDER_SOURCE") {
            Some(s) => s
                .parse::<SourceKind>()
                .context("invalid HOUSE_FINDER_SOURCE")?,
            None => SourceKind::File,
        };

        let timeout_secs = match var("HOUSE_FINDER_HTTP_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid HOUSE_FINDER_HTTP_TIMEOUT_SECS `{s}`"))?,
            None => 30,
        };

        let firestore = var("FIRESTORE_PROJECT_ID").map(|project_id| FirestoreConfig {
            project_id,
            api_key: var("FIRESTORE_API_KEY"),
            id_token: var("FIRESTORE_ID_TOKEN"),
            base_url: var("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
            timeout_secs,
        });

        Ok(Self {
            source,
            listings_file: var("HOUSE_FINDER_LISTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LISTINGS_FILE)),
            firestore,
        })
    }

    pub fn firestore(&self) -> anyhow::Result<&FirestoreConfig> {
        self.firestore
            .as_ref()
            .context("FIRESTORE_PROJECT_ID must be set to read from the document store")
    }
}
