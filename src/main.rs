use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use house_finder::config::{Config, SourceKind};
use house_finder::dashboard::OwnerSummary;
use house_finder::format::{format_kes, room_summary};
use house_finder::stores::file::ListingsSnapshot;
use house_finder::{
    FileStore, FilterSpec, FirestoreStore, ListingStore, PropertyRecord, PropertyStatus,
    PropertyUpdate, SearchSession, SearchState, SortKey, UserProfile,
};

#[derive(Parser)]
#[command(name = "house-finder", version, about = "Search rental listings and contact owners")]
struct Cli {
    /// Listing backend (overrides HOUSE_FINDER_SOURCE)
    #[arg(long, global = true, value_enum)]
    source: Option<SourceKind>,

    /// Snapshot file for the `file` source (overrides HOUSE_FINDER_LISTINGS_FILE)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter and sort listings
    Search(SearchArgs),
    /// Show one listing with the owner's contact email
    Show { id: String },
    /// Summarise an owner's listings
    Dashboard { owner_id: String },
    /// Save the listing collection to a snapshot file
    Export {
        #[arg(long, short)]
        output: PathBuf,
    },
    /// List a new property
    Add(ListingArgs),
    /// Make a draft listing visible to seekers
    Publish { id: String },
    /// Take a listing off the market as rented
    MarkRented { id: String },
    /// Remove a listing
    Delete { id: String },
}

#[derive(Args)]
struct ListingArgs {
    #[arg(long)]
    owner_id: String,
    #[arg(long)]
    owner_name: Option<String>,
    #[arg(long)]
    title: String,
    /// Monthly rent in KES
    #[arg(long)]
    price: u64,
    #[arg(long = "type")]
    property_type: String,
    #[arg(long)]
    location: String,
    /// Defaults to the location
    #[arg(long)]
    full_address: Option<String>,
    #[arg(long, default_value_t = 0)]
    bedrooms: u32,
    #[arg(long, default_value_t = 0.0)]
    bathrooms: f32,
    /// Square feet
    #[arg(long, default_value_t = 0)]
    area: u32,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    year_built: Option<u32>,
    /// Defaults to "Available Now"
    #[arg(long)]
    available: Option<String>,
    /// Repeat for each amenity
    #[arg(long = "amenity")]
    amenities: Vec<String>,
    /// Repeat for each image URL
    #[arg(long = "image")]
    images: Vec<String>,
    /// Save as a draft instead of publishing
    #[arg(long)]
    draft: bool,
}

impl ListingArgs {
    fn listing(&self) -> anyhow::Result<PropertyRecord> {
        let listing = PropertyRecord {
            title: self.title.trim().to_string(),
            price: self.price,
            location: self.location.trim().to_string(),
            full_address: self.full_address.clone().unwrap_or_default(),
            property_type: self.property_type.trim().to_string(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            description: self.description.clone(),
            amenities: self.amenities.clone(),
            year_built: self.year_built,
            available: self.available.clone().unwrap_or_default(),
            images: self.images.clone(),
            status: if self.draft { PropertyStatus::Draft } else { PropertyStatus::Active },
            owner_id: self.owner_id.clone(),
            owner_name: self.owner_name.clone().unwrap_or_default(),
            ..Default::default()
        }
        .with_listing_defaults();

        let missing = listing.missing_required_fields();
        if !missing.is_empty() {
            bail!("missing required fields: {}", missing.join(", "));
        }
        Ok(listing)
    }
}

#[derive(Args)]
struct SearchArgs {
    /// URL query string, e.g. "city=nairobi&bedrooms=2"; flags take precedence
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long = "type")]
    property_type: Option<String>,
    #[arg(long)]
    min_price: Option<u64>,
    #[arg(long)]
    max_price: Option<u64>,
    #[arg(long)]
    bedrooms: Option<u32>,
    #[arg(long)]
    bathrooms: Option<f32>,
    /// Only listings that are currently active
    #[arg(long)]
    available_only: bool,
    #[arg(long, value_enum, default_value_t = SortKey::Newest)]
    sort: SortKey,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl SearchArgs {
    /// Raw filter state in the web client's key names, run through the
    /// same normaliser the search page uses
    fn filter(&self) -> anyhow::Result<FilterSpec> {
        let mut raw = match &self.query {
            Some(q) => match serde_json::to_value(FilterSpec::from_query(q))? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };

        if let Some(city) = &self.city {
            raw.insert("city".into(), Value::from(city.as_str()));
        }
        if let Some(t) = &self.property_type {
            raw.insert("type".into(), Value::from(t.as_str()));
        }
        if let Some(n) = self.min_price {
            raw.insert("minPrice".into(), Value::from(n));
        }
        if let Some(n) = self.max_price {
            raw.insert("maxPrice".into(), Value::from(n));
        }
        if let Some(n) = self.bedrooms {
            raw.insert("bedrooms".into(), Value::from(n));
        }
        if let Some(n) = self.bathrooms {
            raw.insert("bathrooms".into(), Value::from(n));
        }
        if self.available_only {
            raw.insert("availableOnly".into(), Value::Bool(true));
        }

        Ok(FilterSpec::from_raw(&raw))
    }
}

fn open_store(cli: &Cli, cfg: &Config) -> anyhow::Result<Box<dyn ListingStore>> {
    match cli.source.unwrap_or(cfg.source) {
        SourceKind::File => {
            let path = cli.file.clone().unwrap_or_else(|| cfg.listings_file.clone());
            Ok(Box::new(FileStore::new(path)))
        }
        SourceKind::Firestore => {
            let store = FirestoreStore::new(cfg.firestore()?)
                .context("Failed to create document store client")?;
            Ok(Box::new(store))
        }
    }
}

fn print_listing(i: usize, property: &PropertyRecord) {
    println!("{}. {} ({}/month)", i + 1, property.title, format_kes(property.price));
    println!("   {} · {}", property.property_type, room_summary(property));
    println!("   Location: {}", property.location);
    println!("   Status: {}", property.status);
    println!("   ID: {}", property.id);
    println!();
}

async fn search(store: &dyn ListingStore, args: &SearchArgs) -> anyhow::Result<()> {
    let filter = args.filter()?;
    info!(filter = ?filter, sort = %args.sort, "Searching listings");

    let mut session = SearchSession::new();
    match session.refresh(store, filter, args.sort).await {
        SearchState::Ready { results, .. } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(results)?);
                return Ok(());
            }
            if results.is_empty() {
                println!("No properties found matching your search criteria.");
                return Ok(());
            }
            info!("✅ Found {} properties ({})\n", results.len(), args.sort.label());
            for (i, property) in results.iter().enumerate() {
                print_listing(i, property);
            }
            Ok(())
        }
        SearchState::Failed { message, .. } => {
            error!(source = store.source_name(), "No listing data available");
            bail!("could not load listings: {message}")
        }
        state => bail!("search did not complete: {state:?}"),
    }
}

async fn show(store: &dyn ListingStore, id: &str) -> anyhow::Result<()> {
    let property = store
        .fetch_by_id(id)
        .await
        .with_context(|| format!("Failed to load property {id}"))?;

    let contact = if property.owner_id.is_empty() {
        None
    } else {
        match store.fetch_owner_email(&property.owner_id).await {
            Ok(email) => email,
            Err(e) => {
                warn!(owner_id = %property.owner_id, error = %e, "Failed to fetch owner email");
                None
            }
        }
    };

    println!("{}", property.title);
    println!("{}/month", format_kes(property.price));
    println!("{} · {}", property.property_type, room_summary(&property));
    println!("Address: {}", property.full_address);
    println!("Location: {}", property.location);
    if let Some(year) = property.year_built {
        println!("Built: {year}");
    }
    if !property.amenities.is_empty() {
        println!("Amenities: {}", property.amenities.join(", "));
    }
    println!("Images: {}", property.images.len());
    println!();
    println!("{}", property.description);
    println!();
    if !property.owner_name.is_empty() {
        println!("Listed by {}", property.owner_name);
    }
    println!("Contact: {}", contact.as_deref().unwrap_or("No email available"));
    Ok(())
}

async fn dashboard(store: &dyn ListingStore, owner_id: &str) -> anyhow::Result<()> {
    let properties = store
        .fetch_by_owner(owner_id)
        .await
        .context("Failed to load owner listings")?;
    let summary = OwnerSummary::from_records(&properties);

    println!(
        "Total properties: {} ({} drafts, {} this month)",
        summary.total, summary.drafts, summary.added_last_month
    );
    println!("Monthly rent listed: {}", format_kes(summary.monthly_rent_total));
    println!("Occupancy: {} rented, {} available", summary.rented, summary.available());
    println!();
    for (i, property) in properties.iter().enumerate() {
        print_listing(i, property);
    }
    Ok(())
}

async fn export(store: &dyn ListingStore, output: &Path) -> anyhow::Result<()> {
    let properties = store.fetch_all().await.context("Failed to fetch listings")?;
    let owners: BTreeSet<&str> = properties
        .iter()
        .map(|p| p.owner_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    let mut users = Vec::with_capacity(owners.len());
    for owner_id in owners {
        match store.fetch_owner_email(owner_id).await {
            Ok(Some(email)) => users.push(UserProfile {
                id: owner_id.to_string(),
                email,
                ..Default::default()
            }),
            Ok(None) => {}
            Err(e) => warn!(owner_id, error = %e, "Skipping owner contact"),
        }
    }

    ListingsSnapshot { properties, users }
        .write_to(output)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))
}

async fn add(store: &dyn ListingStore, args: &ListingArgs) -> anyhow::Result<()> {
    let stored = store
        .add_property(args.listing()?)
        .await
        .context("Failed to add property")?;
    println!("Added property {} ({})", stored.id, stored.status);
    Ok(())
}

async fn set_status(store: &dyn ListingStore, id: &str, status: PropertyStatus) -> anyhow::Result<()> {
    let updated = store
        .update_property(id, &PropertyUpdate::status(status))
        .await
        .with_context(|| format!("Failed to update property {id}"))?;
    println!("{} is now {}", updated.title, updated.status);
    Ok(())
}

async fn delete(store: &dyn ListingStore, id: &str) -> anyhow::Result<()> {
    store
        .delete_property(id)
        .await
        .with_context(|| format!("Failed to delete property {id}"))?;
    println!("Deleted property {id}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    let store = open_store(&cli, &cfg)?;
    info!("🏠 House Finder - reading listings from {}", store.source_name());

    match &cli.command {
        Command::Search(args) => search(store.as_ref(), args).await,
        Command::Show { id } => show(store.as_ref(), id).await,
        Command::Dashboard { owner_id } => dashboard(store.as_ref(), owner_id).await,
        Command::Export { output } => export(store.as_ref(), output).await,
        Command::Add(args) => add(store.as_ref(), args).await,
        Command::Publish { id } => set_status(store.as_ref(), id, PropertyStatus::Active).await,
        Command::MarkRented { id } => set_status(store.as_ref(), id, PropertyStatus::Rented).await,
        Command::Delete { id } => delete(store.as_ref(), id).await,
    }
}
