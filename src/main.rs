//! criteria-search - run a JSON search request against an in-memory catalog

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use criteria_search::{
    Catalog, CriteriaSearchExecutor, MemoryStore, RawSearchRequest, SearchConfig,
};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Search,
    Count,
    Exists,
    Unique,
}

/// Criteria search over JSON entity data
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Catalog definition (JSON)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Entity rows keyed by entity name (JSON)
    #[arg(short = 'D', long)]
    data: PathBuf,

    /// Search request (JSON); read from stdin when omitted
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Root entity to search
    #[arg(short = 'e', long)]
    domain: String,

    #[arg(short, long, value_enum, default_value = "search")]
    mode: Mode,

    /// Search configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page size used when a request names a page without a size
    #[arg(short = 's', long)]
    page_size: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if let Some(size) = args.page_size {
        config.default_page_size = size;
    }

    let catalog = Arc::new(
        Catalog::load_with_fallback(&args.catalog, config.fallback_key_type)
            .context("Failed to load catalog")?,
    );
    let store = Arc::new(MemoryStore::new(Arc::clone(&catalog))?);
    let loaded = store
        .load_json(&read_json(&args.data)?)
        .context("Failed to load data")?;
    info!("Loaded {} rows from {}", loaded, args.data.display());

    let request_json = match &args.request {
        Some(path) => read_json(path)?,
        None => serde_json::from_str(&std::io::read_to_string(std::io::stdin())?)
            .context("Failed to parse request from stdin")?,
    };
    let raw = RawSearchRequest::from_json(request_json).context("Invalid search request")?;

    let wrapper = config.wrapper_marker.clone();
    let executor = CriteriaSearchExecutor::new(catalog, store, &args.domain)?.with_config(config);
    let request = executor.parse_request(&raw)?;

    let output = match args.mode {
        Mode::Search => executor.search(&request)?.to_json(&wrapper),
        Mode::Count => json!({ "count": executor.count(&request)? }),
        Mode::Exists => json!({ "exists": executor.exists(&request)? }),
        Mode::Unique => {
            let hit = executor.search_unique(&request)?.map(|h| h.to_json());
            json!({ wrapper: hit })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
