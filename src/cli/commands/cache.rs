//! Cache command implementation.
//!
//! Provides `taluka-geo cache list`, `taluka-geo cache clear`, etc.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cache::{format_duration, CacheStore, ListedEntry, CACHE_EXPIRATION_DAYS, CACHE_PREFIX};
use crate::config::GeoConfig;
use crate::geocode::Coordinate;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Arguments for the cache command.
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// List cached entries.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Clear the cache.
    Clear {
        /// Only clear expired, old-version and corrupt entries.
        #[arg(long)]
        expired: bool,
    },
    /// Show cache statistics.
    Stats,
    /// Show how old the cached entry for a location is.
    Age {
        /// Location string as it was cached.
        name: String,
    },
}

/// The cache command implementation.
pub struct CacheCommand {
    config: GeoConfig,
    args: CacheArgs,
}

impl CacheCommand {
    /// Create a new cache command.
    pub fn new(config: GeoConfig, args: CacheArgs) -> Self {
        Self { config, args }
    }
}

impl Command for CacheCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> crate::error::Result<CommandResult> {
        let store = self.config.cache_store();
        if !store.is_available() {
            ui.warning("Cache is disabled in configuration");
        }

        let exit_code = run_cache(&store, &self.args.command, ui)?;

        Ok(if exit_code == 0 {
            CommandResult::success()
        } else {
            CommandResult::failure(exit_code)
        })
    }
}

/// Execute a cache subcommand against `store`.
pub fn run_cache(
    store: &CacheStore,
    command: &CacheSubcommand,
    ui: &mut dyn UserInterface,
) -> Result<i32> {
    match command {
        CacheSubcommand::List { json } => list_cache(store, *json, ui),
        CacheSubcommand::Clear { expired } => clear_cache(store, *expired, ui),
        CacheSubcommand::Stats => show_stats(store, ui),
        CacheSubcommand::Age { name } => show_age(store, name, ui),
    }
}

#[derive(Serialize)]
struct ListedJson<'a> {
    location: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

/// Location part of a storage key.
fn display_name(key: &str) -> &str {
    let rest = key.strip_prefix(CACHE_PREFIX).unwrap_or(key);
    rest.split_once('_').map_or(rest, |(_, name)| name)
}

fn list_cache(store: &CacheStore, json: bool, ui: &mut dyn UserInterface) -> Result<i32> {
    let entries = store.list();

    if json {
        let rows: Vec<ListedJson<'_>> = entries.iter().map(to_json_row).collect();
        ui.output(&serde_json::to_string_pretty(&rows)?);
        return Ok(0);
    }

    if entries.is_empty() {
        ui.message("Cache is empty");
        return Ok(0);
    }

    ui.message(&format!("{} cached entries:\n", entries.len()));

    for listed in &entries {
        let name = display_name(&listed.key);
        match &listed.entry {
            Some(entry) => ui.output(&format!(
                "  {} [{}] {} ({} old)",
                name,
                listed.status,
                entry.coordinates,
                format_duration(entry.age())
            )),
            None => ui.output(&format!("  {} [{}]", name, listed.status)),
        }
    }

    Ok(0)
}

fn to_json_row(listed: &ListedEntry) -> ListedJson<'_> {
    ListedJson {
        location: display_name(&listed.key),
        status: listed.status,
        coordinates: listed.entry.as_ref().map(|e| e.coordinates),
        timestamp: listed.entry.as_ref().map(|e| e.timestamp),
    }
}

fn clear_cache(store: &CacheStore, expired_only: bool, ui: &mut dyn UserInterface) -> Result<i32> {
    if expired_only {
        let removed = store.clear_expired();
        ui.success(&format!("Removed {} expired entries", removed));
    } else {
        let removed = store.clear_all();
        ui.success(&format!("Cleared {} cached entries", removed));
    }
    Ok(0)
}

fn show_stats(store: &CacheStore, ui: &mut dyn UserInterface) -> Result<i32> {
    let stats = store.stats();

    ui.show_header("Geocode Cache");
    ui.key_value("Entries", &stats.total.to_string());
    ui.key_value("Valid", &stats.valid.to_string());
    ui.key_value("Expired", &stats.expired.to_string());
    ui.key_value("Size", &format!("{:.2} KB", stats.size_estimate_kb));
    ui.key_value("Expires after", &format!("{} days", CACHE_EXPIRATION_DAYS));

    Ok(0)
}

fn show_age(store: &CacheStore, name: &str, ui: &mut dyn UserInterface) -> Result<i32> {
    match store.age_days(name) {
        Some(days) => {
            ui.output(&format!("{:.2}", days));
            if days >= CACHE_EXPIRATION_DAYS as f64 {
                ui.warning(&format!("Entry for {} is expired", name.trim()));
            }
            Ok(0)
        }
        None => {
            ui.error(&format!("No cached entry for {}", name.trim()));
            Ok(1)
        }
    }
}
