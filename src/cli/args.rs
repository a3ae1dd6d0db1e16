//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::cache::CacheArgs;
use super::commands::table::TableArgs;

/// taluka-geo - Tiered geocoding for administrative regions.
#[derive(Debug, Parser)]
#[command(name = "taluka-geo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides discovered .taluka-geo/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Results and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve region names to coordinates
    Resolve(ResolveArgs),

    /// Inspect and maintain the geocode cache
    Cache(CacheArgs),

    /// Show or generate the static lookup table
    Table(TableArgs),
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ResolveArgs {
    /// Region names to resolve
    #[arg(required = true)]
    pub names: Vec<String>,

    /// District used to qualify names
    #[arg(long)]
    pub district: Option<String>,

    /// State used to qualify names
    #[arg(long)]
    pub state: Option<String>,

    /// Country used to qualify names
    #[arg(long)]
    pub country: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Use only the static table and cache
    #[arg(long)]
    pub no_network: bool,

    /// Keep cache writes in memory for this run only
    #[arg(long)]
    pub no_cache_persist: bool,
}
