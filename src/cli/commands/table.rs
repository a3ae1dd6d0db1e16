//! Table command implementation.
//!
//! Provides `taluka-geo table show` and `taluka-geo table build`.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::GeoConfig;
use crate::geocode::{BatchResolver, Coordinate, Geocoder, Pause, ThreadPause};
use crate::static_table::{build_table, BoundingBox, StaticLookupTable, TableRequest};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Arguments for the table command.
#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    #[command(subcommand)]
    pub command: TableSubcommand,
}

/// Table subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum TableSubcommand {
    /// Show the configured static table.
    Show {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Geocode names into a new static table.
    Build {
        /// Names to geocode, as `name` or `table-key=search-name`.
        #[arg(required = true)]
        names: Vec<String>,
        /// Write the table here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep coordinates outside the configured bounds.
        #[arg(long)]
        no_bounds: bool,
    },
}

/// The table command implementation.
pub struct TableCommand {
    config: GeoConfig,
    args: TableArgs,
}

impl TableCommand {
    /// Create a new table command.
    pub fn new(config: GeoConfig, args: TableArgs) -> Self {
        Self { config, args }
    }
}

impl Command for TableCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> crate::error::Result<CommandResult> {
        let exit_code = match &self.args.command {
            TableSubcommand::Show { json } => {
                show_table(&self.config.static_lookup_table(), *json, ui)?
            }
            TableSubcommand::Build {
                names,
                output,
                no_bounds,
            } => {
                let geocoder = self.config.geocoder(false)?;
                let bounds = if *no_bounds {
                    None
                } else {
                    Some(self.config.bounds.unwrap_or_default())
                };
                let options = BuildOptions {
                    names,
                    output: output.as_ref(),
                    bounds: bounds.as_ref(),
                };
                run_build(geocoder.as_ref(), &ThreadPause, &self.config, &options, ui)?
            }
        };

        Ok(if exit_code == 0 {
            CommandResult::success()
        } else {
            CommandResult::failure(exit_code)
        })
    }
}

/// Print every entry of `table`, sorted by name.
pub fn show_table(table: &StaticLookupTable, json: bool, ui: &mut dyn UserInterface) -> Result<i32> {
    let sorted: BTreeMap<&String, &Coordinate> = table.load().iter().collect();

    if json {
        ui.output(&serde_json::to_string_pretty(&sorted)?);
        return Ok(0);
    }

    if sorted.is_empty() {
        ui.warning("Static table is empty");
        return Ok(0);
    }

    ui.message(&format!("{} static entries ({:?}):\n", sorted.len(), table.source()));
    for (name, coords) in sorted {
        ui.output(&format!("  {}\t{}", name, coords));
    }
    Ok(0)
}

/// Inputs for [`run_build`].
pub struct BuildOptions<'a> {
    pub names: &'a [String],
    pub output: Option<&'a PathBuf>,
    pub bounds: Option<&'a BoundingBox>,
}

/// Geocode the requested names and emit a static table.
///
/// Exits non-zero when any row was rejected.
pub fn run_build(
    geocoder: &dyn Geocoder,
    pause: &dyn Pause,
    config: &GeoConfig,
    options: &BuildOptions<'_>,
    ui: &mut dyn UserInterface,
) -> Result<i32> {
    let requests: Vec<TableRequest> = options
        .names
        .iter()
        .filter_map(|n| TableRequest::parse(n))
        .collect();

    let batch = BatchResolver::new(geocoder)
        .with_delay(config.geocoder.request_delay())
        .with_pause(pause);

    let mut bar = ui.start_progress("Geocoding table entries");
    let build = build_table(
        &requests,
        &config.context,
        &batch,
        options.bounds,
        bar.as_sink(),
    );
    bar.finish(&format!("Fetched {}/{} entries", build.table.len(), requests.len()));

    for name in &build.not_found {
        ui.warning(&format!("{}: not found", name));
    }
    for (name, coords) in &build.out_of_bounds {
        ui.warning(&format!("{}: out of expected range ({})", name, coords));
    }

    let json = build.to_json()?;
    match options.output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ui.success(&format!(
                "Wrote {} entries to {}",
                build.table.len(),
                path.display()
            ));
        }
        None => ui.output(&json),
    }

    Ok(if build.rejected() == 0 { 0 } else { 1 })
}
