//! Resolve command implementation.
//!
//! Provides `taluka-geo resolve <NAMES...>`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStore;
use crate::cli::args::ResolveArgs;
use crate::config::GeoConfig;
use crate::error::Result;
use crate::geocode::{Coordinate, GeocodingService, LocationContext, Resolution, TierCounts};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The resolve command implementation.
pub struct ResolveCommand {
    config: GeoConfig,
    args: ResolveArgs,
}

impl ResolveCommand {
    /// Create a new resolve command.
    pub fn new(config: GeoConfig, args: ResolveArgs) -> Self {
        Self { config, args }
    }

    /// Configured context with command-line overrides applied.
    pub fn context(&self) -> LocationContext {
        let mut context = self.config.context.clone();
        if let Some(district) = &self.args.district {
            context.district = district.clone();
        }
        if let Some(state) = &self.args.state {
            context.state = state.clone();
        }
        if let Some(country) = &self.args.country {
            context.country = country.clone();
        }
        context
    }
}

impl Command for ResolveCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut service = self.config.build_service(self.args.no_network)?;
        if self.args.no_cache_persist {
            service = service.with_cache(CacheStore::memory());
        }
        run_resolve(&service, &self.context(), &self.args, ui)
    }
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    results: BTreeMap<&'a str, Coordinate>,
    unresolved: Vec<&'a str>,
    requested: usize,
    success_rate_percent: u8,
    tiers: TierCounts,
}

impl<'a> ResolveReport<'a> {
    fn new(resolution: &'a Resolution, names: &'a [String]) -> Self {
        let results = resolution
            .results
            .iter()
            .map(|(name, coords)| (name.as_str(), *coords))
            .collect();
        Self {
            results,
            unresolved: unresolved(resolution, names),
            requested: resolution.requested,
            success_rate_percent: resolution.success_rate_percent(),
            tiers: resolution.tiers,
        }
    }
}

/// Input names (trimmed, deduplicated) that did not resolve.
fn unresolved<'a>(resolution: &Resolution, names: &'a [String]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names.iter().map(|n| n.trim()) {
        if !name.is_empty() && resolution.get(name).is_none() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Resolve `args.names` with `service` and report through `ui`.
///
/// Exits non-zero only when regions were requested and none resolved.
pub fn run_resolve(
    service: &GeocodingService,
    context: &LocationContext,
    args: &ResolveArgs,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let mut bar = ui.start_progress("Resolving regions");
    let resolution = service.resolve_regions(&args.names, context, bar.as_sink());
    bar.finish(&format!(
        "Resolved {}/{} regions",
        resolution.resolved(),
        resolution.requested
    ));

    let report = ResolveReport::new(&resolution, &args.names);

    if args.json {
        ui.output(&serde_json::to_string_pretty(&report)?);
    } else {
        for (name, coords) in &report.results {
            ui.output(&format!("{}\t{:.6}\t{:.6}", name, coords.lat, coords.lon));
        }
        for name in &report.unresolved {
            ui.warning(&format!("Could not resolve: {}", name));
        }
        ui.message(&format!(
            "{}% resolved ({} static, {} cached, {} remote)",
            report.success_rate_percent,
            report.tiers.from_static,
            report.tiers.from_cache,
            report.tiers.from_remote
        ));
    }

    if resolution.requested > 0 && resolution.resolved() == 0 {
        Ok(CommandResult::failure(1))
    } else {
        Ok(CommandResult::success())
    }
}
