#![deny(missing_docs)]

//! # Routes Command
//!
//! Prints the route index the generator binds actions against.

use crate::error::CliResult;
use std::fs;
use std::path::{Path, PathBuf};
use zro_core::{JsonRoutes, RouteIndex, RouteTableText};

/// Arguments for the routes command.
#[derive(clap::Args, Debug, Clone)]
pub struct RoutesArgs {
    /// Route table: console output of the framework's route listing,
    /// or a `.json` array of `{http_verb, path, action_path}` records.
    #[clap(long)]
    pub routes: PathBuf,

    /// Only list the actions routed to this unit path.
    #[clap(long)]
    pub unit: Option<String>,
}

/// Builds the route index from a file; `.json` is read as records, anything else as a console table.
pub fn load_route_index(path: &Path) -> CliResult<RouteIndex> {
    let content = fs::read_to_string(path)?;
    let index = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => RouteIndex::build(&JsonRoutes::parse(&content)?)?,
        _ => RouteIndex::build(&RouteTableText::new(content))?,
    };
    Ok(index)
}

/// Renders the index, or the actions of one unit.
pub fn render(index: &RouteIndex, unit: Option<&str>) -> Vec<String> {
    match unit {
        Some(unit) => index
            .actions_for(unit)
            .into_iter()
            .map(|action| format!("{}#{}", unit, action))
            .collect(),
        None => index
            .units()
            .flat_map(|unit| index.lookup(unit))
            .map(|route| format!("{:<7} {:<40} {}", route.http_verb, route.path, route.action_path))
            .collect(),
    }
}

/// Executes the routes command.
pub fn execute(args: &RoutesArgs) -> CliResult<()> {
    let index = load_route_index(&args.routes)?;
    for line in render(&index, args.unit.as_deref()) {
        println!("{}", line);
    }
    if !index.diagnostics().is_empty() {
        println!("{} route line(s) skipped", index.diagnostics().len());
    }
    Ok(())
}
