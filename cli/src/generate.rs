#![deny(missing_docs)]

//! # Generate Command
//!
//! Implements the pipeline: Config + Route table + Unit declarations -> OpenAPI documents.
//!
//! 1. **Load**: configuration, route index and unit declaration files.
//! 2. **Declare**: every unit file runs against a fresh registry.
//! 3. **Assemble & Write**: one `<doc>.json` per configured document, or stdout with `--no-write`.

use crate::error::{CliError, CliResult};
use crate::routes_cmd::load_route_index;
use crate::units::{apply, load_units};
use std::path::PathBuf;
use zro_core::{write_docs, Assembler, Config, Registry, StubWriter};

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Generator configuration (YAML, or JSON by `.json` extension).
    #[clap(long, env = "ZRO_CONFIG", default_value = "config/zro.yml")]
    pub config: PathBuf,

    /// Route table file (console listing, or `.json` records).
    #[clap(long)]
    pub routes: PathBuf,

    /// Directory of unit declaration files.
    #[clap(long, default_value = "docs/units")]
    pub units: PathBuf,

    /// Only generate this document.
    #[clap(long)]
    pub doc: Option<String>,

    /// Print the documents to stdout instead of writing files.
    #[clap(long)]
    pub no_write: bool,
}

/// Executes the generation pipeline.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let config = Config::load(&args.config)?;
    let routes = load_route_index(&args.routes)?;
    let units = load_units(&args.units)?;
    tracing::info!(
        routes = routes.len(),
        units = units.len(),
        "declarations loaded"
    );

    let mut registry = Registry::new(routes).with_stub_hook(StubWriter::from_config(&config));
    for unit in &units {
        apply(&mut registry, unit)?;
    }

    let mut assembler = Assembler::new(&registry, &config);
    if args.no_write {
        let docs = match &args.doc {
            Some(name) => vec![(name.clone(), assembler.assemble(name)?)],
            None => assembler.assemble_all()?,
        };
        for (_, doc) in docs {
            println!("{}", doc.to_json_pretty()?);
        }
    } else {
        let report = write_docs(&mut assembler, &config, args.doc.as_deref());
        for notice in report.notices() {
            println!("{}", notice);
        }
        let failures = report.failures();
        if !failures.is_empty() {
            let names: Vec<&str> = failures.iter().map(|(name, _)| *name).collect();
            return Err(CliError::General(format!(
                "Failed to generate: {}",
                names.join(", ")
            )));
        }
    }

    let warnings = registry.diagnostics().len() + assembler.diagnostics().len();
    if warnings > 0 {
        tracing::warn!(warnings, "generation finished with warnings");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
docs:
  api:
    root_unit: ApiController
    info: { title: Pets API, version: 1.0.0 }
"#;

    const ROUTES: &str = "\
pets GET  /pets(.:format)     pets#index
     POST /pets(.:format)     pets#create
pet  GET  /pets/:id(.:format) pets#show
";

    const PETS: &str = r#"
unit: PetsController
route_base: pets
inherits: [ApiController]
apis:
  - action: index
    summary: List pets
  - action: create
    summary: Create a pet
  - action: destroy
    summary: Not routed
"#;

    fn args(dir: &std::path::Path) -> GenerateArgs {
        let units = dir.join("units");
        fs::create_dir_all(&units).unwrap();
        fs::write(units.join("pets.yaml"), PETS).unwrap();
        fs::write(dir.join("routes.txt"), ROUTES).unwrap();
        let out = dir.join("out").display().to_string();
        fs::write(
            dir.join("zro.yml"),
            format!("file_output_path: \"{}\"\n{}", out, CONFIG),
        )
        .unwrap();
        GenerateArgs {
            config: dir.join("zro.yml"),
            routes: dir.join("routes.txt"),
            units,
            doc: None,
            no_write: false,
        }
    }

    #[test]
    fn test_generate_writes_document() {
        let dir = tempdir().unwrap();
        execute(&args(dir.path())).unwrap();

        let written = fs::read_to_string(dir.path().join("out/api.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&written).unwrap();
        let verbs: Vec<&String> = doc["paths"]["/pets"].as_object().unwrap().keys().collect();
        assert_eq!(verbs, vec!["get", "post"]);
        assert_eq!(doc["tags"], serde_json::json!([{"name": "Pets"}]));
        assert!(doc["paths"].get("/pets/{id}").is_none());
    }

    #[test]
    fn test_generate_unknown_doc_fails() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path());
        args.doc = Some("admin".into());
        assert!(matches!(execute(&args), Err(CliError::General(_))));
    }

    #[test]
    fn test_generate_no_write() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path());
        args.no_write = true;
        execute(&args).unwrap();
        assert!(!dir.path().join("out").exists());
    }
}
