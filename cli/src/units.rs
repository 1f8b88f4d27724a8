#![deny(missing_docs)]

//! # Unit Declarations
//!
//! Declarative form of the unit DSL, one unit per YAML or JSON file:
//!
//! ```yaml
//! unit: Api::V1::PetsController
//! route_base: api/v1/pets
//! inherits: [Api::V1::BaseController]
//! tag: { description: Everything about pets }
//! components:
//!   schemas:
//!     Pet: { type: object, properties: { id: { type: integer } } }
//! dry:
//!   - only: all
//!     operation:
//!       responses: { "401": { description: Unauthorized } }
//! apis:
//!   - action: show
//!     summary: Show a pet
//!     builder: default
//!     operation:
//!       responses:
//!         "200":
//!           description: OK
//!           content: { application/json: { schema: { $ref: "#/components/schemas/Pet" } } }
//! ```
//!
//! Selectors in `only` are `all`, `tag:<name>`, `action:<name>` or a bare action
//! name. A bare `all` always selects every action; an action named `all` is
//! written `action:all`.

use crate::error::{CliError, CliResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zro_core::{ApiOptions, Registry, Selector, TagDef};

/// One unit declaration file.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitFile {
    /// Unit identifier.
    pub unit: String,
    /// Grouping key matched against route identifiers.
    #[serde(default)]
    pub route_base: Option<String>,
    /// Ancestors, used for document membership.
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Explicit tag.
    #[serde(default)]
    pub tag: Option<TagDef>,
    /// Shared components, `{kind: {name: definition}}`.
    #[serde(default)]
    pub components: Map<String, Value>,
    /// Dry fragments.
    #[serde(default)]
    pub dry: Vec<DryDecl>,
    /// Documented actions.
    #[serde(default)]
    pub apis: Vec<ApiDecl>,
}

/// Selectors of a dry fragment: `all`, one selector, or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Only {
    /// A single selector.
    One(String),
    /// Several selectors.
    Many(Vec<String>),
}

impl Default for Only {
    fn default() -> Self {
        Only::One("all".into())
    }
}

/// A dry fragment declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct DryDecl {
    /// What the fragment applies to.
    #[serde(default)]
    pub only: Only,
    /// Operation fields deep-merged into every matching action.
    #[serde(default)]
    pub operation: Map<String, Value>,
}

/// An action declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDecl {
    /// Action name.
    pub action: String,
    /// Operation summary.
    #[serde(default)]
    pub summary: String,
    /// Operation id override.
    #[serde(default)]
    pub id: Option<String>,
    /// Tag override.
    #[serde(default)]
    pub tag: Option<String>,
    /// Verb override, e.g. `get|post`.
    #[serde(default)]
    pub http: Option<String>,
    /// Response stub template.
    #[serde(default)]
    pub builder: Option<String>,
    /// Operation fields deep-merged after the dry fragments.
    #[serde(default)]
    pub operation: Map<String, Value>,
}

/// Parses `all`, `tag:<name>`, `action:<name>` or a bare action name.
///
/// `all` is the wildcard, never an action name.
pub fn parse_selector(raw: &str) -> Selector {
    let raw = raw.trim();
    if raw == "all" {
        Selector::All
    } else if let Some(tag) = raw.strip_prefix("tag:") {
        Selector::tag(tag)
    } else {
        Selector::action(raw.strip_prefix("action:").unwrap_or(raw))
    }
}

impl Only {
    fn selectors(&self) -> Vec<Selector> {
        match self {
            Only::One(raw) => vec![parse_selector(raw)],
            Only::Many(raws) => raws.iter().map(|raw| parse_selector(raw)).collect(),
        }
    }
}

impl UnitFile {
    /// Parses a declaration; `.json` files as JSON, anything else as YAML.
    pub fn parse(path: &Path, content: &str) -> CliResult<Self> {
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| CliError::Units(format!("{}: {}", path.display(), e)))
    }
}

fn is_unit_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Loads every declaration file under `dir`, in file name order.
pub fn load_units(dir: &Path) -> CliResult<Vec<UnitFile>> {
    if !dir.is_dir() {
        return Err(CliError::General(format!(
            "Units directory not found: {:?}",
            dir
        )));
    }
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CliError::General(format!("Failed to walk {:?}: {}", dir, e)))?;
        if entry.file_type().is_file() && is_unit_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    let mut units = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read_to_string(&file)?;
        units.push(UnitFile::parse(&file, &content)?);
        tracing::debug!(file = %file.display(), "unit declaration loaded");
    }
    Ok(units)
}

/// Runs one declaration against the registry.
pub fn apply(registry: &mut Registry, file: &UnitFile) -> CliResult<()> {
    let mut scope = registry.unit(&file.unit);
    scope.inherits(file.inherits.iter().cloned());
    if let Some(base) = &file.route_base {
        scope.route_base(base);
    }
    if let Some(tag) = &file.tag {
        scope.doc_tag(tag.clone());
    }
    if !file.components.is_empty() {
        let components = file.components.clone();
        scope.components(move |c| {
            c.merge_raw(components);
        });
    }
    for dry in &file.dry {
        let operation = Value::Object(dry.operation.clone());
        scope.api_dry(dry.only.selectors(), move |api| {
            api.merge(operation.clone());
        });
    }
    for decl in &file.apis {
        let options = ApiOptions {
            id: decl.id.clone(),
            tag: decl.tag.clone(),
            http: decl.http.clone(),
        };
        let operation = Value::Object(decl.operation.clone());
        scope.api(&decl.action, &decl.summary, options, |api| {
            api.merge(operation);
            if let Some(template) = &decl.builder {
                api.builder(template);
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use zro_core::{Route, RouteIndex};

    const PETS: &str = r##"
unit: PetsController
route_base: api/v1/pets
inherits: [ApiController]
tag:
  description: Everything about pets
dry:
  - operation:
      responses:
        "401": { description: Unauthorized }
  - only: [show, "tag:Other"]
    operation:
      description: from dry
apis:
  - action: show
    summary: Show a pet
    operation:
      description: explicit
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                x-zro-component: Pet
                type: object
  - action: index
    summary: List pets
    id: listPets
"##;

    fn registry() -> Registry {
        Registry::new(RouteIndex::from_routes(vec![
            Route::new("get", "/api/v1/pets", "api/v1/pets#index"),
            Route::new("get", "/api/v1/pets/{id}", "api/v1/pets#show"),
        ]))
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector("all"), Selector::All);
        assert_eq!(parse_selector("tag:Pets"), Selector::tag("Pets"));
        assert_eq!(parse_selector("action:show"), Selector::action("show"));
        assert_eq!(parse_selector(" index "), Selector::action("index"));
        assert_eq!(parse_selector("action:all"), Selector::action("all"));
    }

    #[test]
    fn test_apply_yaml_declaration() {
        let unit = UnitFile::parse(Path::new("pets.yaml"), PETS).unwrap();
        let mut registry = registry();
        apply(&mut registry, &unit).unwrap();

        let doc = registry.get("PetsController").unwrap();
        assert_eq!(doc.tag_name(), "Pets");
        assert!(doc.descends_from("ApiController"));

        let show = doc.operation("/api/v1/pets/{id}", "get").unwrap();
        assert_eq!(show.get_str("description"), "explicit");
        assert_eq!(
            show.operation()["responses"]["200"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/Pet"})
        );
        assert!(show.operation()["responses"].get("401").is_some());
        assert_eq!(doc.components().as_map()["schemas"]["Pet"], json!({"type": "object"}));

        let index = doc.operation("/api/v1/pets", "get").unwrap();
        assert_eq!(index.get_str("operationId"), "listPets");
        assert_eq!(index.get_str("description"), "");
    }

    #[test]
    fn test_parse_error_names_file() {
        match UnitFile::parse(Path::new("broken.json"), "{\"route_base\": 1}") {
            Err(CliError::Units(msg)) => assert!(msg.starts_with("broken.json")),
            other => panic!("expected Units error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_units_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.yaml"), "unit: B\n").unwrap();
        fs::write(dir.path().join("nested/a.json"), r#"{"unit": "A"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let units = load_units(dir.path()).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.unit.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_load_units_missing_dir() {
        assert!(matches!(
            load_units(Path::new("no/such/dir")),
            Err(CliError::General(_))
        ));
    }
}
