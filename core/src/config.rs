#![deny(missing_docs)]

//! # Generator Configuration
//!
//! Named document settings plus output and stub options, loaded from YAML or JSON.
//!
//! ```yaml
//! file_output_path: public/open_api
//! docs:
//!   homepage_api:
//!     root_unit: Api::V1::BaseController
//!     info: { title: Homepage APIs, version: 1.0.0 }
//!     servers: [{ url: "http://localhost:3000" }]
//!     global_security: [{ Token: [] }]
//!     global_security_schemes:
//!       Token: { type: http, scheme: bearer }
//! ```

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use utoipa::openapi::{Info, Server};

/// Settings of one named output document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocSettings {
    /// `info` of the document.
    pub info: Info,
    /// Top-level `servers`.
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Top-level `security` requirements.
    #[serde(default)]
    pub global_security: Value,
    /// Seed for `components/securitySchemes`.
    #[serde(default)]
    pub global_security_schemes: Map<String, Value>,
    /// Units whose lineage contains this identifier belong to the document.
    #[serde(alias = "root_controller")]
    pub root_unit: String,
}

impl DocSettings {
    /// Settings with only the required fields.
    pub fn new(title: &str, version: &str, root_unit: &str) -> Self {
        Self {
            info: Info::new(title, version),
            servers: Vec::new(),
            global_security: Value::Null,
            global_security_schemes: Map::new(),
            root_unit: root_unit.to_string(),
        }
    }
}

/// Generator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named documents, in declaration order.
    pub docs: IndexMap<String, DocSettings>,
    /// Directory receiving `<doc>.json`.
    pub file_output_path: PathBuf,
    /// Whether declared response stubs are written.
    pub generate_stub_files: bool,
    /// Whether existing stubs may be replaced.
    pub overwrite_stub_files: bool,
    /// Root directory of response stubs.
    pub stub_root: PathBuf,
    /// Stub file extension, without the leading dot.
    pub stub_extension: String,
    /// Stub contents by template name.
    pub stub_templates: IndexMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs: IndexMap::new(),
            file_output_path: PathBuf::from("public/open_api"),
            generate_stub_files: false,
            overwrite_stub_files: false,
            stub_root: PathBuf::from("app/views"),
            stub_extension: "json.jbuilder".into(),
            stub_templates: IndexMap::new(),
        }
    }
}

impl Config {
    /// Parses a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Adds (or replaces) a named document.
    pub fn with_doc(mut self, name: &str, settings: DocSettings) -> Self {
        self.docs.insert(name.to_string(), settings);
        self
    }

    /// Rejects configurations that cannot produce any document.
    pub fn validate(&self) -> AppResult<()> {
        if self.docs.is_empty() {
            return Err(AppError::Config("No documents configured under 'docs'".into()));
        }
        for (name, doc) in &self.docs {
            if doc.root_unit.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Document '{}' has an empty root_unit",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Settings of one named document.
    pub fn doc(&self, name: &str) -> AppResult<&DocSettings> {
        self.docs
            .get(name)
            .ok_or_else(|| AppError::Config(format!("Unknown document '{}'", name)))
    }

    /// Names of every configured document.
    pub fn doc_names(&self) -> impl Iterator<Item = &str> {
        self.docs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
file_output_path: out/docs
generate_stub_files: true
stub_templates:
  default: "json.ok true"
docs:
  homepage:
    root_unit: ApiController
    info:
      title: Homepage APIs
      version: 1.0.0
      description: Public endpoints
    servers:
      - url: http://localhost:3000
    global_security:
      - Token: []
    global_security_schemes:
      Token: { type: http, scheme: bearer }
  admin:
    root_controller: Admin::BaseController
    info: { title: Admin, version: "2" }
"#;

    #[test]
    fn test_parse_yaml() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert_eq!(config.doc_names().collect::<Vec<_>>(), vec!["homepage", "admin"]);
        assert_eq!(config.file_output_path, PathBuf::from("out/docs"));
        assert!(config.generate_stub_files);
        assert!(!config.overwrite_stub_files);
        assert_eq!(config.stub_extension, "json.jbuilder");

        let home = config.doc("homepage").unwrap();
        assert_eq!(home.info.title, "Homepage APIs");
        assert_eq!(home.servers.len(), 1);
        assert!(home.global_security.is_array());
        assert!(home.global_security_schemes.contains_key("Token"));

        let admin = config.doc("admin").unwrap();
        assert_eq!(admin.root_unit, "Admin::BaseController");
        assert!(admin.global_security.is_null());
    }

    #[test]
    fn test_unknown_doc() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert!(matches!(config.doc("nope"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            Config::from_yaml_str("file_output_path: x\n"),
            Err(AppError::Config(_))
        ));
        let config = Config::default().with_doc("a", DocSettings::new("A", "1", " "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_json_by_extension() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"docs": {{"api": {{"root_unit": "Api", "info": {{"title": "T", "version": "1"}}}}}}}}"#
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.doc("api").unwrap().info.version, "1");
    }
}
