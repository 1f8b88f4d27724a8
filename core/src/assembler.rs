#![deny(missing_docs)]

//! # Document Assembler
//!
//! Builds one OpenAPI 3.0 document per configured name from the units of a
//! [`Registry`]:
//!
//! 1. Seed `info`, `servers`, `security` and `components/securitySchemes` from the
//!    document settings.
//! 2. Visit, in registration order, every unit descending from the document's
//!    root unit that holds any data. Merge its paths verb by verb, add its tag and
//!    deep-merge its components.
//! 3. Prune blank sections, sort tags by name and paths by path string.
//!
//! Results are cached per name for the lifetime of the assembler.

use crate::components::ComponentsBag;
use crate::config::{Config, DocSettings};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::AppResult;
use crate::merge::{deep_merge_maps, prune_blank};
use crate::registry::Registry;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// An assembled OpenAPI document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Top-level fields.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// One top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `paths` object, absent when no path was bound.
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.0.get("paths").and_then(Value::as_object)
    }

    /// The operation at `path` and `verb`.
    pub fn operation(&self, path: &str, verb: &str) -> Option<&Value> {
        self.paths()?.get(path)?.get(verb)
    }

    /// Tag names, in document order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `components/schemas/<name>`
    pub fn schema(&self, name: &str) -> Option<&Value> {
        self.0.get("components")?.get("schemas")?.get(name)
    }

    /// The document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

/// Assembles and caches documents for one run.
#[derive(Debug)]
pub struct Assembler<'a> {
    registry: &'a Registry,
    config: &'a Config,
    cache: IndexMap<String, Arc<Document>>,
    diagnostics: Diagnostics,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler over the units of `registry`.
    pub fn new(registry: &'a Registry, config: &'a Config) -> Self {
        Self {
            registry,
            config,
            cache: IndexMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The configuration documents are assembled from.
    pub fn config(&self) -> &Config {
        self.config
    }

    /// Binding conflicts found while assembling.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Assembles the document `name`, or returns the cached one.
    pub fn assemble(&mut self, name: &str) -> AppResult<Arc<Document>> {
        if let Some(doc) = self.cache.get(name) {
            return Ok(Arc::clone(doc));
        }
        let config = self.config;
        let settings = config.doc(name)?;
        let doc = Arc::new(self.build(name, settings)?);
        self.cache.insert(name.to_string(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Assembles every configured document, in configuration order.
    pub fn assemble_all(&mut self) -> AppResult<Vec<(String, Arc<Document>)>> {
        let config = self.config;
        let mut docs = Vec::with_capacity(config.docs.len());
        for name in config.doc_names() {
            docs.push((name.to_string(), self.assemble(name)?));
        }
        Ok(docs)
    }

    fn build(&mut self, name: &str, settings: &DocSettings) -> AppResult<Document> {
        let mut components = ComponentsBag::from_map(
            [(
                "securitySchemes".to_string(),
                Value::Object(settings.global_security_schemes.clone()),
            )]
            .into_iter()
            .collect(),
        );
        let mut paths: IndexMap<String, Map<String, Value>> = IndexMap::new();
        let mut owners: IndexMap<(String, String), String> = IndexMap::new();
        let mut tags: Vec<Map<String, Value>> = Vec::new();
        let mut units = 0usize;

        let registry = self.registry;
        for unit in registry
            .descendants_of(&settings.root_unit)
            .filter(|unit| unit.has_data())
        {
            units += 1;
            for (path, verbs) in unit.paths() {
                let slot = paths.entry(path.clone()).or_default();
                for (verb, spec) in verbs {
                    let key = (path.clone(), verb.clone());
                    if let Some(previous) = owners.insert(key, unit.unit_path().to_string()) {
                        if previous != unit.unit_path() {
                            self.diagnostics.push(Diagnostic::ConflictingBinding {
                                path: path.clone(),
                                verb: verb.clone(),
                                previous,
                                current: unit.unit_path().to_string(),
                            });
                        }
                    }
                    slot.insert(verb.clone(), spec.to_value());
                }
            }

            if let Some(tag) = unit.tag() {
                let name = tag.get("name");
                match tags.iter_mut().find(|t| t.get("name") == name) {
                    Some(existing) => deep_merge_maps(existing, tag.clone()),
                    None => tags.push(tag.clone()),
                }
            }
            components.merge(unit.components().clone());
        }

        tags.sort_by(|a, b| tag_name(a).cmp(tag_name(b)));
        paths.sort_keys();

        let mut components = components.into_map();
        prune_blank(&mut components);

        let mut doc = Map::new();
        doc.insert("openapi".into(), json!("3.0.0"));
        doc.insert("info".into(), serde_json::to_value(&settings.info)?);
        doc.insert("servers".into(), serde_json::to_value(&settings.servers)?);
        doc.insert("security".into(), settings.global_security.clone());
        doc.insert(
            "tags".into(),
            Value::Array(tags.into_iter().map(Value::Object).collect()),
        );
        doc.insert(
            "paths".into(),
            Value::Object(
                paths
                    .into_iter()
                    .map(|(path, verbs)| (path, Value::Object(verbs)))
                    .collect(),
            ),
        );
        doc.insert("components".into(), Value::Object(components));
        prune_blank(&mut doc);

        tracing::info!(doc = name, units, "document assembled");
        Ok(Document(doc))
    }
}

fn tag_name(tag: &Map<String, Value>) -> &str {
    tag.get("name").and_then(Value::as_str).unwrap_or_default()
}
