#![deny(missing_docs)]

//! # Response Stubs
//!
//! Optional side effect of declaring an action: writing a companion response
//! template (e.g. a `.json.jbuilder` view) next to the host application's views.
//!
//! The core only calls [`StubHook::generate`] with the action identifier and the
//! template name declared through [`crate::ActionSpec::builder`].

use crate::config::Config;
use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;

/// Receives the builder template of every bound action that declares one.
pub trait StubHook {
    /// Called once per bound action with a template name.
    fn generate(&self, action_path: &str, template: &str) -> AppResult<()>;
}

/// Hook that never writes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStubs;

impl StubHook for NoStubs {
    fn generate(&self, _action_path: &str, _template: &str) -> AppResult<()> {
        Ok(())
    }
}

/// Writes `<root>/<unit_path>/<action>.<extension>` from a named template.
#[derive(Debug, Clone)]
pub struct StubWriter {
    root: PathBuf,
    extension: String,
    templates: IndexMap<String, String>,
    enabled: bool,
    overwrite: bool,
}

impl StubWriter {
    /// Creates an enabled writer that never overwrites existing files.
    pub fn new(root: impl Into<PathBuf>, templates: IndexMap<String, String>) -> Self {
        Self {
            root: root.into(),
            extension: "json.jbuilder".into(),
            templates,
            enabled: true,
            overwrite: false,
        }
    }

    /// Reads the stub settings of a generator config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.stub_root.clone(),
            extension: config.stub_extension.clone(),
            templates: config.stub_templates.clone(),
            enabled: config.generate_stub_files,
            overwrite: config.overwrite_stub_files,
        }
    }

    /// Allows replacing existing stubs.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Target file of an action's stub, or `None` for an identifier without `#`.
    pub fn stub_path(&self, action_path: &str) -> Option<PathBuf> {
        let (unit, action) = action_path.split_once('#')?;
        Some(
            self.root
                .join(unit)
                .join(format!("{}.{}", action, self.extension)),
        )
    }
}

impl StubHook for StubWriter {
    fn generate(&self, action_path: &str, template: &str) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let content = self.templates.get(template).ok_or_else(|| {
            AppError::General(format!(
                "Unknown stub template '{}' for {}",
                template, action_path
            ))
        })?;
        let file = self.stub_path(action_path).ok_or_else(|| {
            AppError::General(format!("Invalid action identifier '{}'", action_path))
        })?;

        if file.exists() && !self.overwrite {
            tracing::debug!(path = %file.display(), "stub exists, leaving it untouched");
            return Ok(());
        }
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&file, content)?;
        tracing::info!(path = %file.display(), "response stub generated for {}", action_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn templates() -> IndexMap<String, String> {
        let mut t = IndexMap::new();
        t.insert("default".to_string(), "json.ok true\n".to_string());
        t
    }

    #[test]
    fn test_stub_path() {
        let writer = StubWriter::new("app/views", templates());
        assert_eq!(
            writer.stub_path("api/v1/pets#show"),
            Some(PathBuf::from("app/views/api/v1/pets/show.json.jbuilder"))
        );
        assert_eq!(writer.stub_path("no-hash"), None);
    }

    #[test]
    fn test_generate_writes_and_keeps_existing() {
        let dir = tempdir().unwrap();
        let writer = StubWriter::new(dir.path(), templates());
        writer.generate("pets#index", "default").unwrap();

        let file = dir.path().join("pets/index.json.jbuilder");
        assert_eq!(fs::read_to_string(&file).unwrap(), "json.ok true\n");

        fs::write(&file, "custom").unwrap();
        writer.generate("pets#index", "default").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "custom");

        writer.overwrite(true).generate("pets#index", "default").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "json.ok true\n");
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let dir = tempdir().unwrap();
        let writer = StubWriter::new(dir.path(), templates());
        match writer.generate("pets#index", "missing") {
            Err(AppError::General(msg)) => assert!(msg.contains("missing")),
            other => panic!("expected General error, got {:?}", other),
        }
    }

    #[test]
    fn test_disabled_writer_does_nothing() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.stub_root = dir.path().to_path_buf();
        let writer = StubWriter::from_config(&config);
        writer.generate("pets#index", "missing").unwrap();
        assert!(!dir.path().join("pets").exists());
    }
}
