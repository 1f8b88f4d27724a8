#![deny(missing_docs)]

//! # Document Output
//!
//! Writes assembled documents as `<file_output_path>/<name>.json`.

use crate::assembler::Assembler;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Outcome of one [`write_docs`] run, one entry per requested document.
#[derive(Debug, Default)]
pub struct WriteReport {
    results: Vec<(String, AppResult<PathBuf>)>,
}

impl WriteReport {
    /// Per-document results, in request order.
    pub fn results(&self) -> &[(String, AppResult<PathBuf>)] {
        &self.results
    }

    /// Files that were written.
    pub fn written(&self) -> Vec<&PathBuf> {
        self.results
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
            .collect()
    }

    /// Documents that failed, with their errors.
    pub fn failures(&self) -> Vec<(&str, &AppError)> {
        self.results
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (name.as_str(), e)))
            .collect()
    }

    /// True when every document was written.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }

    /// Completion lines, names right-aligned to the longest one.
    pub fn notices(&self) -> Vec<String> {
        let width = self
            .results
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        self.results
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(name, _)| format!("[ZRO] `{:>width$}.json` has been generated.", name, width = width))
            .collect()
    }
}

/// Assembles and writes the document `only`, or every configured document.
///
/// A failing document does not stop the others. Failing to create the output
/// directory fails all of them.
pub fn write_docs(assembler: &mut Assembler<'_>, config: &Config, only: Option<&str>) -> WriteReport {
    let names: Vec<String> = match only {
        Some(name) => vec![name.to_string()],
        None => config.doc_names().map(str::to_string).collect(),
    };

    let dir = &config.file_output_path;
    if let Err(e) = fs::create_dir_all(dir) {
        tracing::error!(path = %dir.display(), "cannot create output directory: {}", e);
        let results = names
            .into_iter()
            .map(|name| {
                let err = io::Error::new(
                    e.kind(),
                    format!("Failed to create {:?}: {}", dir, e),
                );
                (name, Err(AppError::Io(err)))
            })
            .collect();
        return WriteReport { results };
    }

    let mut report = WriteReport::default();
    for name in names {
        let result = write_one(assembler, dir.join(format!("{}.json", name)), &name);
        if let Err(e) = &result {
            tracing::error!(doc = %name, "document not written: {}", e);
        }
        report.results.push((name, result));
    }
    report
}

fn write_one(assembler: &mut Assembler<'_>, file: PathBuf, name: &str) -> AppResult<PathBuf> {
    let doc = assembler.assemble(name)?;
    fs::write(&file, doc.to_json_pretty()?)?;
    tracing::debug!(path = %file.display(), "document written");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocSettings;
    use crate::registry::Registry;
    use crate::routes::RouteIndex;
    use tempfile::tempdir;

    fn config(dir: PathBuf) -> Config {
        let mut config = Config::default()
            .with_doc("api", DocSettings::new("API", "1", "Root"))
            .with_doc("administration", DocSettings::new("Admin", "1", "AdminRoot"));
        config.file_output_path = dir;
        config
    }

    #[test]
    fn test_write_all_docs() {
        let dir = tempdir().unwrap();
        let config = config(dir.path().join("open_api"));
        let registry = Registry::new(RouteIndex::default());
        let mut assembler = Assembler::new(&registry, &config);

        let report = write_docs(&mut assembler, &config, None);
        assert!(report.is_success());
        assert_eq!(report.written().len(), 2);

        let written = fs::read_to_string(dir.path().join("open_api/api.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(
            report.notices(),
            vec![
                "[ZRO] `           api.json` has been generated.".to_string(),
                "[ZRO] `administration.json` has been generated.".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_doc_fails_alone() {
        let dir = tempdir().unwrap();
        let config = config(dir.path().to_path_buf());
        let registry = Registry::new(RouteIndex::default());
        let mut assembler = Assembler::new(&registry, &config);

        let report = write_docs(&mut assembler, &config, Some("missing"));
        assert!(!report.is_success());
        assert_eq!(report.failures()[0].0, "missing");
        assert!(report.notices().is_empty());
    }

    #[test]
    fn test_unwritable_directory_fails_every_doc() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let config = config(blocker.join("nested"));
        let registry = Registry::new(RouteIndex::default());
        let mut assembler = Assembler::new(&registry, &config);

        let report = write_docs(&mut assembler, &config, None);
        assert_eq!(report.failures().len(), 2);
    }
}
