//! Analysis ingest: parsing, validation and node identity.

pub mod keys;
pub mod model;

use std::path::Path;

use tracing::debug;

use crate::error::{CodemapError, CodemapResult};
use model::Analysis;

/// Aggregate counts for an analysis document, used in import logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub imports: usize,
    pub files_with_errors: usize,
}

impl Analysis {
    /// Reject documents that would produce nodes without identity.
    ///
    /// A file with an empty path cannot be keyed, and neither can a class or
    /// function with an empty name. Analyzer errors do not fail validation.
    pub fn validate(&self) -> CodemapResult<()> {
        for (index, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(CodemapError::malformed(format!("file #{} has no path", index + 1)));
            }
            if file.classes.iter().any(|c| c.name.is_empty()) {
                return Err(CodemapError::malformed(format!("{}: class with no name", file.path)));
            }
            if file.functions.iter().any(|f| f.name.is_empty()) {
                return Err(CodemapError::malformed(format!("{}: function with no name", file.path)));
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> AnalysisStats {
        self.files.iter().fold(AnalysisStats::default(), |mut acc, file| {
            acc.files += 1;
            acc.classes += file.classes.len();
            acc.functions += file.functions.len();
            acc.imports += file.imports.len();
            if file.analyzer_error().is_some() {
                acc.files_with_errors += 1;
            }
            acc
        })
    }

    /// Whether the document contains a file with exactly this path.
    pub fn contains_path(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// Parse an analysis document from JSON text.
pub fn parse_analysis(json: &str) -> CodemapResult<Analysis> {
    let analysis: Analysis = serde_json::from_str(json)?;
    analysis.validate()?;
    Ok(analysis)
}

/// Read and parse an analysis document from disk.
pub fn load_analysis(path: &Path) -> CodemapResult<Analysis> {
    let json = std::fs::read_to_string(path)?;
    let analysis = parse_analysis(&json)?;
    debug!(path = %path.display(), files = analysis.files.len(), "Loaded analysis document");
    Ok(analysis)
}
