use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Mapping from a source-dialect command to its target-dialect
/// replacement, built once per conversion run and immutable afterwards.
/// An empty target means "delete this command". Keys are case-sensitive
/// and stored as read; later insertions of the same source overwrite
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable(BTreeMap<String, String>);

impl RuleTable {
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.0.insert(source.into(), target.into());
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    /// All (source, target) pairs in deterministic (sorted) order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        RuleTable(iter.into_iter().collect())
    }
}

/// One extension-mapping slot. Both sides empty means the slot is unused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPair {
    pub source: String,
    pub target: String,
}

impl ExtensionPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        ExtensionPair {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }
}

/// Prefix and extension rules applied to output filenames.
///
/// `endings` always carries exactly [`ENDING_SLOTS`](Self::ENDING_SLOTS)
/// slots (padded with blank pairs) so UI bindings stay stable; blank
/// pairs are no-ops for the transform itself. Prefix counts are measured
/// in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameTransformConfig {
    pub source_prefix_count: usize,
    pub source_prefix_specific: bool,
    pub source_prefix_string: String,
    pub target_prefix_count: usize,
    pub target_prefix_specific: bool,
    pub target_prefix_string: String,
    pub endings: Vec<ExtensionPair>,
}

impl FilenameTransformConfig {
    pub const ENDING_SLOTS: usize = 3;

    /// Pad or truncate `endings` to exactly [`ENDING_SLOTS`](Self::ENDING_SLOTS).
    pub fn normalize_endings(&mut self) {
        self.endings.truncate(Self::ENDING_SLOTS);
        while self.endings.len() < Self::ENDING_SLOTS {
            self.endings.push(ExtensionPair::default());
        }
    }
}

impl Default for FilenameTransformConfig {
    fn default() -> Self {
        FilenameTransformConfig {
            source_prefix_count: 0,
            source_prefix_specific: false,
            source_prefix_string: String::new(),
            target_prefix_count: 0,
            target_prefix_specific: false,
            target_prefix_string: String::new(),
            endings: vec![ExtensionPair::default(); Self::ENDING_SLOTS],
        }
    }
}

/// Error kinds surfaced by the conversion core.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Rule table unreadable or unparsable.
    #[error("failed to load rule table {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Missing source directory or file; aborts the whole operation.
    #[error("source not found: {path}")]
    NotFound { path: PathBuf },

    /// Read/write failure on an individual file.
    #[error("i/o error on {file}: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cooperative cancellation observed at a checkpoint.
    #[error("conversion cancelled")]
    Cancelled,

    /// Settings rejected by the validation pass.
    #[error("invalid settings: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ConvertError {
    pub fn io(file: impl AsRef<Path>, source: std::io::Error) -> Self {
        ConvertError::Io {
            file: file.as_ref().to_path_buf(),
            source,
        }
    }
}
