use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Per-file outcome inside a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileOutcome {
    pub file: String,
    /// "converted" or "failed"
    pub status: String,
    pub output: Option<String>,
    pub error: Option<String>,
}

/// Aggregate counts over one batch run. `total` is the number of files
/// discovered, which exceeds `succeeded + failed` when the run was
/// cancelled early.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub files: Vec<FileOutcome>,
}

/// A source command that survived conversion, with the 1-based line it
/// was found on. Advisory: a finding means a rule never fired there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResidualFinding {
    pub line: usize,
    pub command: String,
    pub text: String,
}

/// One problem reported by the settings validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationIssue {
    /// Machine-readable category: "prefix" | "ending" | "directory" | "rules" | "permissions"
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}
