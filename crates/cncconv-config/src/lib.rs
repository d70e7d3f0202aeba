use serde::Deserialize;

use cncconv_core::{ExtensionPair, FilenameTransformConfig};

/// On-disk configuration. Every field is optional; missing values are
/// resolved to defaults at the boundary, not silently tolerated
/// throughout the core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CncConvConfig {
    pub rules_path: Option<String>,
    pub source_dir: Option<String>,
    pub target_dir: Option<String>,
    pub filename: Option<FilenameCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilenameCfg {
    pub source_prefix_count: Option<usize>,
    pub source_prefix_specific: Option<bool>,
    pub source_prefix_string: Option<String>,
    pub target_prefix_count: Option<usize>,
    pub target_prefix_specific: Option<bool>,
    pub target_prefix_string: Option<String>,
    pub endings: Option<Vec<EndingCfg>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndingCfg {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

pub fn load_config() -> Result<CncConvConfig, ConfigError> {
    // Search order: CWD/cncconv.toml, $HOME/.config/cncconv/cncconv.toml
    let mut merged = CncConvConfig::default();
    if let Ok(p) = std::env::current_dir() {
        let path = p.join("cncconv.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<CncConvConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    if let Some(base) = dirs::config_dir() {
        let path = base.join("cncconv").join("cncconv.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<CncConvConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    Ok(merged)
}

fn merge(mut a: CncConvConfig, b: CncConvConfig) -> CncConvConfig {
    if a.rules_path.is_none() {
        a.rules_path = b.rules_path;
    }
    if a.source_dir.is_none() {
        a.source_dir = b.source_dir;
    }
    if a.target_dir.is_none() {
        a.target_dir = b.target_dir;
    }
    a.filename = merge_opt(a.filename, b.filename, merge_filename);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_filename(mut a: FilenameCfg, b: FilenameCfg) -> FilenameCfg {
    if a.source_prefix_count.is_none() {
        a.source_prefix_count = b.source_prefix_count;
    }
    if a.source_prefix_specific.is_none() {
        a.source_prefix_specific = b.source_prefix_specific;
    }
    if a.source_prefix_string.is_none() {
        a.source_prefix_string = b.source_prefix_string;
    }
    if a.target_prefix_count.is_none() {
        a.target_prefix_count = b.target_prefix_count;
    }
    if a.target_prefix_specific.is_none() {
        a.target_prefix_specific = b.target_prefix_specific;
    }
    if a.target_prefix_string.is_none() {
        a.target_prefix_string = b.target_prefix_string;
    }
    if a.endings.is_none() {
        a.endings = b.endings;
    }
    a
}

/// Resolve the optional filename section into the typed transform
/// config, padding the endings list to its three fixed slots.
pub fn resolve_filename(cfg: Option<&FilenameCfg>) -> FilenameTransformConfig {
    let cfg = cfg.cloned().unwrap_or_default();
    let endings: Vec<ExtensionPair> = cfg
        .endings
        .unwrap_or_default()
        .into_iter()
        .map(|e| ExtensionPair {
            source: e.source.unwrap_or_default(),
            target: e.target.unwrap_or_default(),
        })
        .collect();

    let mut resolved = FilenameTransformConfig {
        source_prefix_count: cfg.source_prefix_count.unwrap_or(0),
        source_prefix_specific: cfg.source_prefix_specific.unwrap_or(false),
        source_prefix_string: cfg.source_prefix_string.unwrap_or_default(),
        target_prefix_count: cfg.target_prefix_count.unwrap_or(0),
        target_prefix_specific: cfg.target_prefix_specific.unwrap_or(false),
        target_prefix_string: cfg.target_prefix_string.unwrap_or_default(),
        endings,
    };
    resolved.normalize_endings();
    resolved
}
