use std::path::Path;

use cncconv_core::{ConvertError, RuleTable};

/// Load a conversion rule table from a CSV file.
///
/// The first row is a header and is skipped. Column 1 is the source
/// command, column 2 the target command; both are trimmed before use.
/// Rows with a blank source contribute no rule. A missing or blank
/// target becomes an explicit delete rule (mapped to the empty string).
/// A later row with the same source overwrites the earlier mapping.
pub fn load_rule_table(path: &Path) -> Result<RuleTable, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| load_error(path, e))?;

    let mut table = RuleTable::default();
    for record in reader.records() {
        let record = record.map_err(|e| load_error(path, e))?;
        let source = record.get(0).unwrap_or("").trim();
        if source.is_empty() {
            continue;
        }
        let target = record.get(1).unwrap_or("").trim();
        table.insert(source, target);
    }
    Ok(table)
}

fn load_error(path: &Path, err: csv::Error) -> ConvertError {
    ConvertError::Load {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_rules(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rules.csv");
        fs::write(&path, contents).expect("write rules");
        (dir, path)
    }

    #[test]
    fn loads_two_column_rows_and_skips_header() {
        let (_dir, path) = write_rules("source,target\nM06,TC\n\"M06 T01\",\"TC(1)\"\n");
        let table = load_rule_table(&path).expect("load");
        assert_eq!(table.get("M06"), Some("TC"));
        assert_eq!(table.get("M06 T01"), Some("TC(1)"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn blank_source_rows_are_skipped_and_blank_target_means_delete() {
        let (_dir, path) = write_rules("source,target\n,ignored\n   ,ignored\nM99,\nM98\n");
        let table = load_rule_table(&path).expect("load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("M99"), Some(""));
        assert_eq!(table.get("M98"), Some(""));
    }

    #[test]
    fn values_are_trimmed_and_last_row_wins() {
        let (_dir, path) = write_rules("source,target\n  M90 , WAITM(1) \nM90,\"WAITM(1,1,2)\"\n");
        let table = load_rule_table(&path).expect("load");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("M90"), Some("WAITM(1,1,2)"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempdir().expect("tempdir");
        let err = load_rule_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, ConvertError::Load { .. }));
    }
}
