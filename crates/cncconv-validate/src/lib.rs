//! Diagnostics: residual-command scanning of converted output and
//! validation of conversion settings. Everything here returns findings
//! instead of raising; turning findings into a hard error is the
//! caller's choice via [`ensure_valid`].

use std::fs;
use std::path::Path;

use cncconv_core::{ConvertError, FilenameTransformConfig, RuleTable};
use cncconv_domain::{ResidualFinding, ValidationIssue};
use cncconv_rewrite::contains_bounded;
use tracing::debug;

const MAX_PREFIX_LEN: usize = 20;
const MAX_ENDING_LEN: usize = 10;

/// Scan converted lines for source commands that survived conversion.
///
/// Uses the same sequence/token distinction as the rewrite engine:
/// multi-word sources are matched whitespace-bounded, single-word
/// sources by exact token equality. Line numbers are 1-based.
pub fn check_residual_commands(lines: &[String], table: &RuleTable) -> Vec<ResidualFinding> {
    let mut findings = Vec::new();
    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim_end_matches('\n');
        for source in table.sources() {
            let present = if source.contains(char::is_whitespace) {
                contains_bounded(line, source)
            } else {
                line.split_whitespace().any(|tok| tok == source)
            };
            if present {
                findings.push(ResidualFinding {
                    line: idx + 1,
                    command: source.to_string(),
                    text: line.to_string(),
                });
            }
        }
    }
    findings
}

/// Validate prefix and extension settings. Length mismatches are only
/// skipped silently by the transform itself; here they are reported.
pub fn validate_filename_settings(config: &FilenameTransformConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_prefix(
        &mut issues,
        "source",
        config.source_prefix_count,
        &config.source_prefix_string,
    );
    check_prefix(
        &mut issues,
        "target",
        config.target_prefix_count,
        &config.target_prefix_string,
    );

    for (i, pair) in config.endings.iter().enumerate() {
        let source = pair.source.trim();
        let target = pair.target.trim();
        if source.is_empty() && target.is_empty() {
            continue;
        }
        check_ending(&mut issues, "source", i, source);
        check_ending(&mut issues, "target", i, target);
    }

    if issues.is_empty() {
        debug!("filename settings validated");
    }
    issues
}

fn check_prefix(issues: &mut Vec<ValidationIssue>, side: &str, count: usize, string: &str) {
    if count == 0 {
        return;
    }
    let actual = string.chars().count();
    if !string.is_empty() && actual != count {
        issues.push(ValidationIssue::new(
            "prefix",
            format!("{side} prefix '{string}' is {actual} characters long, expected {count}"),
        ));
    } else if count > MAX_PREFIX_LEN {
        issues.push(ValidationIssue::new(
            "prefix",
            format!("{side} prefix length {count} is unreasonably large (max {MAX_PREFIX_LEN})"),
        ));
    }
}

fn check_ending(issues: &mut Vec<ValidationIssue>, side: &str, index: usize, ending: &str) {
    if ending.is_empty() {
        return;
    }
    if !ending.starts_with('.') {
        issues.push(ValidationIssue::new(
            "ending",
            format!("{side} ending {} '{ending}' should start with '.'", index + 1),
        ));
    } else if ending.chars().count() > MAX_ENDING_LEN {
        issues.push(ValidationIssue::new(
            "ending",
            format!(
                "{side} ending {} '{ending}' is too long (max {MAX_ENDING_LEN} characters)",
                index + 1
            ),
        ));
    }
}

/// Validate the source and target directories. The target directory is
/// created when missing, mirroring what a conversion run would do.
pub fn validate_directories(source_dir: &Path, target_dir: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !source_dir.exists() {
        issues.push(ValidationIssue::new(
            "directory",
            format!("source directory does not exist: {}", source_dir.display()),
        ));
    } else if !source_dir.is_dir() {
        issues.push(ValidationIssue::new(
            "directory",
            format!("source path is not a directory: {}", source_dir.display()),
        ));
    }

    if let Err(err) = fs::create_dir_all(target_dir) {
        issues.push(ValidationIssue::new(
            "directory",
            format!(
                "target directory cannot be created: {}: {err}",
                target_dir.display()
            ),
        ));
    }

    if let (Ok(source), Ok(target)) = (source_dir.canonicalize(), target_dir.canonicalize()) {
        if source == target {
            issues.push(ValidationIssue::new(
                "directory",
                "source and target directory must not be identical",
            ));
        }
    }

    issues
}

/// Validate the rule table file: it must exist, parse, and contain at
/// least one rule.
pub fn validate_rules_file(path: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !path.exists() {
        issues.push(ValidationIssue::new(
            "rules",
            format!("rule table does not exist: {}", path.display()),
        ));
        return issues;
    }
    if !path.is_file() {
        issues.push(ValidationIssue::new(
            "rules",
            format!("rule table path is not a file: {}", path.display()),
        ));
        return issues;
    }

    match cncconv_rules::load_rule_table(path) {
        Ok(table) if table.is_empty() => {
            issues.push(ValidationIssue::new(
                "rules",
                format!("rule table contains no conversion rules: {}", path.display()),
            ));
        }
        Ok(table) => {
            debug!("rule table validated: {} rules", table.len());
        }
        Err(err) => {
            issues.push(ValidationIssue::new("rules", err.to_string()));
        }
    }
    issues
}

/// Probe write access by creating and removing a marker file.
pub fn validate_write_permissions(target_dir: &Path) -> Vec<ValidationIssue> {
    let probe = target_dir.join(".write_test_cncconv");
    match fs::write(&probe, "test") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Vec::new()
        }
        Err(err) => vec![ValidationIssue::new(
            "permissions",
            format!(
                "no write permission for target directory {}: {err}",
                target_dir.display()
            ),
        )],
    }
}

/// Turn a non-empty issue list into [`ConvertError::Validation`].
pub fn ensure_valid(issues: Vec<ValidationIssue>) -> Result<(), ConvertError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::Validation(
            issues.into_iter().map(|i| i.message).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cncconv_core::ExtensionPair;
    use tempfile::tempdir;

    fn table(rules: &[(&str, &str)]) -> RuleTable {
        rules
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect()
    }

    fn lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    #[test]
    fn reports_surviving_token_with_line_number() {
        let findings = check_residual_commands(
            &lines(&["G00 X1", "G01 M90 X5"]),
            &table(&[("M90", "WAITM(1,1,2)")]),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].command, "M90");
        assert_eq!(findings[0].text, "G01 M90 X5");
    }

    #[test]
    fn reports_surviving_sequence_only_when_bounded() {
        let rules = table(&[("M06 T01", "TC(1)")]);
        assert_eq!(check_residual_commands(&lines(&["AM06 T01"]), &rules), vec![]);
        let findings = check_residual_commands(&lines(&["G00 M06 T01"]), &rules);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].command, "M06 T01");
    }

    #[test]
    fn clean_output_yields_no_findings() {
        let findings = check_residual_commands(
            &lines(&["WAITM(1,1,2) ;wait", "G01 X5"]),
            &table(&[("M90", "WAITM(1,1,2)"), ("M99", "")]),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn prefix_length_mismatch_is_reported() {
        let mut cfg = FilenameTransformConfig::default();
        cfg.source_prefix_count = 3;
        cfg.source_prefix_string = "AB".into();
        let issues = validate_filename_settings(&cfg);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "prefix");
    }

    #[test]
    fn oversized_prefix_count_is_reported() {
        let mut cfg = FilenameTransformConfig::default();
        cfg.target_prefix_count = 21;
        let issues = validate_filename_settings(&cfg);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unreasonably large"));
    }

    #[test]
    fn endings_must_start_with_a_dot() {
        let mut cfg = FilenameTransformConfig::default();
        cfg.endings[0] = ExtensionPair::new("dnc", ".znc");
        cfg.endings[2] = ExtensionPair::new(".ok", ".alsooktoolongext");
        let issues = validate_filename_settings(&cfg);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("should start with '.'"));
        assert!(issues[1].message.contains("too long"));
    }

    #[test]
    fn valid_settings_produce_no_issues() {
        let mut cfg = FilenameTransformConfig::default();
        cfg.source_prefix_count = 2;
        cfg.source_prefix_string = "AB".into();
        cfg.endings[0] = ExtensionPair::new(".dnc", ".znc");
        assert!(validate_filename_settings(&cfg).is_empty());
    }

    #[test]
    fn missing_source_dir_and_identical_dirs_are_reported() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("missing");
        let issues = validate_directories(&missing, &dir.path().join("out"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "directory");

        let issues = validate_directories(dir.path(), dir.path());
        assert!(issues.iter().any(|i| i.message.contains("identical")));
    }

    #[test]
    fn rules_file_must_exist_and_contain_rules() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rules.csv");
        assert_eq!(validate_rules_file(&path).len(), 1);

        std::fs::write(&path, "source,target\n").expect("write");
        let issues = validate_rules_file(&path);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("no conversion rules"));

        std::fs::write(&path, "source,target\nM06,TC\n").expect("write");
        assert!(validate_rules_file(&path).is_empty());
    }

    #[test]
    fn ensure_valid_maps_issues_to_validation_error() {
        assert!(ensure_valid(Vec::new()).is_ok());
        let err = ensure_valid(vec![ValidationIssue::new("prefix", "bad")]).unwrap_err();
        assert!(matches!(err, ConvertError::Validation(ref msgs) if msgs == &["bad"]));
    }
}
