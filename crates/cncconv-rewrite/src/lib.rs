//! Rule-driven rewriting of CNC program lines.
//!
//! Each line goes through four passes in fixed order: protect
//! target-side function calls, apply sequence rules (multi-word
//! sources, longest first), apply token rules, translate paren
//! comments to the semicolon convention. The order matters: sequence
//! rules may introduce tokens that token rules must not touch, and the
//! comment pass has to see the final token stream.

use std::collections::BTreeMap;

use cncconv_core::RuleTable;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex")
});

/// A rule table compiled into the forms the per-line passes consume.
pub struct CompiledRules {
    /// Collapses `NAME <ws> (` into `NAME(` for every function-call
    /// style target, so a converted call is never re-tokenized and its
    /// opening paren stays glued to an identifier character.
    protect: Option<Regex>,
    /// Sources containing internal whitespace, longest source first.
    sequences: Vec<(String, String)>,
    /// Single-word sources, matched by exact token equality.
    tokens: BTreeMap<String, String>,
}

impl CompiledRules {
    pub fn compile(table: &RuleTable) -> Self {
        let mut names: Vec<&str> = table
            .entries()
            .filter_map(|(_, target)| function_name(target))
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        let protect = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"\b({alternation})\s*\(")).expect("protect regex"))
        };

        let mut sequences = Vec::new();
        let mut tokens = BTreeMap::new();
        for (source, target) in table.entries() {
            if source.contains(char::is_whitespace) {
                sequences.push((source.to_string(), target.to_string()));
            } else {
                tokens.insert(source.to_string(), target.to_string());
            }
        }
        sequences.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        CompiledRules {
            protect,
            sequences,
            tokens,
        }
    }

    /// Rewrite one line. Accepts the line with or without its trailing
    /// newline and returns it without one.
    pub fn rewrite_line(&self, raw: &str) -> String {
        let line = raw.trim_end_matches('\n');

        // 1) glue protected calls together: "WAITM (1,1,2)" -> "WAITM(1,1,2)"
        let mut line = match &self.protect {
            Some(re) => re
                .replace_all(line, |caps: &regex::Captures| format!("{}(", &caps[1]))
                .into_owned(),
            None => line.to_string(),
        };

        // 2) whole sequences, longest source first
        for (source, target) in &self.sequences {
            line = replace_bounded(&line, source, target);
        }

        // 3) single commands, token by token; empty target drops the token
        let mut kept: Vec<&str> = Vec::new();
        for tok in line.split_whitespace() {
            match self.tokens.get(tok) {
                Some(t) if t.is_empty() => {}
                Some(t) => kept.push(t),
                None => kept.push(tok),
            }
        }
        let line = kept.join(" ");

        // 4) paren comments to semicolon comments
        translate_comments(&line)
    }
}

/// Convenience entry point: compile `table` and rewrite all `lines`,
/// returning one newline-terminated output line per input line.
pub fn rewrite_lines(lines: &[String], table: &RuleTable) -> Vec<String> {
    let rules = CompiledRules::compile(table);
    lines
        .iter()
        .map(|l| {
            let mut out = rules.rewrite_line(l);
            out.push('\n');
            out
        })
        .collect()
}

/// Extract the call name from a function-call style target such as
/// `WAITM(1,1,2)`; only valid identifiers count.
fn function_name(target: &str) -> Option<&str> {
    if target.is_empty() || !target.contains('(') || !target.contains(')') {
        return None;
    }
    let open = target.find('(')?;
    let name = target[..open].trim();
    IDENT_RE.is_match(name).then_some(name)
}

/// Replace every occurrence of `needle` in `line` that is bounded by
/// whitespace or the line edges on both sides. Matches are
/// non-overlapping and scanned left to right; `replacement` may be
/// empty.
pub fn replace_bounded(line: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    while let Some(off) = line[cursor..].find(needle) {
        let start = cursor + off;
        let end = start + needle.len();
        if bounded_at(line, start, end) {
            out.push_str(&line[cursor..start]);
            out.push_str(replacement);
            cursor = end;
        } else {
            let step = line[start..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&line[cursor..start + step]);
            cursor = start + step;
        }
    }
    out.push_str(&line[cursor..]);
    out
}

/// True when `needle` occurs in `line` bounded by whitespace or the
/// line edges on both sides.
pub fn contains_bounded(line: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut cursor = 0;
    while let Some(off) = line[cursor..].find(needle) {
        let start = cursor + off;
        let end = start + needle.len();
        if bounded_at(line, start, end) {
            return true;
        }
        let step = line[start..].chars().next().map_or(1, char::len_utf8);
        cursor = start + step;
    }
    false
}

fn bounded_at(line: &str, start: usize, end: usize) -> bool {
    let before_ok = line[..start]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    let after_ok = line[end..].chars().next().map_or(true, char::is_whitespace);
    before_ok && after_ok
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Translate paren comments to the semicolon convention in two passes:
/// paired `(...)` first, then a trailing unmatched `(` at end of line.
/// The trailing pass looks at the paired pass's output, matching the
/// original two-regex behavior.
fn translate_comments(line: &str) -> String {
    translate_trailing(translate_paired(line))
}

/// `( ... )` not immediately preceded by an identifier character
/// becomes `;<trimmed content>`. Identifier-adjacent parens are
/// function-call syntax and stay untouched.
fn translate_paired(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    while let Some(off) = line[cursor..].find('(') {
        let open = cursor + off;
        let adjacent = line[..open].chars().next_back().is_some_and(is_ident_char);
        if adjacent {
            out.push_str(&line[cursor..open + 1]);
            cursor = open + 1;
            continue;
        }
        match line[open + 1..].find(')') {
            Some(len) => {
                let close = open + 1 + len;
                out.push_str(&line[cursor..open]);
                out.push(';');
                out.push_str(line[open + 1..close].trim());
                cursor = close + 1;
            }
            // no closing paren anywhere after this point, so no later
            // open can be paired either
            None => break,
        }
    }
    out.push_str(&line[cursor..]);
    out
}

/// A lone `(` at end of line (ignoring trailing whitespace), not
/// preceded by an identifier character, becomes a bare `;`.
fn translate_trailing(line: String) -> String {
    let trimmed = line.trim_end();
    if !trimmed.ends_with('(') {
        return line;
    }
    let stem = &trimmed[..trimmed.len() - 1];
    if stem.chars().next_back().is_some_and(is_ident_char) {
        return line;
    }
    format!("{stem};")
}
