//! Filename transformation: prefix cut/add and extension mapping.
//!
//! Pure string work, no I/O. Length mismatches between a declared
//! prefix count and the actual prefix string silently skip the step;
//! reporting them loudly is the validation pass's job.

use cncconv_core::FilenameTransformConfig;

/// Apply the configured prefix and extension rules to one filename.
pub fn transform_filename(original: &str, config: &FilenameTransformConfig) -> String {
    let (base, ext) = split_extension(original);
    let mut name = base.to_string();

    // 1) cut the source prefix, remembering what was removed
    let mut cut_prefix = String::new();
    if config.source_prefix_count > 0 {
        if config.source_prefix_specific {
            let wanted = &config.source_prefix_string;
            if !wanted.is_empty()
                && wanted.chars().count() == config.source_prefix_count
                && name.starts_with(wanted.as_str())
            {
                cut_prefix = wanted.clone();
                name.drain(..wanted.len());
            }
        } else if name.chars().count() >= config.source_prefix_count {
            let split = name
                .char_indices()
                .nth(config.source_prefix_count)
                .map_or(name.len(), |(i, _)| i);
            cut_prefix = name[..split].to_string();
            name.drain(..split);
        }
    }

    // 2) add the target prefix; `specific` gates on a prefix actually
    //    having been removed in step 1
    let target = &config.target_prefix_string;
    if config.target_prefix_count > 0
        && !target.is_empty()
        && target.chars().count() == config.target_prefix_count
        && (!config.target_prefix_specific || !cut_prefix.is_empty())
    {
        name.insert_str(0, target);
    }

    // 3) map the extension: first applicable pair wins
    let mut new_ext = ext.to_string();
    for pair in &config.endings {
        let source = pair.source.trim();
        let target = pair.target.trim();
        if source.is_empty() && target.is_empty() {
            continue;
        }
        if source.is_empty() {
            // append to whatever extension exists
            new_ext = format!("{ext}{target}");
            break;
        }
        if ext.eq_ignore_ascii_case(source) {
            // replace, or strip when the target side is empty
            new_ext = target.to_string();
            break;
        }
    }

    name + &new_ext
}

/// Split into base name and final extension (including the dot).
/// Leading dots never start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    let stripped = name.trim_start_matches('.');
    let lead = name.len() - stripped.len();
    match stripped.rfind('.') {
        Some(idx) => name.split_at(lead + idx),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cncconv_core::ExtensionPair;

    fn config() -> FilenameTransformConfig {
        FilenameTransformConfig::default()
    }

    #[test]
    fn split_keeps_leading_dots_with_the_base() {
        assert_eq!(split_extension("ABxyz.dnc"), ("ABxyz", ".dnc"));
        assert_eq!(split_extension(".profile"), (".profile", ""));
        assert_eq!(split_extension("a.b.c"), ("a.b", ".c"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[test]
    fn specific_prefix_is_cut_only_when_it_matches() {
        let mut cfg = config();
        cfg.source_prefix_count = 2;
        cfg.source_prefix_specific = true;
        cfg.source_prefix_string = "AB".into();
        assert_eq!(transform_filename("ABxyz.dnc", &cfg), "xyz.dnc");
        assert_eq!(transform_filename("CDxyz.dnc", &cfg), "CDxyz.dnc");
    }

    #[test]
    fn specific_prefix_with_wrong_declared_length_is_skipped() {
        let mut cfg = config();
        cfg.source_prefix_count = 3;
        cfg.source_prefix_specific = true;
        cfg.source_prefix_string = "AB".into();
        assert_eq!(transform_filename("ABxyz.dnc", &cfg), "ABxyz.dnc");
    }

    #[test]
    fn counted_prefix_cut_needs_enough_characters() {
        let mut cfg = config();
        cfg.source_prefix_count = 2;
        assert_eq!(transform_filename("ABxyz.dnc", &cfg), "xyz.dnc");
        assert_eq!(transform_filename("A.dnc", &cfg), "A.dnc");
    }

    #[test]
    fn target_prefix_is_added_when_length_matches() {
        let mut cfg = config();
        cfg.target_prefix_count = 3;
        cfg.target_prefix_string = "NEW".into();
        assert_eq!(transform_filename("xyz.dnc", &cfg), "NEWxyz.dnc");

        cfg.target_prefix_count = 4;
        assert_eq!(transform_filename("xyz.dnc", &cfg), "xyz.dnc");
    }

    #[test]
    fn specific_target_prefix_requires_a_cut() {
        let mut cfg = config();
        cfg.source_prefix_count = 2;
        cfg.source_prefix_specific = true;
        cfg.source_prefix_string = "AB".into();
        cfg.target_prefix_count = 2;
        cfg.target_prefix_specific = true;
        cfg.target_prefix_string = "ZZ".into();
        assert_eq!(transform_filename("ABxyz.dnc", &cfg), "ZZxyz.dnc");
        assert_eq!(transform_filename("CDxyz.dnc", &cfg), "CDxyz.dnc");
    }

    #[test]
    fn extension_match_is_case_insensitive_and_can_strip() {
        let mut cfg = config();
        cfg.endings[0] = ExtensionPair::new(".dnc", "");
        assert_eq!(transform_filename("part.DNC", &cfg), "part");
    }

    #[test]
    fn extension_replacement_uses_first_applicable_pair() {
        let mut cfg = config();
        cfg.endings[0] = ExtensionPair::new(".dnc", ".znc");
        cfg.endings[1] = ExtensionPair::new(".nc", ".out");
        assert_eq!(transform_filename("part.nc", &cfg), "part.out");
        assert_eq!(transform_filename("part.dnc", &cfg), "part.znc");
        assert_eq!(transform_filename("part.txt", &cfg), "part.txt");
    }

    #[test]
    fn empty_source_pair_appends_to_existing_extension() {
        let mut cfg = config();
        cfg.endings[0] = ExtensionPair::new("", ".bak");
        assert_eq!(transform_filename("part.dnc", &cfg), "part.dnc.bak");
        assert_eq!(transform_filename("part", &cfg), "part.bak");
    }

    #[test]
    fn blank_pairs_are_no_ops() {
        assert_eq!(transform_filename("part.dnc", &config()), "part.dnc");
    }

    #[test]
    fn prefix_counts_are_in_characters_not_bytes() {
        let mut cfg = config();
        cfg.source_prefix_count = 2;
        assert_eq!(transform_filename("äöxyz.dnc", &cfg), "xyz.dnc");
    }
}
