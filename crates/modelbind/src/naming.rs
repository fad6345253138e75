//! Convention-derived display names.
//!
//! - Commands and positional arguments: the member identifier in kebab-case
//!   (`dry_run` becomes `dry-run`).
//! - Options: kebab-case too, with the last word singularized unless one
//!   occurrence may carry several values (`places` becomes `place`, a
//!   multi-value `names` stays `names`).

use heck::ToKebabCase;

/// Converts a member identifier to its kebab-case display form.
pub fn kebab(member: &str) -> String {
    member.to_kebab_case()
}

/// Derives the long name (without dashes) for an option member.
pub fn option_name(member: &str, multiple_per_token: bool) -> String {
    let name = kebab(member);
    if multiple_per_token {
        return name;
    }
    match name.rsplit_once('-') {
        Some((head, last)) => format!("{}-{}", head, singularize(last)),
        None => singularize(&name),
    }
}

/// Strips leading dashes from an explicit option name.
pub fn strip_dashes(name: &str) -> &str {
    name.trim_start_matches('-')
}

/// Naive English singularization of one lowercase word.
pub fn singularize(word: &str) -> String {
    const KEEP: &[&str] = &["ss", "us", "is"];
    const DROP_ES: &[&str] = &["sses", "shes", "ches", "xes", "zes"];

    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if DROP_ES.iter().any(|suffix| word.ends_with(suffix)) {
        return word[..word.len() - 2].to_string();
    }
    if KEEP.iter().any(|suffix| word.ends_with(suffix)) {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kebab() {
        assert_eq!(kebab("dry_run"), "dry-run");
        assert_eq!(kebab("Names"), "names");
        assert_eq!(kebab("AllowMultiple"), "allow-multiple");
        assert_eq!(kebab("verbosity"), "verbosity");
    }

    #[test]
    fn test_option_name_singularizes() {
        assert_eq!(option_name("places", false), "place");
        assert_eq!(option_name("names", true), "names");
        assert_eq!(option_name("global", false), "global");
        assert_eq!(option_name("extra_entries", false), "extra-entry");
        assert_eq!(option_name("verbose", false), "verbose");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("places"), "place");
        assert_eq!(singularize("entries"), "entry");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("classes"), "class");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("axis"), "axis");
        assert_eq!(singularize("s"), "s");
        assert_eq!(singularize("file"), "file");
    }

    #[test]
    fn test_strip_dashes() {
        assert_eq!(strip_dashes("--verbosity"), "verbosity");
        assert_eq!(strip_dashes("-v"), "v");
        assert_eq!(strip_dashes("plain"), "plain");
    }

    proptest! {
        #[test]
        fn prop_kebab_is_lowercase_without_underscores(member in "[a-z][a-z_]{0,15}[a-z]") {
            let name = kebab(&member);
            prop_assert!(!name.contains('_'));
            prop_assert_eq!(name.to_lowercase(), name.clone());
        }

        #[test]
        fn prop_option_name_never_empty(member in "[a-z]{1,12}", multiple in any::<bool>()) {
            prop_assert!(!option_name(&member, multiple).is_empty());
        }
    }
}
