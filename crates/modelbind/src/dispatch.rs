//! Command path helpers.
//!
//! A command path is the list of subcommand names below the root, e.g.
//! `app tool update` has the path `["tool", "update"]`. Paths are written
//! dot-separated (`tool.update`) when used as lookup keys.

use clap::ArgMatches;

/// Extracts the command path by following the subcommand chain.
pub fn extract_command_path(matches: &ArgMatches) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = matches;

    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }

    path
}

/// Gets the matches of the most deeply nested subcommand.
pub fn get_deepest_matches(matches: &ArgMatches) -> &ArgMatches {
    let mut current = matches;

    while let Some((_, sub)) = current.subcommand() {
        current = sub;
    }

    current
}

/// Converts a command path to its dot-separated form.
pub fn path_to_string(path: &[String]) -> String {
    path.join(".")
}

/// Parses a dot-separated command path.
pub fn string_to_path(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('.').map(String::from).collect()
    }
}
