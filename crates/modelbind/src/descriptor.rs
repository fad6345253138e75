//! Declarative metadata for model members.
//!
//! Descriptors are pure data. They are produced once, while a model's
//! [`ModelSpec`](crate::ModelSpec) is assembled into a command graph, and
//! carry no behavior beyond resolving their own conflicting settings:
//!
//! - An explicit `min_values`/`max_values` pair beats a canonical [`Arity`].
//! - At most one [`PathConstraint`] may be set per member.

use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Canonical arity shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Zero,
    ZeroOrOne,
    ZeroOrMore,
    ExactlyOne,
    OneOrMore,
}

impl Arity {
    /// The min/max bounds this shape stands for.
    pub fn bounds(self) -> ArityBounds {
        match self {
            Arity::Zero => ArityBounds::new(0, Some(0)),
            Arity::ZeroOrOne => ArityBounds::new(0, Some(1)),
            Arity::ZeroOrMore => ArityBounds::new(0, None),
            Arity::ExactlyOne => ArityBounds::new(1, Some(1)),
            Arity::OneOrMore => ArityBounds::new(1, None),
        }
    }
}

/// Minimum and maximum number of values a member accepts.
///
/// `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityBounds {
    pub min: usize,
    pub max: Option<usize>,
}

impl ArityBounds {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Returns true if more than one value can be accepted.
    pub fn allows_many(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Returns true if no value can be accepted at all.
    pub fn is_zero(&self) -> bool {
        self.max == Some(0)
    }

    /// Bounds as a clap `num_args` range.
    pub(crate) fn to_range(self) -> clap::builder::ValueRange {
        match self.max {
            Some(max) => (self.min..=max).into(),
            None => (self.min..).into(),
        }
    }
}

/// Restrictions on the text of path-like values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathConstraint {
    /// The value must be usable as a single file name (no separators).
    LegalFileNamesOnly,
    /// The value must be usable as a file path.
    LegalFilePathsOnly,
    /// The value must name a file or directory that exists.
    ExistingOnly,
}

#[cfg(windows)]
const INVALID_PATH_CHARS: &[char] = &['\0', '<', '>', '"', '|', '?', '*'];
#[cfg(not(windows))]
const INVALID_PATH_CHARS: &[char] = &['\0'];

impl PathConstraint {
    /// Checks a raw token against the constraint.
    pub fn check(&self, raw: &str) -> Result<(), String> {
        match self {
            PathConstraint::LegalFileNamesOnly => {
                if let Some(c) = raw
                    .chars()
                    .find(|c| INVALID_PATH_CHARS.contains(c) || *c == '/' || *c == '\\' || *c == ':')
                {
                    return Err(format!("Character not allowed in a file name: '{}'", c));
                }
                Ok(())
            }
            PathConstraint::LegalFilePathsOnly => {
                if let Some(c) = raw.chars().find(|c| INVALID_PATH_CHARS.contains(c)) {
                    return Err(format!("Character not allowed in a path: '{}'", c));
                }
                Ok(())
            }
            PathConstraint::ExistingOnly => {
                if Path::new(raw).exists() {
                    Ok(())
                } else {
                    Err(format!("File or directory does not exist: '{}'", raw))
                }
            }
        }
    }
}

impl fmt::Display for PathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathConstraint::LegalFileNamesOnly => write!(f, "legal-file-names-only"),
            PathConstraint::LegalFilePathsOnly => write!(f, "legal-file-paths-only"),
            PathConstraint::ExistingOnly => write!(f, "existing-only"),
        }
    }
}

/// Whether a value member is a named option or a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Option,
    Argument,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Option => write!(f, "option"),
            MemberKind::Argument => write!(f, "argument"),
        }
    }
}

/// Metadata for a value member (option or positional argument).
#[derive(Debug, Clone)]
pub struct ValueDescriptor {
    pub kind: MemberKind,
    /// The member identifier, e.g. `dry_run`.
    pub member: String,
    /// Explicit display name; derived from `member` when absent.
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    /// Placeholder shown for the value in usage text.
    pub value_name: Option<String>,
    pub min_values: Option<usize>,
    pub max_values: Option<usize>,
    pub arity: Option<Arity>,
    /// Options only: visible and bindable at every descendant command.
    pub global: bool,
    pub hidden: bool,
    /// Options only: the option must appear on the command line.
    pub required: bool,
    /// Options only: one occurrence may carry several values.
    pub multiple_per_token: bool,
    pub constraints: Vec<PathConstraint>,
}

impl ValueDescriptor {
    fn new(kind: MemberKind, member: impl Into<String>) -> Self {
        Self {
            kind,
            member: member.into(),
            name: None,
            aliases: Vec::new(),
            description: None,
            value_name: None,
            min_values: None,
            max_values: None,
            arity: None,
            global: false,
            hidden: false,
            required: false,
            multiple_per_token: false,
            constraints: Vec::new(),
        }
    }

    /// Creates a descriptor for a named option.
    pub fn option(member: impl Into<String>) -> Self {
        Self::new(MemberKind::Option, member)
    }

    /// Creates a descriptor for a positional argument.
    pub fn argument(member: impl Into<String>) -> Self {
        Self::new(MemberKind::Argument, member)
    }

    /// The declared arity, if any.
    ///
    /// An explicit min/max pair wins over a canonical shape. A missing half of
    /// the pair defaults to 0 (min) or unbounded (max). Returns `None` when
    /// nothing was declared, leaving the choice to the value type.
    pub fn declared_arity(&self) -> Option<ArityBounds> {
        if self.min_values.is_some() || self.max_values.is_some() {
            return Some(ArityBounds::new(
                self.min_values.unwrap_or(0),
                self.max_values,
            ));
        }
        self.arity.map(Arity::bounds)
    }

    /// The single path constraint on this member, if any.
    pub fn path_constraint(
        &self,
        model: &'static str,
    ) -> Result<Option<PathConstraint>, ConfigError> {
        let mut found: Option<PathConstraint> = None;
        for &constraint in &self.constraints {
            match found {
                Some(first) if first != constraint => {
                    return Err(ConfigError::ConflictingConstraints {
                        model,
                        member: self.member.clone(),
                        first,
                        second: constraint,
                    });
                }
                _ => found = Some(constraint),
            }
        }
        Ok(found)
    }
}

/// Metadata for a command member (a nested model).
#[derive(Debug, Clone, Default)]
pub struct CommandDescriptor {
    pub member: String,
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub hidden: bool,
}

impl CommandDescriptor {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_bounds() {
        assert_eq!(Arity::Zero.bounds(), ArityBounds::new(0, Some(0)));
        assert_eq!(Arity::ZeroOrOne.bounds(), ArityBounds::new(0, Some(1)));
        assert_eq!(Arity::ZeroOrMore.bounds(), ArityBounds::new(0, None));
        assert_eq!(Arity::ExactlyOne.bounds(), ArityBounds::new(1, Some(1)));
        assert_eq!(Arity::OneOrMore.bounds(), ArityBounds::new(1, None));
    }

    #[test]
    fn test_allows_many() {
        assert!(!Arity::ZeroOrOne.bounds().allows_many());
        assert!(!Arity::ExactlyOne.bounds().allows_many());
        assert!(Arity::OneOrMore.bounds().allows_many());
        assert!(ArityBounds::new(0, Some(3)).allows_many());
        assert!(Arity::Zero.bounds().is_zero());
    }

    #[test]
    fn test_explicit_pair_wins_over_shape() {
        let mut desc = ValueDescriptor::option("names");
        desc.arity = Some(Arity::ExactlyOne);
        desc.max_values = Some(4);
        assert_eq!(desc.declared_arity(), Some(ArityBounds::new(0, Some(4))));

        desc.min_values = Some(2);
        assert_eq!(desc.declared_arity(), Some(ArityBounds::new(2, Some(4))));
    }

    #[test]
    fn test_shape_used_without_explicit_pair() {
        let mut desc = ValueDescriptor::argument("files");
        assert_eq!(desc.declared_arity(), None);

        desc.arity = Some(Arity::OneOrMore);
        assert_eq!(desc.declared_arity(), Some(ArityBounds::new(1, None)));
    }

    #[test]
    fn test_single_constraint_accepted() {
        let mut desc = ValueDescriptor::option("input");
        desc.constraints = vec![PathConstraint::ExistingOnly, PathConstraint::ExistingOnly];
        assert_eq!(
            desc.path_constraint("Root").unwrap(),
            Some(PathConstraint::ExistingOnly)
        );
    }

    #[test]
    fn test_conflicting_constraints_rejected() {
        let mut desc = ValueDescriptor::option("input");
        desc.constraints = vec![
            PathConstraint::LegalFileNamesOnly,
            PathConstraint::ExistingOnly,
        ];
        let err = desc.path_constraint("Root").unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingConstraints { .. }));
    }

    #[test]
    fn test_file_name_constraint() {
        let c = PathConstraint::LegalFileNamesOnly;
        assert!(c.check("report.txt").is_ok());
        assert!(c.check("dir/report.txt").is_err());
        assert!(c.check("nul\0byte").is_err());
    }

    #[test]
    fn test_file_path_constraint() {
        let c = PathConstraint::LegalFilePathsOnly;
        assert!(c.check("dir/report.txt").is_ok());
        assert!(c.check("bad\0path").is_err());
    }

    #[test]
    fn test_existing_constraint() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "x").unwrap();

        let c = PathConstraint::ExistingOnly;
        assert!(c.check(present.to_str().unwrap()).is_ok());
        assert!(c.check(dir.path().to_str().unwrap()).is_ok());

        let err = c
            .check(dir.path().join("missing.txt").to_str().unwrap())
            .unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
