//! Supported value kinds for value members.
//!
//! Every value member has a declared Rust type. That type is mapped onto a
//! closed set of [`ValueKind`]s, each with a fixed clap value parser, and a
//! [`ValueShape`] telling whether the member holds one value, an optional
//! value, or a list.
//!
//! | Rust type | Shape |
//! |-----------|-------|
//! | `bool`, `String`, `i64`, `u64`, `f64`, `PathBuf` | `Single` |
//! | `Option<T>` for any of the above | `Optional` |
//! | `Vec<T>` for any of the above | `Many` |
//!
//! New kinds are added by extending [`ValueKind`] and implementing
//! [`Scalar`] for the new type.

use std::fmt;
use std::path::PathBuf;

use clap::builder::ValueParser;
use clap::parser::MatchesError;
use clap::ArgMatches;

use crate::descriptor::{Arity, ArityBounds, MemberKind, PathConstraint};

/// The element type of a value member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Flag,
    Text,
    Integer,
    Unsigned,
    Float,
    Path,
}

impl ValueKind {
    /// The clap value parser performing the built-in conversion.
    pub(crate) fn value_parser(self) -> ValueParser {
        match self {
            ValueKind::Flag => clap::value_parser!(bool).into(),
            ValueKind::Text => clap::value_parser!(String).into(),
            ValueKind::Integer => clap::value_parser!(i64).into(),
            ValueKind::Unsigned => clap::value_parser!(u64).into(),
            ValueKind::Float => clap::value_parser!(f64).into(),
            ValueKind::Path => clap::value_parser!(PathBuf).into(),
        }
    }

    /// Returns true if values of this kind can honor the constraint.
    pub fn supports(self, constraint: PathConstraint) -> bool {
        match constraint {
            PathConstraint::ExistingOnly => self == ValueKind::Path,
            PathConstraint::LegalFileNamesOnly | PathConstraint::LegalFilePathsOnly => {
                matches!(self, ValueKind::Text | ValueKind::Path)
            }
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Flag => "flag",
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Unsigned => "unsigned",
            ValueKind::Float => "float",
            ValueKind::Path => "path",
        };
        f.write_str(name)
    }
}

/// How many values of a [`ValueKind`] a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Single(ValueKind),
    Optional(ValueKind),
    Many(ValueKind),
}

impl ValueShape {
    pub fn kind(self) -> ValueKind {
        match self {
            ValueShape::Single(kind) | ValueShape::Optional(kind) | ValueShape::Many(kind) => kind,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, ValueShape::Many(_))
    }

    pub fn is_optional(self) -> bool {
        matches!(self, ValueShape::Optional(_))
    }

    /// Returns true for a boolean option that takes no value of its own.
    pub fn is_flag(self) -> bool {
        !self.is_many() && self.kind() == ValueKind::Flag
    }

    /// The arity used when the member declares none.
    ///
    /// With a custom parser the raw tokens are the input, so a flag accepts
    /// an optional token instead of none.
    pub fn default_arity(self, kind: MemberKind, custom_parser: bool) -> ArityBounds {
        let arity = match (self, kind) {
            (ValueShape::Many(_), _) => Arity::OneOrMore,
            (shape, MemberKind::Option) if shape.is_flag() => {
                if custom_parser {
                    Arity::ZeroOrOne
                } else {
                    Arity::Zero
                }
            }
            _ => Arity::ExactlyOne,
        };
        arity.bounds()
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Single(kind) => write!(f, "{}", kind),
            ValueShape::Optional(kind) => write!(f, "optional {}", kind),
            ValueShape::Many(kind) => write!(f, "list of {}", kind),
        }
    }
}

/// A single element type stored by clap for a [`ValueKind`].
pub trait Scalar: Clone + Send + Sync + 'static {
    const KIND: ValueKind;
}

/// A Rust type a value member can be declared with.
pub trait ArgValue: Sized + 'static {
    const SHAPE: ValueShape;

    /// Reads the typed value for `id` out of the parse result.
    ///
    /// Returns `Ok(None)` when the member carries no value.
    fn from_matches(matches: &ArgMatches, id: &str) -> Result<Option<Self>, MatchesError>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }

            impl ArgValue for $ty {
                const SHAPE: ValueShape = ValueShape::Single(ValueKind::$kind);

                fn from_matches(
                    matches: &ArgMatches,
                    id: &str,
                ) -> Result<Option<Self>, MatchesError> {
                    Ok(matches.try_get_one::<$ty>(id)?.cloned())
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Flag,
    String => Text,
    i64 => Integer,
    u64 => Unsigned,
    f64 => Float,
    PathBuf => Path,
}

impl<T: Scalar> ArgValue for Option<T> {
    const SHAPE: ValueShape = ValueShape::Optional(T::KIND);

    fn from_matches(matches: &ArgMatches, id: &str) -> Result<Option<Self>, MatchesError> {
        Ok(matches.try_get_one::<T>(id)?.cloned().map(Some))
    }
}

impl<T: Scalar> ArgValue for Vec<T> {
    const SHAPE: ValueShape = ValueShape::Many(T::KIND);

    fn from_matches(matches: &ArgMatches, id: &str) -> Result<Option<Self>, MatchesError> {
        Ok(matches
            .try_get_many::<T>(id)?
            .map(|values| values.cloned().collect()))
    }
}
