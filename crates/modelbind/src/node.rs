//! Parser-node factory.
//!
//! A [`ParserNode`] is the token-engine configuration for one value member: a
//! fully configured [`clap::Arg`] plus the facts the binder needs to read the
//! value back (id, shape, arity, whether a custom parser or default factory
//! is wired in).
//!
//! # Arity mapping
//!
//! | Member | clap configuration |
//! |--------|--------------------|
//! | flag option, arity zero | `ArgAction::SetTrue` |
//! | flag option, arity up to one | `num_args(0..=1)`, missing value means `true` |
//! | scalar option | `ArgAction::Set`, `num_args(min..=max)` |
//! | list option, several values per token | `ArgAction::Append`, `num_args(min..=max)` per occurrence, total checked at bind time |
//! | list option, one value per token | `ArgAction::Append`, `num_args(1)`; `min`/`max` checked at bind time |
//! | positional | `num_args(max(min, 1)..=max)`, required when `min > 0` and nothing else fills it |
//!
//! A scalar member only takes several tokens when a custom parser combines
//! them.

use clap::builder::ValueParser;
use clap::{Arg, ArgAction};
use std::path::PathBuf;

use crate::descriptor::{ArityBounds, MemberKind, PathConstraint, ValueDescriptor};
use crate::error::ConfigError;
use crate::naming;
use crate::value::{ValueKind, ValueShape};

/// The token-engine configuration for one value member.
#[derive(Debug, Clone)]
pub struct ParserNode {
    id: String,
    member: String,
    kind: MemberKind,
    shape: ValueShape,
    arity: ArityBounds,
    global: bool,
    custom_parser: bool,
    has_default: bool,
    /// Bounds on values collected across repeated occurrences.
    total: Option<ArityBounds>,
    arg: Arg,
}

impl ParserNode {
    /// Builds the node for a value member.
    ///
    /// `custom_parser` and `has_default` tell whether matching companion
    /// functions were found for the member.
    pub fn build(
        model: &'static str,
        descriptor: &ValueDescriptor,
        shape: ValueShape,
        custom_parser: bool,
        has_default: bool,
    ) -> Result<Self, ConfigError> {
        let id = display_id(descriptor);
        let arity = descriptor
            .declared_arity()
            .unwrap_or_else(|| shape.default_arity(descriptor.kind, custom_parser));

        if let Some(max) = arity.max {
            if arity.min > max {
                return Err(ConfigError::InvalidArity {
                    model,
                    member: descriptor.member.clone(),
                    min: arity.min,
                    max,
                });
            }
        }

        let unsupported = |reason: &str| ConfigError::UnsupportedArity {
            model,
            member: descriptor.member.clone(),
            reason: reason.to_string(),
        };

        if !shape.is_many() && !custom_parser && arity.allows_many() {
            return Err(unsupported("a single value cannot hold several tokens"));
        }
        if arity.is_zero() && !(shape.is_flag() && descriptor.kind == MemberKind::Option) {
            return Err(unsupported("only flag options can take zero values"));
        }
        if shape.is_flag() && !custom_parser && arity.allows_many() {
            return Err(unsupported("a flag takes at most one value"));
        }

        let constraint = descriptor.path_constraint(model)?;
        if let Some(constraint) = constraint {
            if !shape.kind().supports(constraint) {
                return Err(ConfigError::UnsupportedConstraint {
                    model,
                    member: descriptor.member.clone(),
                    constraint,
                    kind: shape.to_string(),
                });
            }
        }

        if descriptor.global && descriptor.kind == MemberKind::Argument {
            tracing::warn!(
                model,
                member = %descriptor.member,
                "global flag ignored for positional argument"
            );
        }
        let global = descriptor.global && descriptor.kind == MemberKind::Option;

        let mut arg = Arg::new(id.clone())
            .value_parser(element_parser(shape.kind(), custom_parser, constraint))
            .hide(descriptor.hidden);

        if let Some(description) = &descriptor.description {
            arg = arg.help(description.clone());
        }
        if let Some(value_name) = &descriptor.value_name {
            arg = arg.value_name(value_name.clone());
        }

        let mut total = None;
        match descriptor.kind {
            MemberKind::Option => {
                arg = arg.long(id.clone()).required(descriptor.required).global(global);
                arg = apply_aliases(arg, &descriptor.aliases);

                if shape.is_flag() && !custom_parser && arity.is_zero() {
                    arg = arg.action(ArgAction::SetTrue);
                } else if shape.is_flag() && !custom_parser {
                    arg = arg
                        .action(ArgAction::Set)
                        .num_args(arity.to_range())
                        .default_missing_value("true");
                } else if shape.is_many() && !descriptor.multiple_per_token {
                    arg = arg.action(ArgAction::Append).num_args(1);
                    total = Some(arity);
                } else if shape.is_many() {
                    arg = arg.action(ArgAction::Append).num_args(arity.to_range());
                    total = Some(arity);
                } else {
                    arg = arg.action(ArgAction::Set).num_args(arity.to_range());
                }
            }
            MemberKind::Argument => {
                let per_occurrence = ArityBounds::new(arity.min.max(1), arity.max);
                let required = arity.min > 0 && !has_default && !shape.is_optional();
                let action = if shape.is_many() || arity.allows_many() {
                    ArgAction::Append
                } else {
                    ArgAction::Set
                };
                arg = arg
                    .action(action)
                    .num_args(per_occurrence.to_range())
                    .required(required);
            }
        }

        tracing::trace!(model, id = %id, shape = %shape, ?arity, global, "built parser node");

        Ok(Self {
            id,
            member: descriptor.member.clone(),
            kind: descriptor.kind,
            shape,
            arity,
            global,
            custom_parser,
            has_default,
            total,
            arg,
        })
    }

    /// The clap id, equal to the long name for options.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name as typed on the command line (`--names` or `name`).
    pub fn display_name(&self) -> String {
        match self.kind {
            MemberKind::Option => format!("--{}", self.id),
            MemberKind::Argument => self.id.clone(),
        }
    }

    /// The model member this node was built from.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    pub fn arity(&self) -> ArityBounds {
        self.arity
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn has_custom_parser(&self) -> bool {
        self.custom_parser
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Bounds checked at bind time against the values of all occurrences.
    pub(crate) fn total_bounds(&self) -> Option<ArityBounds> {
        self.total
    }

    /// The configured clap argument.
    pub fn arg(&self) -> &Arg {
        &self.arg
    }
}

fn display_id(descriptor: &ValueDescriptor) -> String {
    match (&descriptor.name, descriptor.kind) {
        (Some(name), MemberKind::Option) => naming::strip_dashes(name).to_string(),
        (Some(name), MemberKind::Argument) => name.clone(),
        (None, MemberKind::Option) => {
            naming::option_name(&descriptor.member, descriptor.multiple_per_token)
        }
        (None, MemberKind::Argument) => naming::kebab(&descriptor.member),
    }
}

/// Single-dash one-letter aliases become the short flag (the first) or short
/// aliases; everything else becomes a visible long alias.
fn apply_aliases(mut arg: Arg, aliases: &[String]) -> Arg {
    let mut has_short = false;
    for alias in aliases {
        match short_flag(alias) {
            Some(c) if !has_short => {
                arg = arg.short(c);
                has_short = true;
            }
            Some(c) => arg = arg.short_alias(c),
            None => arg = arg.visible_alias(naming::strip_dashes(alias).to_string()),
        }
    }
    arg
}

fn short_flag(alias: &str) -> Option<char> {
    let mut chars = alias.strip_prefix('-')?.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '-' => Some(c),
        _ => None,
    }
}

/// The per-token value parser.
///
/// With a custom parser clap keeps the raw strings; the constraint, if any,
/// still runs on each token.
fn element_parser(
    kind: ValueKind,
    custom_parser: bool,
    constraint: Option<PathConstraint>,
) -> ValueParser {
    match (constraint, custom_parser, kind) {
        (None, true, _) => ValueKind::Text.value_parser(),
        (None, false, kind) => kind.value_parser(),
        (Some(c), false, ValueKind::Path) => {
            ValueParser::new(move |raw: &str| c.check(raw).map(|()| PathBuf::from(raw)))
        }
        (Some(c), _, _) => ValueParser::new(move |raw: &str| c.check(raw).map(|()| raw.to_string())),
    }
}
