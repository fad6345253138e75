//! Error types for graph assembly and invocation.
//!
//! Two phases, two error types:
//!
//! - [`ConfigError`] is raised while the command graph is assembled. It
//!   blocks startup; nothing of a failed assembly is usable.
//! - [`InvokeError`] is raised while a single invocation runs. It aborts that
//!   invocation only; the assembled graph is never touched.

use thiserror::Error;

use crate::descriptor::PathConstraint;

/// Inconsistent or unsupported model metadata, detected during assembly.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An arity whose lower bound exceeds its upper bound.
    #[error("invalid arity for `{member}` on {model}: min {min} exceeds max {max}")]
    InvalidArity {
        model: &'static str,
        member: String,
        min: usize,
        max: usize,
    },

    /// The arity cannot be carried by the member's value type.
    #[error("unsupported arity for `{member}` on {model}: {reason}")]
    UnsupportedArity {
        model: &'static str,
        member: String,
        reason: String,
    },

    /// More than one path constraint was set on one member.
    #[error("conflicting path constraints for `{member}` on {model}: {first} and {second}")]
    ConflictingConstraints {
        model: &'static str,
        member: String,
        first: PathConstraint,
        second: PathConstraint,
    },

    /// A path constraint was set on a member whose type cannot honor it.
    #[error("constraint {constraint} is not supported for `{member}` on {model} ({kind})")]
    UnsupportedConstraint {
        model: &'static str,
        member: String,
        constraint: PathConstraint,
        kind: String,
    },

    /// Two members of one model share an identifier.
    #[error("duplicate member `{member}` on {model}")]
    DuplicateMember { model: &'static str, member: String },

    /// Two parser-nodes or subcommands of one command share a name.
    #[error("duplicate name `{name}` in command `{command}`")]
    DuplicateName { command: String, name: String },

    /// A model type contains itself, directly or through descendants.
    #[error("cyclic model reference: {model} is nested inside itself")]
    CyclicModel { model: &'static str },
}

/// Failure of a single invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The token engine rejected the input (also used for help/version
    /// display, which clap reports as an error).
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// Constructing or populating a model instance failed.
    #[error("failed to bind `{member}` on {model}: {source}")]
    Binding {
        model: &'static str,
        member: String,
        #[source]
        source: anyhow::Error,
    },

    /// A handler or hook parameter could not be resolved.
    ///
    /// `Option<Rc<T>>` parameters raise this only under strict policy. An
    /// `Rc<T>` parameter cannot represent absence and raises it under either
    /// policy.
    #[error("unable to resolve service for invocation parameter of type [{type_name}]")]
    UnresolvedDependency { type_name: &'static str },

    /// The matched command has no handler and strict policy requires one.
    #[error("resolved command `{path}` is missing an invocation handler")]
    MissingHandler { path: String },

    /// The handler itself failed; the error is passed through untouched.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl InvokeError {
    /// Creates a binding error for a member of a model.
    pub fn binding(
        model: &'static str,
        member: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        InvokeError::Binding {
            model,
            member: member.into(),
            source: source.into(),
        }
    }

    /// Returns true if this error came from the handler.
    pub fn is_handler_error(&self) -> bool {
        matches!(self, InvokeError::Handler(_))
    }

    /// Process-style exit code for this error.
    ///
    /// Parse errors use clap's own code, which is 0 for help and version
    /// display. Everything else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            InvokeError::Parse(err) => err.exit_code(),
            _ => 1,
        }
    }
}
