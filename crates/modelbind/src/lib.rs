//! Declarative model binding and dispatch for clap-based CLIs.
//!
//! `modelbind` turns a tree of plain data types into a hierarchical command
//! line. Each type implements [`Model`] and declares its options, positional
//! arguments and nested subcommands with a [`ModelSpec`]. From that,
//! [`RootCommand`] assembles a configured `clap::Command` once and then, per
//! invocation:
//!
//! - parses the raw tokens,
//! - rebuilds the model instances from the root down to the matched command,
//! - makes every ancestor instance resolvable as a service,
//! - runs the matched command's handler (sync or async),
//! - links the instances back into one fully bound root model.
//!
//! # Example
//!
//! ```rust
//! use modelbind::{Model, ModelSpec, RootCommand};
//! use std::rc::Rc;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Cli {
//!     verbose: bool,
//!     add: Option<Add>,
//! }
//!
//! #[derive(Debug, Default, Clone)]
//! struct Add {
//!     items: Vec<String>,
//! }
//!
//! impl Model for Cli {
//!     fn declare() -> ModelSpec<Self> {
//!         ModelSpec::new()
//!             .name("todo")
//!             .option_with("verbose", |m: &mut Self, v| m.verbose = v, |o| o.global().alias("-v"))
//!             .command("add", |m: &mut Self, v| m.add = Some(v))
//!     }
//! }
//!
//! impl Model for Add {
//!     fn declare() -> ModelSpec<Self> {
//!         ModelSpec::new()
//!             .argument("items", |m: &mut Self, v| m.items = v)
//!             .invoke(|add: Rc<Self>, cli: Rc<Cli>| {
//!                 Ok::<_, anyhow::Error>(format!("{} items, verbose={}", add.items.len(), cli.verbose))
//!             })
//!     }
//! }
//!
//! let root = RootCommand::<Cli>::build()?;
//! let done = root.invoke(["add", "milk", "eggs", "-v"])?;
//! assert!(done.model.verbose);
//! assert_eq!(done.model.add.unwrap().items, ["milk", "eggs"]);
//! assert_eq!(done.output.value(), Some(&serde_json::json!("2 items, verbose=true")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Services
//!
//! Handler and hook parameters are resolved by type. The external
//! [`ServiceSource`] configured with [`RootCommandBuilder::services`] is
//! consulted first, then the invocation's [`ServiceChain`], which holds the
//! [`InvocationContext`], the [`BinderConfig`], and the instances built so far
//! (most recent first).

mod descriptor;
mod dispatch;
mod error;
mod graph;
mod handler;
mod invoke;
mod model;
mod naming;
mod node;
mod root;
mod services;
mod value;

pub use descriptor::{
    Arity, ArityBounds, CommandDescriptor, MemberKind, PathConstraint, ValueDescriptor,
};

pub use dispatch::{extract_command_path, get_deepest_matches, path_to_string, string_to_path};

pub use error::{ConfigError, InvokeError};

pub use graph::GraphNode;

pub use handler::{HandlerResult, IntoHandlerResult, Output};

pub use invoke::InvocationContext;

pub use model::{CommandSpec, Model, ModelSpec, ValueSpec};

pub use naming::{kebab, option_name, singularize};

pub use node::ParserNode;

pub use root::{BinderConfig, Invocation, RootCommand, RootCommandBuilder};

pub use services::{Inject, Resolver, ServiceChain, ServiceSource, Services};

pub use value::{ArgValue, Scalar, ValueKind, ValueShape};
