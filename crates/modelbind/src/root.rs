//! The embedder-facing entry point.
//!
//! [`RootCommand`] assembles the command graph for a root model once, and
//! then runs any number of invocations against it.
//!
//! ```rust
//! use modelbind::{Model, ModelSpec, RootCommand};
//! use std::rc::Rc;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Hello {
//!     name: String,
//! }
//!
//! impl Model for Hello {
//!     fn declare() -> ModelSpec<Self> {
//!         ModelSpec::new()
//!             .name("hello")
//!             .argument("name", |m: &mut Self, v| m.name = v)
//!             .invoke(|m: Rc<Self>, (): ()| Ok::<_, anyhow::Error>(format!("hi {}", m.name)))
//!     }
//! }
//!
//! let root = RootCommand::<Hello>::build()?;
//! let done = root.invoke(["ada"])?;
//! assert_eq!(done.model.name, "ada");
//! assert_eq!(done.output.value(), Some(&serde_json::json!("hi ada")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::ffi::OsString;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use clap::{ArgMatches, Command};

use crate::error::{ConfigError, InvokeError};
use crate::graph::{self, Assembled, GraphNode};
use crate::handler::Output;
use crate::invoke;
use crate::model::Model;
use crate::services::ServiceSource;

/// Invocation policy, shared by every invocation of a [`RootCommand`].
///
/// Registered in each service chain, so handlers can take
/// `Rc<BinderConfig>` as a parameter.
#[derive(Clone, Default)]
pub struct BinderConfig {
    /// Fail with [`InvokeError::MissingHandler`] when the matched command has
    /// no handler, instead of finishing silently.
    pub fail_on_missing_invoke: bool,
    /// Fail with [`InvokeError::UnresolvedDependency`] when an optional
    /// (`Option<Rc<T>>`) handler or hook parameter cannot be resolved.
    /// `Rc<T>` parameters always fail when unresolved, regardless of this switch.
    pub fail_on_unresolved_services: bool,
    services: Option<Rc<dyn ServiceSource>>,
}

impl BinderConfig {
    /// The external service source, consulted before the service chain.
    pub fn services(&self) -> Option<&dyn ServiceSource> {
        self.services.as_deref()
    }
}

impl fmt::Debug for BinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderConfig")
            .field("fail_on_missing_invoke", &self.fail_on_missing_invoke)
            .field("fail_on_unresolved_services", &self.fail_on_unresolved_services)
            .field("services", &self.services.is_some())
            .finish()
    }
}

/// The outcome of a successful invocation.
#[derive(Debug)]
pub struct Invocation<M> {
    /// The fully bound root model, with every matched subcommand linked in.
    pub model: M,
    /// Subcommand names of the matched command.
    pub command_path: Vec<String>,
    /// What the handler produced.
    pub output: Output,
}

/// An assembled command graph for the root model `M`.
pub struct RootCommand<M: Model> {
    command: Command,
    graph: GraphNode,
    config: Rc<BinderConfig>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> RootCommand<M> {
    /// Assembles the graph with the default configuration.
    pub fn build() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn builder() -> RootCommandBuilder<M> {
        RootCommandBuilder::new()
    }

    /// The configured token-engine command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The root of the assembled graph.
    pub fn graph(&self) -> &GraphNode {
        &self.graph
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Parses `tokens` (program name excluded) without binding anything.
    pub fn parse<I, T>(&self, tokens: I) -> Result<ArgMatches, InvokeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        invoke::parse(&self.command, tokens)
    }

    /// Runs one invocation, blocking on an async handler.
    pub fn invoke<I, T>(&self, tokens: I) -> Result<Invocation<M>, InvokeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        futures::executor::block_on(self.invoke_async(tokens))
    }

    /// Runs one invocation inside the caller's executor.
    pub async fn invoke_async<I, T>(&self, tokens: I) -> Result<Invocation<M>, InvokeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = self.parse(tokens)?;
        let completed = invoke::invoke(&self.graph, &self.config, matches).await?;
        let model = completed.model.downcast::<M>().map_err(|_| {
            InvokeError::binding(
                self.graph.model_name(),
                self.graph.name(),
                anyhow::anyhow!("root instance is not a {}", self.graph.model_name()),
            )
        })?;
        Ok(Invocation {
            model: *model,
            command_path: completed.command_path,
            output: completed.output,
        })
    }

    /// Runs one invocation and maps the outcome to a process exit code.
    ///
    /// Parse errors, help and version output go through clap; other errors
    /// are printed to stderr. Handler output is not printed.
    pub fn run<I, T>(&self, tokens: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        report(self.invoke(tokens))
    }

    /// Like [`run`](Self::run), taking the tokens from the process arguments.
    pub fn run_env(&self) -> i32 {
        self.run(std::env::args_os().skip(1))
    }
}

fn report<M>(result: Result<Invocation<M>, InvokeError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(InvokeError::Parse(err)) => {
            let code = err.exit_code();
            if let Err(io) = err.print() {
                tracing::error!(error = %io, "failed to print parse error");
            }
            code
        }
        Err(err) => {
            eprintln!("error: {:#}", anyhow::Error::from(err));
            1
        }
    }
}

impl<M: Model> fmt::Debug for RootCommand<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootCommand")
            .field("graph", &self.graph)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`RootCommand`].
pub struct RootCommandBuilder<M: Model> {
    config: BinderConfig,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> RootCommandBuilder<M> {
    pub fn new() -> Self {
        Self {
            config: BinderConfig::default(),
            _model: PhantomData,
        }
    }

    /// Fail when the matched command has no handler.
    pub fn fail_on_missing_invoke(mut self, fail: bool) -> Self {
        self.config.fail_on_missing_invoke = fail;
        self
    }

    /// Fail when an `Option<Rc<T>>` handler or hook parameter cannot be
    /// resolved, instead of passing `None`. `Rc<T>` parameters are always
    /// required.
    pub fn fail_on_unresolved_services(mut self, fail: bool) -> Self {
        self.config.fail_on_unresolved_services = fail;
        self
    }

    /// Sets the external service source, consulted before the service chain.
    pub fn services(mut self, services: impl ServiceSource + 'static) -> Self {
        self.config.services = Some(Rc::new(services));
        self
    }

    /// Assembles the command graph.
    pub fn build(self) -> Result<RootCommand<M>, ConfigError> {
        let Assembled { command, node } = graph::assemble_root::<M>()?;
        tracing::debug!(
            root = node.name(),
            model = node.model_name(),
            commands = count_commands(&node),
            "assembled command graph"
        );
        Ok(RootCommand {
            command,
            graph: node,
            config: Rc::new(self.config),
            _model: PhantomData,
        })
    }
}

impl<M: Model> Default for RootCommandBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn count_commands(node: &GraphNode) -> usize {
    1 + node.children().iter().map(count_commands).sum::<usize>()
}
