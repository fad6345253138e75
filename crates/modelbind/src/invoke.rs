//! The invocation pipeline.
//!
//! One invocation runs in four steps:
//!
//! 1. **Parse**: the raw tokens go through the configured `clap::Command`.
//! 2. **Build**: from the root down to the matched leaf, each level's model
//!    is created, its values bound, its post-bind hook run, and the instance
//!    registered in the [`ServiceChain`] before the next level is built.
//! 3. **Dispatch**: the leaf's handler runs with resolved parameters. An
//!    async handler is awaited to completion.
//! 4. **Link**: the chain is released and instances are assigned bottom-up
//!    onto their parents' command slots, yielding the bound root model.
//!
//! Any failure aborts the invocation. Nothing is retried.

use std::any::Any;
use std::ffi::OsString;
use std::iter;
use std::rc::Rc;

use clap::{ArgMatches, Command};

use crate::dispatch::{extract_command_path, get_deepest_matches, path_to_string};
use crate::error::InvokeError;
use crate::graph::GraphNode;
use crate::handler::Output;
use crate::root::BinderConfig;
use crate::services::{Resolver, ServiceChain};

/// Facts about the running invocation.
///
/// Registered first in every service chain, so handlers and hooks can take
/// `Rc<InvocationContext>` as a parameter.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Subcommand names of the matched command (empty for the root).
    pub command_path: Vec<String>,
    /// The parse result of the matched command.
    pub matches: ArgMatches,
}

pub(crate) struct Completed {
    pub(crate) model: Box<dyn Any>,
    pub(crate) command_path: Vec<String>,
    pub(crate) output: Output,
}

/// Runs the token engine over `tokens` (program name excluded).
pub(crate) fn parse<I, T>(command: &Command, tokens: I) -> Result<ArgMatches, InvokeError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv = iter::once(OsString::from(command.get_name()))
        .chain(tokens.into_iter().map(Into::into));
    Ok(command.clone().try_get_matches_from(argv)?)
}

/// Pairs each graph level on the matched path with its parse result.
fn matched_levels<'g, 'm>(
    graph: &'g GraphNode,
    matches: &'m ArgMatches,
) -> Result<Vec<(&'g GraphNode, &'m ArgMatches)>, InvokeError> {
    let mut levels = vec![(graph, matches)];
    let (mut node, mut current) = (graph, matches);
    while let Some((name, sub)) = current.subcommand() {
        node = node.child(name).ok_or_else(|| {
            InvokeError::binding(
                node.model_name(),
                name,
                anyhow::anyhow!("matched subcommand `{}` has no graph node", name),
            )
        })?;
        current = sub;
        levels.push((node, current));
    }
    Ok(levels)
}

pub(crate) async fn invoke(
    graph: &GraphNode,
    config: &Rc<BinderConfig>,
    matches: ArgMatches,
) -> Result<Completed, InvokeError> {
    let command_path = extract_command_path(&matches);
    let leaf_matches = get_deepest_matches(&matches);
    let levels = matched_levels(graph, &matches)?;
    tracing::debug!(path = %path_to_string(&command_path), levels = levels.len(), "invoking");

    let mut chain = ServiceChain::new();
    chain.register(Rc::new(InvocationContext {
        command_path: command_path.clone(),
        matches: leaf_matches.clone(),
    }));
    chain.register(config.clone());

    let external = config.services();
    let strict = config.fail_on_unresolved_services;

    let mut instances: Vec<Rc<dyn Any>> = Vec::with_capacity(levels.len());
    for (node, level_matches) in &levels {
        let mut instance = node.build_instance(level_matches, leaf_matches)?;
        if let Some(hook) = node.after_bind() {
            let resolver = Resolver::new(external, &chain, strict);
            hook.call(instance.as_mut(), &resolver)?;
        }
        let instance: Rc<dyn Any> = Rc::from(instance);
        let ops = node.ops();
        chain.register_erased(ops.type_id, ops.type_name, instance.clone());
        instances.push(instance);
    }

    let (leaf, _) = levels[levels.len() - 1];
    let output = match (leaf.handler(), instances.last()) {
        (Some(handler), Some(instance)) => {
            let pending = {
                let resolver = Resolver::new(external, &chain, strict);
                handler.call(instance.clone(), &resolver)
            };
            pending.await?
        }
        _ if config.fail_on_missing_invoke => {
            let path = iter::once(graph.name().to_string())
                .chain(command_path.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ");
            return Err(InvokeError::MissingHandler { path });
        }
        _ => {
            tracing::debug!(command = leaf.name(), "no handler, finishing silently");
            Output::Silent
        }
    };
    drop(chain);

    let mut linked: Option<(String, Box<dyn Any>)> = None;
    for ((node, _), instance) in levels.iter().zip(instances).rev() {
        let mut owned = node.into_owned(instance)?;
        if let Some((child_name, child)) = linked.take() {
            node.link_child(owned.as_mut(), &child_name, child)?;
        }
        linked = Some((node.name().to_string(), owned));
    }

    let (_, model) = linked.ok_or_else(|| {
        InvokeError::binding(
            graph.model_name(),
            graph.name(),
            anyhow::anyhow!("no instance was built"),
        )
    })?;

    Ok(Completed {
        model,
        command_path,
        output,
    })
}
