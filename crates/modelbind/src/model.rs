//! Model declarations.
//!
//! A model is a plain data type. It describes its command-line surface by
//! implementing [`Model::declare`], which returns a [`ModelSpec`]: an ordered
//! list of members plus optional handler, post-bind hook, and companion
//! functions.
//!
//! ```rust
//! use modelbind::{Model, ModelSpec};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Greet {
//!     loud: bool,
//!     name: String,
//! }
//!
//! impl Model for Greet {
//!     fn declare() -> ModelSpec<Self> {
//!         ModelSpec::new()
//!             .about("Say hello")
//!             .option("loud", |m: &mut Self, v| m.loud = v)
//!             .argument_with("name", |m: &mut Self, v| m.name = v, |a| a.help("Who to greet"))
//!             .default_value("name", || "world".to_string())
//!             .invoke(|greet: std::rc::Rc<Self>, (): ()| {
//!                 Ok::<_, anyhow::Error>(format!("hello {}", greet.name))
//!             })
//!     }
//! }
//! ```
//!
//! # Companion functions
//!
//! A value member may have a custom parser (raw tokens to the member type)
//! and a default-value factory. They are registered either on the member
//! itself (`parse_with`, `default_with`) or in the model's companion table
//! by member name (`parser`, `default_value`). A table entry is used only
//! if its return type is exactly the member's declared type; otherwise it is
//! ignored with a warning and the built-in conversion applies.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use clap::parser::ValueSource;
use clap::ArgMatches;

use crate::descriptor::{Arity, CommandDescriptor, PathConstraint, ValueDescriptor};
use crate::error::{ConfigError, InvokeError};
use crate::graph::{self, Assembled, Scope};
use crate::handler::{ErasedHandler, ErasedHook, IntoHandlerResult};
use crate::node::ParserNode;
use crate::services::Inject;
use crate::value::{ArgValue, ValueShape};

/// A data type that can be bound from the command line.
pub trait Model: Default + Clone + 'static {
    /// Declares the members, handler and hooks of this model.
    fn declare() -> ModelSpec<Self>;
}

pub(crate) type ParserFn<T> = Rc<dyn Fn(&[String]) -> anyhow::Result<T>>;
pub(crate) type DefaultFn<T> = Rc<dyn Fn() -> T>;

/// Binds one value member onto an erased instance.
pub(crate) type BindFn = dyn Fn(&mut dyn Any, &ArgMatches) -> Result<(), InvokeError>;

/// Assigns a built child instance onto its parent's slot.
pub(crate) type AssignFn = dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<(), InvokeError>;

struct Companion {
    func: Box<dyn Any>,
    returns: &'static str,
}

/// Companion functions registered by member name.
#[derive(Default)]
pub(crate) struct Companions {
    parsers: HashMap<String, Companion>,
    defaults: HashMap<String, Companion>,
}

impl Companions {
    fn take_parser<T: 'static>(&mut self, model: &'static str, member: &str) -> Option<ParserFn<T>> {
        let companion = self.parsers.remove(member)?;
        take_typed(model, member, "parser", companion)
    }

    fn take_default<T: 'static>(
        &mut self,
        model: &'static str,
        member: &str,
    ) -> Option<DefaultFn<T>> {
        let companion = self.defaults.remove(member)?;
        take_typed(model, member, "default", companion)
    }

    /// Members that have companions but were never claimed.
    pub(crate) fn unclaimed(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().chain(self.defaults.keys()).map(String::as_str)
    }
}

fn take_typed<F: 'static>(
    model: &'static str,
    member: &str,
    role: &'static str,
    companion: Companion,
) -> Option<F> {
    match companion.func.downcast::<F>() {
        Ok(func) => Some(*func),
        Err(_) => {
            tracing::warn!(
                model,
                member,
                role,
                returns = companion.returns,
                "companion return type does not match the member, ignoring it"
            );
            None
        }
    }
}

pub(crate) enum Member<M> {
    Value(Box<dyn ValueMember<M>>),
    Command(Box<dyn CommandMember<M>>),
}

impl<M> Member<M> {
    pub(crate) fn member_name(&self) -> &str {
        match self {
            Member::Value(value) => &value.descriptor().member,
            Member::Command(command) => &command.descriptor().member,
        }
    }
}

/// The declaration of a model: members in order, companions, handler, hook.
pub struct ModelSpec<M: Model> {
    pub(crate) name: Option<String>,
    pub(crate) about: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) hidden: bool,
    pub(crate) members: Vec<Member<M>>,
    pub(crate) companions: Companions,
    pub(crate) handler: Option<ErasedHandler>,
    pub(crate) after_bind: Option<ErasedHook>,
}

impl<M: Model> Default for ModelSpec<M> {
    fn default() -> Self {
        Self {
            name: None,
            about: None,
            aliases: Vec::new(),
            hidden: false,
            members: Vec::new(),
            companions: Companions::default(),
            handler: None,
            after_bind: None,
        }
    }
}

impl<M: Model> ModelSpec<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command name. Only used for the root; subcommands are named
    /// by their command member.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the command description.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Adds an alias used when this model is mounted as a subcommand.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Hides the command from help output.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Declares a named option.
    pub fn option<T, S>(self, member: &str, set: S) -> Self
    where
        T: ArgValue,
        S: Fn(&mut M, T) + 'static,
    {
        self.option_with(member, set, |o| o)
    }

    /// Declares a named option and configures it.
    pub fn option_with<T, S, C>(mut self, member: &str, set: S, configure: C) -> Self
    where
        T: ArgValue,
        S: Fn(&mut M, T) + 'static,
        C: FnOnce(ValueSpec<M, T>) -> ValueSpec<M, T>,
    {
        let spec = configure(ValueSpec::new(ValueDescriptor::option(member), set));
        self.members.push(Member::Value(Box::new(spec)));
        self
    }

    /// Declares a positional argument.
    pub fn argument<T, S>(self, member: &str, set: S) -> Self
    where
        T: ArgValue,
        S: Fn(&mut M, T) + 'static,
    {
        self.argument_with(member, set, |a| a)
    }

    /// Declares a positional argument and configures it.
    pub fn argument_with<T, S, C>(mut self, member: &str, set: S, configure: C) -> Self
    where
        T: ArgValue,
        S: Fn(&mut M, T) + 'static,
        C: FnOnce(ValueSpec<M, T>) -> ValueSpec<M, T>,
    {
        let spec = configure(ValueSpec::new(ValueDescriptor::argument(member), set));
        self.members.push(Member::Value(Box::new(spec)));
        self
    }

    /// Declares a nested model mounted as a subcommand.
    pub fn command<C, S>(self, member: &str, set: S) -> Self
    where
        C: Model,
        S: Fn(&mut M, C) + 'static,
    {
        self.command_with(member, set, |c| c)
    }

    /// Declares a nested model and configures its command metadata.
    pub fn command_with<C, S, F>(mut self, member: &str, set: S, configure: F) -> Self
    where
        C: Model,
        S: Fn(&mut M, C) + 'static,
        F: FnOnce(CommandSpec<M, C>) -> CommandSpec<M, C>,
    {
        let spec = configure(CommandSpec {
            descriptor: CommandDescriptor::new(member),
            set: Rc::new(set),
        });
        self.members.push(Member::Command(Box::new(spec)));
        self
    }

    /// Registers a custom parser for a value member.
    pub fn parser<T, F>(mut self, member: &str, parse: F) -> Self
    where
        T: 'static,
        F: Fn(&[String]) -> anyhow::Result<T> + 'static,
    {
        let func: ParserFn<T> = Rc::new(parse);
        self.companions.parsers.insert(
            member.to_string(),
            Companion {
                func: Box::new(func),
                returns: type_name::<T>(),
            },
        );
        self
    }

    /// Registers a default-value factory for a value member.
    pub fn default_value<T, F>(mut self, member: &str, make: F) -> Self
    where
        T: 'static,
        F: Fn() -> T + 'static,
    {
        let func: DefaultFn<T> = Rc::new(make);
        self.companions.defaults.insert(
            member.to_string(),
            Companion {
                func: Box::new(func),
                returns: type_name::<T>(),
            },
        );
        self
    }

    /// Registers a synchronous handler.
    pub fn invoke<A, F, R>(mut self, handler: F) -> Self
    where
        A: Inject,
        F: Fn(Rc<M>, A) -> R + 'static,
        R: IntoHandlerResult,
    {
        self.handler = Some(ErasedHandler::sync(handler));
        self
    }

    /// Registers an asynchronous handler.
    pub fn invoke_async<A, F, Fut, R>(mut self, handler: F) -> Self
    where
        A: Inject,
        F: Fn(Rc<M>, A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: IntoHandlerResult,
    {
        self.handler = Some(ErasedHandler::asynchronous(handler));
        self
    }

    /// Registers a hook run on the instance right after its values are bound.
    pub fn after_bind<A, F>(mut self, hook: F) -> Self
    where
        A: Inject,
        F: Fn(&mut M, A) -> anyhow::Result<()> + 'static,
    {
        self.after_bind = Some(ErasedHook::new(hook));
        self
    }
}

/// Erased view of a value member.
pub(crate) trait ValueMember<M> {
    fn descriptor(&self) -> &ValueDescriptor;
    fn shape(&self) -> ValueShape;
    /// Claims matching companions from the model's table.
    fn adopt_companions(&mut self, model: &'static str, companions: &mut Companions);
    fn has_parser(&self) -> bool;
    fn has_default(&self) -> bool;
    fn binder(&self, node: &ParserNode) -> Box<BindFn>;
}

/// Builder for a value member.
pub struct ValueSpec<M, T> {
    descriptor: ValueDescriptor,
    set: Rc<dyn Fn(&mut M, T)>,
    parse: Option<ParserFn<T>>,
    default: Option<DefaultFn<T>>,
}

impl<M: Model, T: ArgValue> ValueSpec<M, T> {
    fn new(descriptor: ValueDescriptor, set: impl Fn(&mut M, T) + 'static) -> Self {
        Self {
            descriptor,
            set: Rc::new(set),
            parse: None,
            default: None,
        }
    }

    /// Explicit display name (options may include leading dashes).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = Some(name.into());
        self
    }

    /// Adds an alias: `-x` becomes a short flag, anything else a long alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.descriptor.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = Some(description.into());
        self
    }

    /// Placeholder for the value in usage text.
    pub fn value_name(mut self, value_name: impl Into<String>) -> Self {
        self.descriptor.value_name = Some(value_name.into());
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.descriptor.arity = Some(arity);
        self
    }

    pub fn min_values(mut self, min: usize) -> Self {
        self.descriptor.min_values = Some(min);
        self
    }

    pub fn max_values(mut self, max: usize) -> Self {
        self.descriptor.max_values = Some(max);
        self
    }

    /// Makes the option visible and bindable at every descendant command.
    pub fn global(mut self) -> Self {
        self.descriptor.global = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.descriptor.hidden = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.descriptor.required = true;
        self
    }

    /// Lets one occurrence of the option carry several values.
    pub fn multiple_per_token(mut self) -> Self {
        self.descriptor.multiple_per_token = true;
        self
    }

    pub fn constraint(mut self, constraint: PathConstraint) -> Self {
        self.descriptor.constraints.push(constraint);
        self
    }

    /// Converts the raw tokens with `parse` instead of the built-in conversion.
    pub fn parse_with<F>(mut self, parse: F) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<T> + 'static,
    {
        self.parse = Some(Rc::new(parse));
        self
    }

    /// Supplies the value with `make` when nothing is given on the command line.
    pub fn default_with<F>(mut self, make: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        self.default = Some(Rc::new(make));
        self
    }
}

impl<M: Model, T: ArgValue> ValueMember<M> for ValueSpec<M, T> {
    fn descriptor(&self) -> &ValueDescriptor {
        &self.descriptor
    }

    fn shape(&self) -> ValueShape {
        T::SHAPE
    }

    fn adopt_companions(&mut self, model: &'static str, companions: &mut Companions) {
        let member = self.descriptor.member.as_str();
        if let Some(parse) = companions.take_parser::<T>(model, member) {
            self.parse.get_or_insert(parse);
        }
        if let Some(make) = companions.take_default::<T>(model, member) {
            self.default.get_or_insert(make);
        }
    }

    fn has_parser(&self) -> bool {
        self.parse.is_some()
    }

    fn has_default(&self) -> bool {
        self.default.is_some()
    }

    fn binder(&self, node: &ParserNode) -> Box<BindFn> {
        let model = type_name::<M>();
        let member = self.descriptor.member.clone();
        let id = node.id().to_string();
        let total = node.total_bounds();
        let set = self.set.clone();
        let parse = self.parse.clone();
        let default = self.default.clone();

        Box::new(move |target: &mut dyn Any, matches: &ArgMatches| {
            let fail = |source: anyhow::Error| InvokeError::binding(model, member.as_str(), source);
            let target = target
                .downcast_mut::<M>()
                .ok_or_else(|| fail(anyhow::anyhow!("instance is not a {}", model)))?;

            if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                if let Some(make) = &default {
                    tracing::trace!(model, member = %member, "using default factory");
                    set(target, make());
                }
                return Ok(());
            }

            if let Some(bounds) = total {
                let given = matches.get_raw(&id).map_or(0, |raw| raw.len());
                if given < bounds.min {
                    return Err(fail(anyhow::anyhow!(
                        "expected at least {} values, got {}",
                        bounds.min,
                        given
                    )));
                }
                if let Some(max) = bounds.max.filter(|&max| given > max) {
                    return Err(fail(anyhow::anyhow!(
                        "expected at most {} values, got {}",
                        max,
                        given
                    )));
                }
            }

            let value = match &parse {
                Some(parse) => {
                    let tokens: Vec<String> = matches
                        .try_get_many::<String>(&id)
                        .map_err(|e| fail(e.into()))?
                        .map(|values| values.cloned().collect())
                        .unwrap_or_default();
                    Some(parse(&tokens).map_err(fail)?)
                }
                None => T::from_matches(matches, &id).map_err(|e| fail(e.into()))?,
            };
            if let Some(value) = value {
                set(target, value);
            }
            Ok(())
        })
    }
}

/// Erased view of a command member.
pub(crate) trait CommandMember<M> {
    fn descriptor(&self) -> &CommandDescriptor;
    fn child_type(&self) -> TypeId;
    fn child_type_name(&self) -> &'static str;
    fn assemble(&self, name: String, scope: &mut Scope) -> Result<Assembled, ConfigError>;
    fn assigner(&self) -> Box<AssignFn>;
}

/// Builder for a command member.
pub struct CommandSpec<M, C> {
    descriptor: CommandDescriptor,
    set: Rc<dyn Fn(&mut M, C)>,
}

impl<M: Model, C: Model> CommandSpec<M, C> {
    /// Explicit command name; derived from the member when absent.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = Some(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.descriptor.aliases.push(alias.into());
        self
    }

    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = Some(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.descriptor.hidden = true;
        self
    }
}

impl<M: Model, C: Model> CommandMember<M> for CommandSpec<M, C> {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn child_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn child_type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn assemble(&self, name: String, scope: &mut Scope) -> Result<Assembled, ConfigError> {
        graph::assemble::<C>(Some(name), scope)
    }

    fn assigner(&self) -> Box<AssignFn> {
        let set = self.set.clone();
        let member = self.descriptor.member.clone();
        Box::new(move |target: &mut dyn Any, child: Box<dyn Any>| {
            let target = target.downcast_mut::<M>().ok_or_else(|| {
                InvokeError::binding(
                    type_name::<M>(),
                    member.as_str(),
                    anyhow::anyhow!("instance is not a {}", type_name::<M>()),
                )
            })?;
            let child = child.downcast::<C>().map_err(|_| {
                InvokeError::binding(
                    type_name::<M>(),
                    member.as_str(),
                    anyhow::anyhow!("child is not a {}", type_name::<C>()),
                )
            })?;
            set(target, *child);
            Ok(())
        })
    }
}
