//! Command graph assembly.
//!
//! [`assemble`] walks a model's declaration and produces two parallel trees:
//! a configured [`clap::Command`] for the token engine, and a [`GraphNode`]
//! holding everything needed to rebuild model instances from the parse
//! result.
//!
//! Value members are processed first so the global options of a level are
//! known before its subcommands are assembled. Binders are still kept in
//! declaration order.
//!
//! Assembly fails with a [`ConfigError`] on:
//!
//! - two members of one model with the same identifier
//! - two arguments of one command with the same id, long name, alias or
//!   short flag, including global options inherited from ancestors and the
//!   built-in `--help`
//! - two subcommands with the same name or alias
//! - a model nested inside itself
//! - a positional taking a variable number of values followed by another
//!   positional
//! - a required positional following one that is not required

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use clap::{ArgMatches, Command};

use crate::descriptor::MemberKind;
use crate::dispatch::string_to_path;
use crate::error::{ConfigError, InvokeError};
use crate::handler::{ErasedHandler, ErasedHook};
use crate::model::{AssignFn, BindFn, Member, Model, ModelSpec};
use crate::naming;
use crate::node::ParserNode;

/// Type-level operations for the model bound at one node.
#[derive(Clone, Copy)]
pub(crate) struct ModelOps {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    create: fn() -> Box<dyn Any>,
    into_owned: fn(Rc<dyn Any>) -> Result<Box<dyn Any>, InvokeError>,
}

impl ModelOps {
    fn of<M: Model>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            create: create::<M>,
            into_owned: into_owned::<M>,
        }
    }
}

fn create<M: Model>() -> Box<dyn Any> {
    Box::new(M::default())
}

/// Takes the instance back out of the service chain, cloning it only if a
/// handler kept a reference.
fn into_owned<M: Model>(instance: Rc<dyn Any>) -> Result<Box<dyn Any>, InvokeError> {
    let instance = instance.downcast::<M>().map_err(|_| {
        InvokeError::binding(
            type_name::<M>(),
            "self",
            anyhow::anyhow!("instance is not a {}", type_name::<M>()),
        )
    })?;
    Ok(Box::new(Rc::unwrap_or_clone(instance)))
}

pub(crate) enum Binder {
    Value { global: bool, bind: Box<BindFn> },
    Command { child: String, assign: Box<AssignFn> },
}

/// One command of the assembled graph.
pub struct GraphNode {
    name: String,
    path: Vec<String>,
    aliases: Vec<String>,
    about: Option<String>,
    ops: ModelOps,
    parser_nodes: Vec<ParserNode>,
    children: Vec<GraphNode>,
    binders: Vec<Binder>,
    handler: Option<ErasedHandler>,
    after_bind: Option<ErasedHook>,
}

impl GraphNode {
    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subcommand names from the root down to this node (empty for the root).
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Aliases declared by the model itself.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// The Rust type name of the model bound at this node.
    pub fn model_name(&self) -> &'static str {
        self.ops.type_name
    }

    pub fn model_type(&self) -> TypeId {
        self.ops.type_id
    }

    /// Parser-nodes in declaration order, excluding inherited globals.
    pub fn parser_nodes(&self) -> &[ParserNode] {
        &self.parser_nodes
    }

    /// Looks up a parser-node by id.
    pub fn parser_node(&self, id: &str) -> Option<&ParserNode> {
        self.parser_nodes.iter().find(|node| node.id() == id)
    }

    pub fn children(&self) -> &[GraphNode] {
        &self.children
    }

    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&GraphNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Walks down the graph following subcommand names.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&GraphNode> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    /// Walks down the graph following a dot-separated path, e.g. `tool.update`.
    pub fn find_path(&self, path: &str) -> Option<&GraphNode> {
        self.find(&string_to_path(path))
    }

    /// Number of binders, one per value or command member.
    pub fn binder_count(&self) -> usize {
        self.binders.len()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn is_async_handler(&self) -> bool {
        self.handler.as_ref().is_some_and(ErasedHandler::is_async)
    }

    pub fn has_after_bind(&self) -> bool {
        self.after_bind.is_some()
    }

    pub(crate) fn ops(&self) -> ModelOps {
        self.ops
    }

    pub(crate) fn handler(&self) -> Option<&ErasedHandler> {
        self.handler.as_ref()
    }

    pub(crate) fn after_bind(&self) -> Option<&ErasedHook> {
        self.after_bind.as_ref()
    }

    /// Creates a fresh instance and applies the value binders in order.
    ///
    /// Global options are read from the leaf's matches, where clap has
    /// propagated them.
    pub(crate) fn build_instance(
        &self,
        level: &ArgMatches,
        leaf: &ArgMatches,
    ) -> Result<Box<dyn Any>, InvokeError> {
        let mut instance = (self.ops.create)();
        for binder in &self.binders {
            if let Binder::Value { global, bind } = binder {
                let matches = if *global { leaf } else { level };
                bind(instance.as_mut(), matches)?;
            }
        }
        Ok(instance)
    }

    /// Converts a shared instance back into an owned one.
    pub(crate) fn into_owned(&self, instance: Rc<dyn Any>) -> Result<Box<dyn Any>, InvokeError> {
        (self.ops.into_owned)(instance)
    }

    /// Assigns a built child onto the parent's command slot.
    pub(crate) fn link_child(
        &self,
        parent: &mut dyn Any,
        child_name: &str,
        child: Box<dyn Any>,
    ) -> Result<(), InvokeError> {
        let assign = self.binders.iter().find_map(|binder| match binder {
            Binder::Command { child: name, assign } if name == child_name => Some(assign),
            _ => None,
        });
        match assign {
            Some(assign) => assign(parent, child),
            None => Err(InvokeError::binding(
                self.ops.type_name,
                child_name,
                anyhow::anyhow!("no command member named `{}`", child_name),
            )),
        }
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("name", &self.name)
            .field("model", &self.ops.type_name)
            .field(
                "parser_nodes",
                &self.parser_nodes.iter().map(ParserNode::id).collect::<Vec<_>>(),
            )
            .field("children", &self.children)
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Assembly state threaded through the recursion.
#[derive(Default)]
pub(crate) struct Scope {
    /// Command names from the root down to the level being assembled.
    names: Vec<String>,
    /// Model types of the enclosing levels.
    ancestors: Vec<TypeId>,
    /// Names claimed by global options of the enclosing levels.
    globals: Vec<String>,
}

impl Scope {
    fn label(&self) -> String {
        self.names.join(" ")
    }
}

#[derive(Debug)]
pub(crate) struct Assembled {
    pub(crate) command: Command,
    pub(crate) node: GraphNode,
}

/// Tracks names already used within one command.
struct NameSet {
    command: String,
    taken: HashSet<String>,
}

impl NameSet {
    fn new<'a>(command: String, reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            command,
            taken: reserved.into_iter().map(String::from).collect(),
        }
    }

    fn claim(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.taken.insert(name.to_string()) {
            Ok(())
        } else {
            Err(ConfigError::DuplicateName {
                command: self.command.clone(),
                name: name.to_string(),
            })
        }
    }
}

/// Every name the node occupies in its command: the clap id plus, for
/// options, each spelling that can appear on the command line.
fn claimed_names(node: &ParserNode) -> Vec<String> {
    let mut names = vec![node.id().to_string()];
    if node.kind() == MemberKind::Option {
        let arg = node.arg();
        names.extend(arg.get_long().map(|long| format!("--{}", long)));
        names.extend(
            arg.get_all_aliases()
                .unwrap_or_default()
                .into_iter()
                .map(|alias| format!("--{}", alias)),
        );
        names.extend(arg.get_short().map(|short| format!("-{}", short)));
        names.extend(
            arg.get_all_short_aliases()
                .unwrap_or_default()
                .into_iter()
                .map(|short| format!("-{}", short)),
        );
    }
    names
}

/// Name used for the root when the model declares none: the executable's
/// file stem.
pub(crate) fn default_root_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "app".to_string())
}

/// Assembles the graph for model `M`.
///
/// `name` is the command name chosen by the parent, or `None` for the root.
pub(crate) fn assemble<M: Model>(
    name: Option<String>,
    scope: &mut Scope,
) -> Result<Assembled, ConfigError> {
    let model = type_name::<M>();
    let ModelSpec {
        name: declared_name,
        about,
        aliases,
        hidden,
        mut members,
        mut companions,
        handler,
        after_bind,
    } = M::declare();

    let name = name
        .or(declared_name)
        .unwrap_or_else(default_root_name);
    scope.names.push(name.clone());
    let label = scope.label();
    let path: Vec<String> = scope.names.iter().skip(1).cloned().collect();
    tracing::debug!(model, command = %label, members = members.len(), "assembling command");

    let mut seen = HashSet::new();
    for member in &members {
        if !seen.insert(member.member_name()) {
            return Err(ConfigError::DuplicateMember {
                model,
                member: member.member_name().to_string(),
            });
        }
    }

    let mut command = Command::new(name.clone()).hide(hidden);
    if let Some(about) = &about {
        command = command.about(about.clone());
    }

    let mut arg_names = NameSet::new(
        label.clone(),
        ["help", "--help", "-h"]
            .into_iter()
            .chain(scope.globals.iter().map(String::as_str)),
    );
    let mut parser_nodes = Vec::new();
    let mut level_globals = Vec::new();
    let mut binders: Vec<(usize, Binder)> = Vec::with_capacity(members.len());
    let mut open_ended: Option<String> = None;
    let mut optional_positional: Option<String> = None;

    for (index, member) in members.iter_mut().enumerate() {
        let Member::Value(value) = member else {
            continue;
        };
        value.adopt_companions(model, &mut companions);
        let node = ParserNode::build(
            model,
            value.descriptor(),
            value.shape(),
            value.has_parser(),
            value.has_default(),
        )?;

        let names = claimed_names(&node);
        for claimed in &names {
            arg_names.claim(claimed)?;
        }

        if node.kind() == MemberKind::Argument {
            if let Some(previous) = &open_ended {
                return Err(ConfigError::UnsupportedArity {
                    model,
                    member: node.member().to_string(),
                    reason: format!(
                        "positional follows `{}`, which takes a variable number of values",
                        previous
                    ),
                });
            }
            let required = node.arg().is_required_set();
            if let (true, Some(previous)) = (required, &optional_positional) {
                return Err(ConfigError::UnsupportedArity {
                    model,
                    member: node.member().to_string(),
                    reason: format!(
                        "required positional follows `{}`, which is not required",
                        previous
                    ),
                });
            }
            if !required {
                optional_positional.get_or_insert_with(|| node.member().to_string());
            }
            let arity = node.arity();
            if arity.max != Some(arity.min) {
                open_ended = Some(node.member().to_string());
            }
        }

        if node.is_global() {
            level_globals.extend(names);
        }
        command = command.arg(node.arg().clone());
        binders.push((
            index,
            Binder::Value {
                global: node.is_global(),
                bind: value.binder(&node),
            },
        ));
        parser_nodes.push(node);
    }

    for member in companions.unclaimed() {
        tracing::warn!(model, member, "companion registered for an unknown value member");
    }

    scope.ancestors.push(TypeId::of::<M>());
    let inherited = scope.globals.len();
    scope.globals.extend(level_globals);

    let mut command_names = NameSet::new(label.clone(), ["help"]);
    let mut children = Vec::new();

    for (index, member) in members.iter().enumerate() {
        let Member::Command(nested) = member else {
            continue;
        };
        if scope.ancestors.contains(&nested.child_type()) {
            return Err(ConfigError::CyclicModel {
                model: nested.child_type_name(),
            });
        }

        let descriptor = nested.descriptor();
        let child_name = descriptor
            .name
            .clone()
            .unwrap_or_else(|| naming::kebab(&descriptor.member));
        let Assembled {
            command: mut child_command,
            node: child,
        } = nested.assemble(child_name.clone(), scope)?;

        let child_aliases: Vec<String> = descriptor
            .aliases
            .iter()
            .chain(child.aliases.iter())
            .cloned()
            .collect();
        command_names.claim(&child_name)?;
        for alias in &child_aliases {
            command_names.claim(alias)?;
        }

        child_command = child_command.visible_aliases(child_aliases);
        if let Some(description) = &descriptor.description {
            child_command = child_command.about(description.clone());
        }
        if descriptor.hidden {
            child_command = child_command.hide(true);
        }

        command = command.subcommand(child_command);
        binders.push((
            index,
            Binder::Command {
                child: child_name,
                assign: nested.assigner(),
            },
        ));
        children.push(child);
    }

    scope.globals.truncate(inherited);
    scope.ancestors.pop();
    scope.names.pop();

    binders.sort_by_key(|(index, _)| *index);

    Ok(Assembled {
        command,
        node: GraphNode {
            path,
            name,
            aliases,
            about,
            ops: ModelOps::of::<M>(),
            parser_nodes,
            children,
            binders: binders.into_iter().map(|(_, binder)| binder).collect(),
            handler,
            after_bind,
        },
    })
}

/// Assembles the graph for the root model `M`.
pub(crate) fn assemble_root<M: Model>() -> Result<Assembled, ConfigError> {
    assemble::<M>(None, &mut Scope::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Arity;

    #[derive(Debug, Default, Clone)]
    struct Leaf {
        count: i64,
    }

    impl Model for Leaf {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().option("count", |m: &mut Self, v| m.count = v)
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Root {
        verbose: bool,
        leaf: Option<Leaf>,
    }

    impl Model for Root {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .name("app")
                .command_with("leaf", |m: &mut Self, v| m.leaf = Some(v), |c| c.alias("lf"))
                .option_with("verbose", |m: &mut Self, v| m.verbose = v, |o| o.global())
        }
    }

    #[test]
    fn test_assembles_nodes_and_children() {
        let Assembled { command, node } = assemble_root::<Root>().unwrap();
        assert_eq!(node.name(), "app");
        assert!(node.path().is_empty());
        assert_eq!(node.parser_nodes().len(), 1);
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.binder_count(), 2);
        assert!(node.model_name().ends_with("Root"));

        let leaf = node.child("leaf").unwrap();
        assert_eq!(leaf.path(), ["leaf"]);
        assert_eq!(leaf.parser_node("count").unwrap().display_name(), "--count");
        assert!(node.find(&["leaf"]).is_some());
        assert!(node.find_path("leaf").is_some());
        assert!(node.find_path("missing").is_none());

        let sub = command.find_subcommand("leaf").unwrap();
        assert_eq!(sub.get_all_aliases().collect::<Vec<_>>(), ["lf"]);
    }

    #[test]
    fn test_binders_in_declaration_order() {
        let Assembled { node, .. } = assemble_root::<Root>().unwrap();
        assert!(matches!(node.binders[0], Binder::Command { .. }));
        assert!(matches!(node.binders[1], Binder::Value { global: true, .. }));
    }

    #[test]
    fn test_global_visible_in_descendants() {
        let Assembled { command, .. } = assemble_root::<Root>().unwrap();
        let matches = command
            .try_get_matches_from(["app", "leaf", "--verbose"])
            .unwrap();
        let (_, leaf) = matches.subcommand().unwrap();
        assert!(leaf.get_flag("verbose"));
    }

    #[derive(Debug, Default, Clone)]
    struct Empty;

    impl Model for Empty {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().name("empty")
        }
    }

    #[test]
    fn test_empty_model() {
        let Assembled { node, .. } = assemble_root::<Empty>().unwrap();
        assert_eq!(node.binder_count(), 0);
        assert!(!node.has_handler());
    }

    #[derive(Debug, Default, Clone)]
    struct Twice {
        a: String,
    }

    impl Model for Twice {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .option("a", |m: &mut Self, v| m.a = v)
                .argument("a", |m: &mut Self, v| m.a = v)
        }
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = assemble_root::<Twice>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMember { .. }));
    }

    #[derive(Debug, Default, Clone)]
    struct Clash {
        first: String,
        second: String,
    }

    impl Model for Clash {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .name("clash")
                .option_with("first", |m: &mut Self, v| m.first = v, |o| o.alias("-x"))
                .option_with("second", |m: &mut Self, v| m.second = v, |o| o.alias("-x"))
        }
    }

    #[test]
    fn test_duplicate_short_rejected() {
        match assemble_root::<Clash>().unwrap_err() {
            ConfigError::DuplicateName { command, name } => {
                assert_eq!(command, "clash");
                assert_eq!(name, "-x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Shadow {
        verbose: bool,
    }

    impl Model for Shadow {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().option("verbose", |m: &mut Self, v| m.verbose = v)
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Shadowed;

    impl Model for Shadowed {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .name("app")
                .option_with("verbose", |_: &mut Self, _: bool| {}, |o| o.global())
                .command("inner", |_: &mut Self, _: Shadow| {})
        }
    }

    #[test]
    fn test_inherited_global_collision_rejected() {
        match assemble_root::<Shadowed>().unwrap_err() {
            ConfigError::DuplicateName { command, name } => {
                assert_eq!(command, "app inner");
                assert_eq!(name, "verbose");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Default, Clone)]
    struct HelpOption;

    impl Model for HelpOption {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().option("help", |_: &mut Self, _: bool| {})
        }
    }

    #[test]
    fn test_reserved_help_rejected() {
        let err = assemble_root::<HelpOption>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
    }

    #[derive(Debug, Default, Clone)]
    struct Siblings;

    impl Model for Siblings {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .command("one", |_: &mut Self, _: Leaf| {})
                .command_with("two", |_: &mut Self, _: Leaf| {}, |c| c.name("one"))
        }
    }

    #[test]
    fn test_duplicate_subcommand_rejected() {
        let err = assemble_root::<Siblings>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { name, .. } if name == "one"));
    }

    #[derive(Debug, Default, Clone)]
    struct Looped;

    impl Model for Looped {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().command("again", |_: &mut Self, _: Looped| {})
        }
    }

    #[test]
    fn test_cyclic_model_rejected() {
        let err = assemble_root::<Looped>().unwrap_err();
        assert!(matches!(err, ConfigError::CyclicModel { model } if model.ends_with("Looped")));
    }

    #[derive(Debug, Default, Clone)]
    struct Positionals {
        files: Vec<String>,
        target: String,
    }

    impl Model for Positionals {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .argument("files", |m: &mut Self, v| m.files = v)
                .argument("target", |m: &mut Self, v| m.target = v)
        }
    }

    #[test]
    fn test_variable_positional_must_be_last() {
        let err = assemble_root::<Positionals>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedArity { member, .. } if member == "target"));
    }

    #[derive(Debug, Default, Clone)]
    struct DefaultedFirst {
        name: String,
        target: String,
    }

    impl Model for DefaultedFirst {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .argument("name", |m: &mut Self, v| m.name = v)
                .default_value("name", || "anonymous".to_string())
                .argument("target", |m: &mut Self, v| m.target = v)
        }
    }

    #[derive(Debug, Default, Clone)]
    struct OptionalFirst {
        name: Option<String>,
        target: String,
    }

    impl Model for OptionalFirst {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .argument("name", |m: &mut Self, v| m.name = v)
                .argument("target", |m: &mut Self, v| m.target = v)
        }
    }

    #[derive(Debug, Default, Clone)]
    struct RequiredFirst {
        target: String,
        name: Option<String>,
    }

    impl Model for RequiredFirst {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .argument("target", |m: &mut Self, v| m.target = v)
                .argument("name", |m: &mut Self, v| m.name = v)
        }
    }

    #[test]
    fn test_required_positional_after_optional_rejected() {
        let err = assemble_root::<DefaultedFirst>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedArity { member, .. } if member == "target"));

        let err = assemble_root::<OptionalFirst>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedArity { member, .. } if member == "target"));
    }

    #[test]
    fn test_optional_positional_after_required_accepted() {
        let Assembled { command, node } = assemble_root::<RequiredFirst>().unwrap();
        assert_eq!(node.parser_nodes().len(), 2);
        let matches = command.try_get_matches_from(["app", "here"]).unwrap();
        assert_eq!(
            matches.get_one::<String>("target").map(String::as_str),
            Some("here")
        );
        assert!(matches.get_one::<String>("name").is_none());
    }

    #[derive(Debug, Default, Clone)]
    struct BadArity {
        name: String,
    }

    impl Model for BadArity {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new().argument_with(
                "name",
                |m: &mut Self, v| m.name = v,
                |a| a.arity(Arity::OneOrMore),
            )
        }
    }

    #[test]
    fn test_node_errors_abort_assembly() {
        let err = assemble_root::<BadArity>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedArity { .. }));
    }

    #[derive(Debug, Default, Clone)]
    struct Hooked;

    impl Model for Hooked {
        fn declare() -> ModelSpec<Self> {
            ModelSpec::new()
                .after_bind(|_: &mut Self, (): ()| Ok(()))
                .invoke_async(|_: Rc<Self>, (): ()| async { Ok::<_, anyhow::Error>(()) })
        }
    }

    #[test]
    fn test_handler_and_hook_flags() {
        let Assembled { node, .. } = assemble_root::<Hooked>().unwrap();
        assert!(node.has_handler());
        assert!(node.is_async_handler());
        assert!(node.has_after_bind());
    }
}
