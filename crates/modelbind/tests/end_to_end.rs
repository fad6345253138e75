use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use clap::error::ErrorKind;
use modelbind::{Arity, InvokeError, Model, ModelSpec, Output, RootCommand, Services};
use serde_json::json;

type Vars = BTreeMap<String, String>;

/// Records which handlers ran, in order.
#[derive(Default)]
struct Journal(RefCell<Vec<String>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Completes on the second poll.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Cli {
    global: bool,
    name: String,
    tool: Option<Tool>,
    noop: Option<Noop>,
}

impl Model for Cli {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
            .name("example")
            .about("Model binding example")
            .option_with("global", |m: &mut Self, v| m.global = v, |o| o.global())
            .argument_with(
                "name",
                |m: &mut Self, v| m.name = v,
                |a| a.arity(Arity::ZeroOrMore),
            )
            .parser("name", |tokens: &[String]| {
                Ok(format!("[{}]", tokens.join(":")))
            })
            .default_value("name", || "DefaultFOO".to_string())
            .command("tool", |m: &mut Self, v| m.tool = Some(v))
            .command_with(
                "noop",
                |m: &mut Self, v| m.noop = Some(v),
                |c| c.alias("nil").alias("null"),
            )
    }
}

#[derive(Debug, Default, Clone)]
struct Tool {
    names: Vec<String>,
    places: Vec<String>,
    dry_run: bool,
    update: Option<Update>,
}

impl Model for Tool {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
            .option_with(
                "names",
                |m: &mut Self, v| m.names = v,
                |o| o.multiple_per_token(),
            )
            .option_with(
                "places",
                |m: &mut Self, v| m.places = v,
                |o| o.max_values(2).alias("-p"),
            )
            .option_with("dry_run", |m: &mut Self, v| m.dry_run = v, |o| o.global())
            .command("update", |m: &mut Self, v| m.update = Some(v))
            .invoke(
                |tool: Rc<Self>, (vars, journal): (Rc<Vars>, Rc<Journal>)| {
                    journal.push(format!("tool {}", tool.names.join(",")));
                    Ok::<_, anyhow::Error>(json!({
                        "names": tool.names,
                        "places": tool.places,
                        "vars": vars.len(),
                    }))
                },
            )
    }
}

#[derive(Debug, Default, Clone)]
struct Update {
    verbosity: Option<String>,
}

impl Model for Update {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
            .option_with(
                "verbosity",
                |m: &mut Self, v| m.verbosity = v,
                |o| o.alias("-v"),
            )
            .invoke_async(
                |update: Rc<Self>, (root, tool, journal): (Rc<Cli>, Rc<Tool>, Rc<Journal>)| async move {
                    YieldOnce(false).await;
                    journal.push("update");
                    Ok::<_, anyhow::Error>(json!({
                        "global": root.global,
                        "name": root.name,
                        "dry_run": tool.dry_run,
                        "verbosity": update.verbosity,
                    }))
                },
            )
    }
}

#[derive(Debug, Default, Clone)]
struct Noop;

impl Model for Noop {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
    }
}

fn services(journal: &Rc<Journal>) -> Services {
    let mut services = Services::new();
    services.insert(Vars::from([
        ("var1".to_string(), "Variable #1".to_string()),
        ("var2".to_string(), "Variable #2".to_string()),
    ]));
    services.insert_rc(journal.clone());
    services
}

fn root(journal: &Rc<Journal>) -> RootCommand<Cli> {
    RootCommand::builder()
        .services(services(journal))
        .fail_on_unresolved_services(true)
        .build()
        .unwrap()
}

#[test]
fn test_tool_update_with_trailing_global() {
    let journal = Rc::new(Journal::default());
    let done = root(&journal)
        .invoke(["tool", "update", "--global"])
        .unwrap();

    assert!(done.model.global);
    assert_eq!(done.model.name, "DefaultFOO");
    assert_eq!(done.command_path, ["tool", "update"]);

    let tool = done.model.tool.as_ref().unwrap();
    assert!(tool.update.is_some());
    assert!(done.model.noop.is_none());

    assert_eq!(
        done.output,
        Output::Render(json!({
            "global": true,
            "name": "DefaultFOO",
            "dry_run": false,
            "verbosity": null,
        }))
    );
    assert_eq!(journal.entries(), ["update"]);
}

#[test]
fn test_custom_parser_joins_tokens() {
    let journal = Rc::new(Journal::default());
    let done = root(&journal).invoke(["a", "b"]).unwrap();
    assert_eq!(done.model.name, "[a:b]");
    assert!(done.command_path.is_empty());
    assert!(done.output.is_silent());
}

#[test]
fn test_global_before_subcommand() {
    let journal = Rc::new(Journal::default());
    let done = root(&journal).invoke(["--global", "noop"]).unwrap();
    assert!(done.model.global);
    assert!(done.model.noop.is_some());
}

#[test]
fn test_tool_handler_gets_external_services() {
    let journal = Rc::new(Journal::default());
    let done = root(&journal)
        .invoke(["tool", "--names", "x", "y", "--place", "here"])
        .unwrap();

    assert_eq!(done.command_path, ["tool"]);
    assert_eq!(
        done.output.value(),
        Some(&json!({"names": ["x", "y"], "places": ["here"], "vars": 2}))
    );
    assert_eq!(journal.entries(), ["tool x,y"]);
}

#[test]
fn test_repeated_option_limit() {
    let journal = Rc::new(Journal::default());
    let err = root(&journal)
        .invoke(["tool", "-p", "a", "-p", "b", "-p", "c"])
        .unwrap_err();
    match err {
        InvokeError::Binding { member, .. } => assert_eq!(member, "places"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(journal.entries().is_empty());
}

#[test]
fn test_option_alias_on_leaf() {
    let journal = Rc::new(Journal::default());
    let done = root(&journal)
        .invoke(["tool", "update", "-v", "loud"])
        .unwrap();
    let update = done.model.tool.unwrap().update.unwrap();
    assert_eq!(update.verbosity.as_deref(), Some("loud"));
}

#[test]
fn test_command_aliases() {
    let journal = Rc::new(Journal::default());
    let root = root(&journal);
    for alias in ["noop", "nil", "null"] {
        let done = root.invoke([alias]).unwrap();
        assert_eq!(done.command_path, ["noop"]);
        assert!(done.output.is_silent());
    }
}

#[test]
fn test_missing_handler_strict() {
    let journal = Rc::new(Journal::default());
    let root = RootCommand::<Cli>::builder()
        .services(services(&journal))
        .fail_on_missing_invoke(true)
        .build()
        .unwrap();

    match root.invoke(["nil"]).unwrap_err() {
        InvokeError::MissingHandler { path } => assert_eq!(path, "example noop"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_global_scoped_to_descendants() {
    let journal = Rc::new(Journal::default());
    let root = root(&journal);

    let done = root.invoke(["tool", "update", "--dry-run"]).unwrap();
    assert!(done.model.tool.unwrap().dry_run);

    match root.invoke(["noop", "--dry-run"]).unwrap_err() {
        InvokeError::Parse(err) => assert_eq!(err.kind(), ErrorKind::UnknownArgument),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_failure_runs_nothing() {
    let journal = Rc::new(Journal::default());
    let root = root(&journal);
    let err = root.invoke(["tool", "--bogus"]).unwrap_err();
    assert!(matches!(err, InvokeError::Parse(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(journal.entries().is_empty());
}

#[test]
fn test_help_exits_zero() {
    let journal = Rc::new(Journal::default());
    assert_eq!(root(&journal).run(["--help"]), 0);
}

#[test]
fn test_repeated_invocations_are_independent() {
    let journal = Rc::new(Journal::default());
    let root = root(&journal);

    let first = root.invoke(["--global", "x"]).unwrap();
    let second = root.invoke(["y"]).unwrap();
    assert!(first.model.global);
    assert!(!second.model.global);
    assert_eq!(first.model.name, "[x]");
    assert_eq!(second.model.name, "[y]");
}

#[test]
fn test_graph_mirrors_models() {
    let journal = Rc::new(Journal::default());
    let root = root(&journal);
    let graph = root.graph();

    assert_eq!(graph.name(), "example");
    assert_eq!(graph.parser_nodes().len(), 2);
    assert_eq!(graph.children().len(), 2);

    let tool = graph.child("tool").unwrap();
    let ids: Vec<&str> = tool.parser_nodes().iter().map(|n| n.id()).collect();
    assert_eq!(ids, ["names", "place", "dry-run"]);

    let update = graph.find_path("tool.update").unwrap();
    assert!(update.is_async_handler());
    assert_eq!(update.path(), ["tool", "update"]);

    let noop = graph.find(&["noop"]).unwrap();
    assert!(!noop.has_handler());
    assert_eq!(noop.binder_count(), 0);
}
