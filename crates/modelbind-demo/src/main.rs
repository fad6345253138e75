//! A small CLI built on modelbind.
//!
//! ```text
//! modelbind-demo [--global] [NAME]... <tool|noop>
//! modelbind-demo tool [--names N...] [-p PLACE]... [--dry-run] [update [-v LEVEL]]
//! ```
//!
//! On success the handler output (if any) and the fully bound model are
//! printed as JSON. Set `RUST_LOG=modelbind=debug` to follow assembly and
//! dispatch.

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use modelbind::{Arity, InvokeError, Model, ModelSpec, Output, RootCommand, Services};
use serde::Serialize;
use serde_json::json;

type Vars = BTreeMap<String, String>;

#[derive(Debug, Default, Clone, Serialize)]
struct Cli {
    global: bool,
    name: String,
    tool: Option<Tool>,
    noop: Option<Noop>,
}

impl Model for Cli {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
            .name("modelbind-demo")
            .about("Model binding demo")
            .option_with(
                "global",
                |m: &mut Self, v| m.global = v,
                |o| o.global().help("Visible on every subcommand"),
            )
            .argument_with(
                "name",
                |m: &mut Self, v| m.name = v,
                |a| a.arity(Arity::ZeroOrMore).help("Joined as [a:b:...]"),
            )
            .parser("name", |tokens: &[String]| {
                Ok(format!("[{}]", tokens.join(":")))
            })
            .default_value("name", || "DefaultFOO".to_string())
            .command_with(
                "tool",
                |m: &mut Self, v| m.tool = Some(v),
                |c| c.about("Inspect names and places"),
            )
            .command_with(
                "noop",
                |m: &mut Self, v| m.noop = Some(v),
                |c| c.alias("nil").alias("null").about("Do nothing"),
            )
    }
}

#[derive(Debug, Default, Clone, Serialize)]
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
                |o| o.multiple_per_token().value_name("NAME"),
            )
            .option_with(
                "places",
                |m: &mut Self, v| m.places = v,
                |o| o.max_values(2).alias("-p").value_name("PLACE"),
            )
            .option_with(
                "dry_run",
                |m: &mut Self, v| m.dry_run = v,
                |o| o.global().help("Report without changing anything"),
            )
            .command_with(
                "update",
                |m: &mut Self, v| m.update = Some(v),
                |c| c.about("Pretend to update"),
            )
            .invoke(|tool: Rc<Self>, vars: Rc<Vars>| {
                tracing::info!(names = tool.names.len(), "running tool");
                Ok::<_, anyhow::Error>(json!({
                    "names": tool.names,
                    "places": tool.places,
                    "vars": *vars,
                }))
            })
    }
}

#[derive(Debug, Default, Clone, Serialize)]
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
                |update: Rc<Self>, (root, tool): (Rc<Cli>, Rc<Tool>)| async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    anyhow::ensure!(
                        update.verbosity.as_deref() != Some("fail"),
                        "update refused at verbosity 'fail'"
                    );
                    Ok(json!({
                        "global": root.global,
                        "name": root.name,
                        "dry_run": tool.dry_run,
                        "verbosity": update.verbosity,
                    }))
                },
            )
    }
}

#[derive(Debug, Default, Clone, Serialize)]
struct Noop;

impl Model for Noop {
    fn declare() -> ModelSpec<Self> {
        ModelSpec::new()
    }
}

fn services() -> Services {
    let mut services = Services::new();
    services.insert(Vars::from([
        ("var1".to_string(), "Variable #1".to_string()),
        ("var2".to_string(), "Variable #2".to_string()),
    ]));
    services
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let root = match RootCommand::<Cli>::builder()
        .services(services())
        .fail_on_unresolved_services(true)
        .build()
    {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: invalid command model: {}", err);
            return ExitCode::from(70);
        }
    };

    match root.invoke_async(std::env::args_os().skip(1)).await {
        Ok(done) => {
            tracing::debug!(path = ?done.command_path, "invocation finished");
            let printed = match &done.output {
                Output::Render(value) => print_json(value),
                Output::Silent => Ok(()),
            }
            .and_then(|()| print_json(&done.model));
            match printed {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("error: {:#}", err);
                    ExitCode::FAILURE
                }
            }
        }
        Err(InvokeError::Parse(err)) => {
            let code = err.exit_code();
            if let Err(io) = err.print() {
                tracing::error!(error = %io, "failed to print parse error");
            }
            ExitCode::from(u8::try_from(code).unwrap_or(2))
        }
        Err(err) => {
            eprintln!("error: {:#}", anyhow::Error::from(err));
            ExitCode::FAILURE
        }
    }
}
