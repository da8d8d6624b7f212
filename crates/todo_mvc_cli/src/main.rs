//! CLI demo entry point.
//!
//! # Responsibility
//! - Build two to-do stores, render one into the page and replay the three
//!   declared interactions against it.
//! - Print stores, rendered markup and handler diagnostics to stdout.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use todo_mvc_core::todo::demo_document;
use todo_mvc_core::{
    core_version, default_log_level, init_logging, new_todo, todo_view, AttributeStore,
    AttributeValue, Attributes, Document, Interaction, LoggingConfig,
};

const DEFAULT_TITLE: &str = "Check attributes property of the logged models in the console.";

#[derive(Parser)]
#[command(name = "todo-mvc")]
#[command(about = "Render a to-do item and replay its UI interactions")]
#[command(version)]
struct Cli {
    /// Log level: trace|debug|info|warn|error
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    /// Absolute directory for rotating log files (stderr when omitted)
    #[arg(long)]
    log_dir: Option<String>,
    /// Title of the rendered to-do
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,
    /// Extra attribute as key=value; repeatable
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, AttributeValue)>,
    /// Page markup with a `#to-do` container and an `#item-template` script
    #[arg(long)]
    page: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = LoggingConfig {
        level: cli.log_level.clone(),
        log_dir: cli.log_dir.clone(),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("logging init failed: {err}");
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("event=demo_failed module=cli status=error message={message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    println!("todo_mvc_core version={}", core_version());

    let mut overrides = Attributes::new();
    overrides.insert("title".to_string(), AttributeValue::from(cli.title));
    overrides.extend(cli.extras);
    let my_todo = new_todo(overrides);
    print_store("my_todo", &my_todo);

    let another_todo = new_todo(Attributes::new());
    print_store("another_todo", &another_todo);

    let document = match &cli.page {
        Some(path) => {
            let markup = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read page `{}`: {err}", path.display()))?;
            Document::from_page(&markup).into_shared()
        }
        None => demo_document(),
    };

    let mut view = todo_view(my_todo.into_shared(), document.clone())
        .map_err(|err| format!("failed to create view: {err}"))?;
    let mount = view
        .render()
        .map_err(|err| format!("failed to render: {err}"))?;

    {
        let document = document.borrow();
        println!("rendered {mount}:");
        println!("{}", document.content(&mount).unwrap_or_default());
    }

    let interactions = [
        Interaction::double_click("label"),
        Interaction::key_press(".edit", "Enter"),
        Interaction::blur(".edit"),
    ];
    for interaction in interactions {
        let interaction = interaction.map_err(|err| err.to_string())?;
        let invocations = view
            .dispatch(&interaction)
            .map_err(|err| format!("failed to dispatch `{interaction}`: {err}"))?;
        for invocation in invocations {
            println!(
                "{} -> {}: {}",
                invocation.descriptor, invocation.handler, invocation.message
            );
        }
    }

    Ok(())
}

fn print_store(label: &str, store: &AttributeStore) {
    println!(
        "{label} cid={} attributes={}",
        store.cid(),
        store.to_json()
    );
}

fn parse_extra(raw: &str) -> Result<(String, AttributeValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("attribute name cannot be empty in `{raw}`"));
    }

    let value = match value {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        other => match other.parse::<f64>() {
            Ok(number) => AttributeValue::Number(number),
            Err(_) => AttributeValue::Text(other.to_string()),
        },
    };
    Ok((key.to_string(), value))
}
