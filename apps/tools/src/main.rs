use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mvc::{Application, ApplicationConfig, ControllerDef, LayoutSetting, Params};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Parser, Debug)]
struct Cli {
    /// Bootstrap file for the console application.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = "warn")]
    log_filter: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatches a route and prints what it returned.
    Run {
        #[arg(default_value = "")]
        route: String,
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Lists the dispatchable routes.
    Routes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ApplicationConfig::load(path)
            .with_context(|| format!("failed to load '{}'", path.display()))?,
        None => console_config(),
    };
    let app = console_application(config)?;

    match cli.command {
        Command::Run { route, params } => {
            let params = parse_params(&params)?;
            debug!(route = %route, params = params.len(), "running console route");
            let output = app.handle_request(&route, &params)?;
            if let Some(text) = format_output(output) {
                println!("{text}");
            }
        }
        Command::Routes => {
            for route in app.routes().routes {
                let marker = if route.is_default { " (default)" } else { "" };
                println!("{}{marker}", route.route);
            }
        }
    }

    Ok(())
}

fn console_config() -> ApplicationConfig {
    ApplicationConfig {
        id: "console".into(),
        name: "Console Application".into(),
        default_route: "help".into(),
        layout: LayoutSetting::Enabled(false),
        ..ApplicationConfig::default()
    }
}

fn console_application(config: ApplicationConfig) -> Result<Application> {
    let app = Application::builder(config)
        .controller(
            "hello",
            ControllerDef::new().inline("index", |_, params| {
                let message: String = params.get_or("message", "hello world".to_string())?;
                Ok(Value::String(message))
            }),
        )
        .controller(
            "help",
            ControllerDef::new().inline("index", |controller, _| {
                let listing = controller.app().routes();
                let routes: Vec<String> = listing
                    .routes
                    .into_iter()
                    .map(|route| route.route)
                    .collect();
                Ok(json!({ "application": listing.application, "routes": routes }))
            }),
        )
        .build()?;
    Ok(app)
}

fn parse_params(raw: &[String]) -> Result<Params> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{pair}'"))
        })
        .collect()
}

fn format_output(output: Option<Value>) -> Option<String> {
    match output? {
        Value::String(text) => Some(text),
        value => Some(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
