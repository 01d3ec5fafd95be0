//! inittree
//!
//! Loads a directory-driven YAML configuration tree and prints it, or
//! bootstraps the full application from it to check that it is sound.

use anyhow::Result;
use clap::Parser;
use inittree::bootstrap::Bootstrap;
use inittree::cli::load::LoadArgs;
use inittree::cli::{Cli, Command};
use inittree::config::{ConfigTree, Settings};
use inittree::error::InitError;
use inittree::format::{OutputFormat, render, render_error};
use inittree::logging::init_logging;
use serde_json::json;
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => {
            let mut settings = Settings::load(path)?;
            settings.apply_env_overrides();
            settings
        }
        None => Settings::load_or_default()?,
    };
    if let Some(log) = &cli.log {
        settings.logging.output = log.clone();
    }
    init_logging(&settings.logging, cli.verbose)?;

    let outcome = match &cli.command {
        Command::Load(args) => load(settings, args).await,
        Command::Check(args) => check(settings, args).await,
    };

    match outcome {
        Ok(output) => {
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err((err, format)) => {
            eprintln!("{}", render_error(&err, format));
            Ok(ExitCode::FAILURE)
        }
    }
}

type Outcome = std::result::Result<String, (InitError, OutputFormat)>;

async fn load(mut settings: Settings, args: &LoadArgs) -> Outcome {
    args.apply(&mut settings.loader);
    debug!(?settings.loader, "loading configuration tree");

    let loader = &settings.loader;
    let tree = ConfigTree::from_settings(loader);
    tree.load(&loader.init_path, &loader.init_file)
        .await
        .and_then(|config| render(&config, args.format))
        .map_err(|err| (err, args.format))
}

async fn check(mut settings: Settings, args: &LoadArgs) -> Outcome {
    args.apply(&mut settings.loader);

    let app = Bootstrap::new(settings)
        .run()
        .await
        .map_err(|err| (err, args.format))?;

    let report = json!({
        "ok": true,
        "keys": app.config().as_object().map(|m| m.len()).unwrap_or(0),
        "errors": app.catalog().error_codes().collect::<Vec<_>>(),
        "behaviors": app.catalog().behaviors().collect::<Vec<_>>(),
        "subsystems": app.subsystems().names(),
    });
    render(&report, args.format).map_err(|err| (err, args.format))
}
