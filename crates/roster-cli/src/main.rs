//! Roster CLI - Extract provider roster records from email bodies.

use anyhow::Context;
use clap::Parser;
use roster_cli::commands;
use roster_cli::{Cli, Command, Config, EngineOptions, Formatter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("Failed to load ~/.roster/config.toml")?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let options = EngineOptions {
        config_file: cli.config,
        preset: cli.preset.map(Into::into),
        gazetteer_dir: cli.gazetteer,
        recognizer: cli.recognizer.map(Into::into),
    }
    .with_defaults(&config);

    match cli.command {
        Command::Extract(args) => {
            let file = args.file.display().to_string();
            commands::execute_extract(args, &options, &formatter)
                .with_context(|| format!("Extraction failed for {}", file))?;
        }
        Command::Batch(args) => commands::execute_batch(args, &options, &formatter)?,
        Command::Blocks(args) => commands::execute_blocks(args, &options, &formatter)?,
        Command::Config(args) => commands::execute_config(args, &options, &formatter)?,
    }

    Ok(())
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
