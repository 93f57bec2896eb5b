mod cli;
mod observability;
mod serve;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use scriptlet_core::config::EngineConfig;
use scriptlet_engine::{Requirement, ScriptRunner};

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            file,
            context,
            template_dir,
            max_operations,
        } => {
            if source.as_deref() == Some("-") && context == "-" {
                anyhow::bail!("Source and context cannot both be read from stdin");
            }
            let source = read_source(source, file.as_deref())?;
            let context = read_arg_or_stdin(context)?;
            let runner = build_runner(template_dir, max_operations);
            println!("{}", runner.run(&source, &context));
        }
        Commands::Serve {
            stdio,
            template_dir,
            max_operations,
        } => {
            if stdio {
                let runner = build_runner(template_dir, max_operations);
                serve::serve_stdio(&runner)?;
            } else {
                anyhow::bail!("No transport selected (use --stdio)");
            }
        }
        Commands::Classify { identifier } => {
            let config = EngineConfig::from_env();
            let req = Requirement::classify(&identifier, &config.script_extensions);
            println!("{}\t{}", req.kind(), req.identifier());
        }
    }

    Ok(())
}

/// Configuration from env (and `.env`), then CLI overrides.
fn build_runner(template_dir: Option<PathBuf>, max_operations: Option<u64>) -> ScriptRunner {
    let mut config = EngineConfig::from_env().with_template_dir(template_dir);
    config.limits = config.limits.with_cli_overrides(max_operations);
    ScriptRunner::new(config)
}

fn read_source(source: Option<String>, file: Option<&Path>) -> Result<String> {
    match (source, file) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file {}", path.display())),
        (Some(text), None) => read_arg_or_stdin(text),
        (None, None) => read_arg_or_stdin("-".to_string()),
    }
}

/// `-` means: read all of stdin.
fn read_arg_or_stdin(value: String) -> Result<String> {
    if value != "-" {
        return Ok(value);
    }
    let mut s = String::new();
    std::io::stdin()
        .read_to_string(&mut s)
        .context("Failed to read stdin")?;
    Ok(s)
}
