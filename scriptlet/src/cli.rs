use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scriptlet - run Rhai snippets against a JSON context and get the bindings back as JSON
#[derive(Parser, Debug)]
#[command(name = "scriptlet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one job and print its payload
    Run {
        /// Source text. Use "-" to read from stdin
        #[arg(value_name = "SOURCE", conflicts_with = "file")]
        source: Option<String>,

        /// Read the source from a file instead
        #[arg(long, short = 'f', value_name = "PATH")]
        file: Option<PathBuf>,

        /// Context JSON object. Use "-" to read from stdin
        #[arg(long, short = 'c', value_name = "JSON", default_value = "{}")]
        context: String,

        /// Base directory for require("*.rhai") when the context has no templateDir
        #[arg(long, value_name = "DIR")]
        template_dir: Option<PathBuf>,

        /// Maximum interpreter operations (default: from env or unlimited)
        #[arg(long)]
        max_operations: Option<u64>,
    },

    /// Serve jobs: one JSON object per line in, one payload per line out
    Serve {
        /// Use stdio transport
        #[arg(long)]
        stdio: bool,

        /// Base directory for require("*.rhai") when a job has no templateDir
        #[arg(long, value_name = "DIR")]
        template_dir: Option<PathBuf>,

        /// Maximum interpreter operations per job (default: from env or unlimited)
        #[arg(long)]
        max_operations: Option<u64>,
    },

    /// Show whether require() treats an identifier as a script file or a package
    Classify {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,
    },
}
