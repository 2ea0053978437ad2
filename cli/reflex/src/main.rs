//! Reflex CLI: validate and inspect device register schemas.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};

use manifest::ReflexManifest;

#[derive(Parser)]
#[command(name = "reflex", version, about = "Device register schema tool")]
struct Cli {
    /// Path to the project manifest (default: nearest reflex.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a device document and report what it defines
    Check {
        /// Device document (.json or .toml)
        file: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print entity dictionaries of a device document
    Inspect {
        /// Device document (.json or .toml)
        file: Option<String>,
        /// Entity kind (metadata, masks, registers, pins); all when omitted
        #[arg(long)]
        kind: Option<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Print the cross-reference token for a named entity
    Xref {
        /// Entity name
        name: String,
        /// Device document (.json or .toml)
        file: Option<String>,
        /// Link text (default: the entity name)
        #[arg(long)]
        label: Option<String>,
        /// Print the anchor token instead of the link
        #[arg(long)]
        pointer: bool,
    },
    /// List device documents known to the project
    List,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (manifest, project_dir) = ReflexManifest::resolve(&cwd, cli.config.as_deref())?;
    if let Some(name) = manifest.project_name() {
        log::debug!("project {name} at {}", project_dir.display());
    }

    match cli.command {
        Commands::Check { file, json } => {
            commands::check::run(&project_dir, &manifest, file.as_deref(), json)
        }

        Commands::Inspect { file, kind, format } => commands::inspect::run(
            &project_dir,
            &manifest,
            file.as_deref(),
            kind.as_deref(),
            format.as_deref(),
        ),

        Commands::Xref {
            name,
            file,
            label,
            pointer,
        } => commands::xref::run(
            &project_dir,
            &manifest,
            file.as_deref(),
            &name,
            label.as_deref(),
            pointer,
        ),

        Commands::List => commands::list::run(&project_dir, &manifest),
    }
}
