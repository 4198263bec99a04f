//! Settings management and dry-run planning for the routine bot engine.
//!
//! A live run needs a remote session driver, which embedders provide through
//! [`forager::session::SessionFactory`]; this binary covers the pieces that
//! work without one: bootstrapping the settings file, validating it, and
//! showing the pipeline a run would execute.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use forager::config::{ResourceTask, RoutineConfig};
use forager::settings::{ToolSettings, load_settings, save_settings};

#[derive(Parser)]
#[command(name = "forager", version, about = "Routine bot engine for resource collection")]
struct Cli {
    /// Path to the settings file.
    #[arg(long, default_value = "forager.toml", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default settings file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Load and validate the settings file.
    Check,
    /// Print the pipeline a run with these settings would execute.
    Plan,
}

fn main() {
    forager::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.settings, force),
        Command::Check => cmd_check(&cli.settings),
        Command::Plan => cmd_plan(&cli.settings),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_settings(path, &ToolSettings::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let settings = load_settings(path)?;
    let config = settings.to_routine_config();
    println!(
        "{}: ok ({} resource task(s) selected)",
        path.display(),
        config.resources.len()
    );
    if config.credentials.is_blank() {
        println!("note: credentials are blank; a run would abort at login");
    }
    Ok(())
}

fn cmd_plan(path: &Path) -> Result<()> {
    let settings = load_settings(path)?;
    let config = settings.to_routine_config();
    println!("{}", render_plan(&config));
    Ok(())
}

/// Render the pipeline in execution order, one step per line.
fn render_plan(config: &RoutineConfig) -> String {
    let mut lines = vec![format!("Routine plan (world {}):", config.world.0)];
    if let Some(item) = &config.protection_item {
        lines.push(format!("  ensure protection using \"{item}\""));
    }
    if config.use_special_skill {
        lines.push("  activate special skill".to_string());
    }
    for resource in ResourceTask::ALL {
        if config.resources.contains(&resource) {
            let dest = resource.destination();
            lines.push(format!(
                "  collect {} at {} ({}, {})",
                dest.resource_name, dest.name, dest.x, dest.y
            ));
        }
    }
    if config.resources.is_empty() {
        lines.push("  no resources selected".to_string());
    }
    lines.join("\n")
}
