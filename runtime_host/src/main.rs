//! Command-line host for the ECS runtime
//!
//! Reads a runtime configuration file, discovers system modules and runs the
//! engine until the last system leaves or the process is interrupted.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use ecs_runtime::core::config::{Config, RuntimeConfig};
use ecs_runtime::foundation::logging;
use ecs_runtime::plugin::ModuleArgs;
use ecs_runtime::Engine;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "runtime.toml";

fn cli() -> Command {
    Command::new("runtime_host")
        .about("Loads ECS system modules from a directory and runs them until shutdown")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Runtime configuration file (.toml or .ron)")
                .default_value(DEFAULT_CONFIG),
        )
        .arg(
            Arg::new("systems-dir")
                .short('d')
                .long("systems-dir")
                .value_name("DIR")
                .help("Directory scanned for system modules"),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Scan subdirectories too")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("follow-symlinks")
                .long("follow-symlinks")
                .help("Follow symbolic links while scanning")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-loading")
                .long("log-loading")
                .help("Log every discovered entry")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("FILTER")
                .help("Default log filter (RUST_LOG takes precedence)"),
        )
        .arg(
            Arg::new("max-ticks")
                .long("max-ticks")
                .value_name("COUNT")
                .help("Stop after this many ticks")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("module-arg")
                .short('a')
                .long("module-arg")
                .value_name("VALUE")
                .help("Argument passed to every module (repeatable)")
                .action(ArgAction::Append),
        )
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut RuntimeConfig, matches: &ArgMatches) {
    if let Some(dir) = matches.get_one::<String>("systems-dir") {
        config.start.systems_dir = PathBuf::from(dir);
    }
    if matches.get_flag("recursive") {
        config.start.recursive = true;
    }
    if matches.get_flag("follow-symlinks") {
        config.start.follow_symlinks = true;
    }
    if matches.get_flag("log-loading") {
        config.start.log_loading = true;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.engine.log_level = level.clone();
    }
    if let Some(max) = matches.get_one::<u64>("max-ticks") {
        config.engine.max_ticks = Some(*max);
    }
    if let Some(args) = matches.get_many::<String>("module-arg") {
        config.start.module_args = ModuleArgs::from(args.cloned().collect::<Vec<_>>());
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let mut config = RuntimeConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to read configuration {}", config_path.display()))?;
    apply_overrides(&mut config, &matches);

    logging::init(&config.engine.log_level);
    log::info!("Starting with systems from {}", config.start.systems_dir.display());

    let mut engine = Engine::new(config.engine.clone());
    engine
        .install_interrupt_handler()
        .context("Failed to install interrupt handler")?;

    let status = engine
        .start(&config.start)
        .with_context(|| format!("Failed to load systems from {}", config.start.systems_dir.display()))?;
    let status = if status == 0 { engine.run() } else { status };

    drop(engine);
    std::process::exit(status);
}
