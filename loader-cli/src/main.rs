//! CLI tool that launches game instances and injects libraries into them.

mod config;
#[cfg(windows)]
mod session;

use anyhow::Context;
use clap::Parser;
use config::Config;
use loader_core::{LaunchRequest, WriteFailurePolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "game-loader")]
#[command(about = "Launch game instances and inject libraries into them", long_about = None)]
struct Args {
    /// Path to the game executable
    #[arg(short, long, value_name = "PATH")]
    game: PathBuf,

    /// Arguments passed verbatim to every instance
    #[arg(short = 'a', long, value_name = "ARGS", allow_hyphen_values = true)]
    gameargs: Option<String>,

    /// Library to inject (repeatable, injected in the given order)
    #[arg(short, long = "library", value_name = "PATH")]
    libraries: Vec<PathBuf>,

    /// Number of instances to launch
    #[arg(short, long, value_name = "COUNT", default_value_t = 1)]
    num_instances: usize,

    /// Knowledge library for the game
    #[arg(short, long, value_name = "PATH")]
    knowledge: Option<PathBuf>,

    /// Start instances running instead of suspended
    #[arg(long)]
    no_suspend: bool,

    /// Abort the run when a library path cannot be written
    #[arg(long)]
    strict_write: bool,

    /// Write the effective settings to the config file
    #[arg(long)]
    save_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Everything one run needs, after merging the command line over the
/// settings file.
#[derive(Debug)]
pub(crate) struct Plan {
    pub request: LaunchRequest,
    pub libraries: Vec<PathBuf>,
    pub knowledge: Option<PathBuf>,
    pub suspended: bool,
    pub write_policy: WriteFailurePolicy,
    pub poll_interval: Duration,
}

impl Plan {
    fn resolve(args: &Args, config: &Config) -> anyhow::Result<Self> {
        let request = LaunchRequest::new(
            args.game.clone(),
            args.gameargs.clone(),
            args.num_instances,
            config.max_instances,
        )?;

        let libraries = if args.libraries.is_empty() {
            &config.default_libraries
        } else {
            &args.libraries
        };
        let libraries = libraries
            .iter()
            .map(|library| absolute(library))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let write_policy = if args.strict_write {
            WriteFailurePolicy::Strict
        } else {
            config.write_failure_policy.into()
        };

        Ok(Self {
            request,
            libraries,
            knowledge: args
                .knowledge
                .clone()
                .or_else(|| config.knowledge_library.clone()),
            suspended: !args.no_suspend,
            write_policy,
            poll_interval: config.poll_interval(),
        })
    }

    fn print(&self) {
        println!("Game: {}", self.request.executable().display());
        if let Some(args) = self.request.arguments() {
            println!("Arguments: {}", args);
        }
        println!("Instances: {}", self.request.instance_count());
        if let Some(knowledge) = &self.knowledge {
            println!("Knowledge library: {}", knowledge.display());
        }

        if self.libraries.is_empty() {
            println!("No libraries to inject");
        } else {
            println!("Libraries:");
            for library in &self.libraries {
                println!("  {}", library.display());
            }
        }
    }
}

// The target resolves relative paths against its own working directory.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(std::env::current_dir()
        .context("Failed to get current directory")?
        .join(path))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[cfg(windows)]
fn run(plan: &Plan) -> anyhow::Result<()> {
    session::run(plan)
}

#[cfg(not(windows))]
fn run(_plan: &Plan) -> anyhow::Result<()> {
    anyhow::bail!("game-loader only runs on Windows")
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load();

    let plan = match Plan::resolve(&args, &config) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if args.save_config {
        let saved = Config {
            max_instances: config.max_instances,
            poll_interval_ms: config.poll_interval_ms,
            write_failure_policy: if args.strict_write {
                config::WritePolicySetting::Strict
            } else {
                config.write_failure_policy
            },
            default_libraries: plan.libraries.clone(),
            knowledge_library: plan.knowledge.clone(),
        };

        match saved.save() {
            Ok(path) => println!("Settings saved to {}", path.display()),
            Err(e) => eprintln!("Failed to save settings: {:#}", e),
        }
    }

    plan.print();

    if let Err(e) = run(&plan) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    println!("Done.");
}
