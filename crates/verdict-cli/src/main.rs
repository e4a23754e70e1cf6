use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod chess;
mod commands;
mod registry;
mod samples;

/// Verdict test runner.
///
/// Runs registered test modules and reports grouped, timed results. With no
/// subcommand, reads module names from stdin one per line and runs each,
/// until an empty line or end of input.
///
/// EXAMPLES:
///     verdict                       Interactive: type module names
///     verdict run samples           Run one module
///     verdict run --filter Knight   Run matching tests of every module
///     verdict list samples          Show discovered suites and tests
///
/// ENVIRONMENT VARIABLES:
///     VERDICT_FILTER         Default test name filter
///     VERDICT_REPORT_DIR     Directory for report artifacts
///     VERDICT_REPORT_PREFIX  Artifact file name prefix
///     VERDICT_NO_SAVE        Set to '1' to skip writing the artifact
///     NO_COLOR               Set to disable colored output
///     RUST_LOG               Log filter (default: warn)
#[derive(Parser)]
#[command(name = "verdict")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    output: OutputFlags,

    /// Log suite progress to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Default)]
struct OutputFlags {
    /// Only run tests whose `Suite.Method` name contains this
    #[arg(long, short = 'f', global = true)]
    filter: Option<String>,
    /// Print results as JSON instead of the text report
    #[arg(long, global = true)]
    json: bool,
    /// Do not write the report artifact
    #[arg(long, global = true)]
    no_save: bool,
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
    /// Directory for the report artifact
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Artifact file name prefix
    #[arg(long, global = true)]
    prefix: Option<String>,
}

impl OutputFlags {
    fn overrides(&self) -> commands::Overrides {
        commands::Overrides {
            filter: self.filter.clone(),
            output_dir: self.output_dir.clone(),
            prefix: self.prefix.clone(),
            no_save: self.no_save,
            no_color: self.no_color,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run test modules
    ///
    /// Runs the named modules (all registered modules when none are given)
    /// and prints one combined report. Exits with status 1 if any test failed.
    ///
    /// EXAMPLES:
    ///     verdict run samples                  Run a module
    ///     verdict run samples failures --json  JSON output
    ///     verdict run --no-save                Skip the artifact
    #[command(visible_alias = "r")]
    Run {
        /// Module names
        modules: Vec<String>,
    },

    /// List registered modules, or the suites of one module
    #[command(visible_alias = "ls")]
    List {
        /// Module to describe
        module: Option<String>,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     verdict completions bash > ~/.local/share/bash-completion/completions/verdict
    ///     verdict completions zsh > ~/.zfunc/_verdict
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Some(Commands::List { module }) => {
            let settings = commands::resolve_settings(&cli.output.overrides())?;
            if !settings.color {
                colored::control::set_override(false);
            }
            commands::list::run(module.as_deref(), &mut io::stdout().lock())?;
        }
        Some(Commands::Run { modules }) => {
            let settings = commands::resolve_settings(&cli.output.overrides())?;
            if !settings.color {
                colored::control::set_override(false);
            }
            let args = commands::run::RunArgs {
                modules,
                json: cli.output.json,
            };
            if !commands::run::run(args, &settings)? {
                std::process::exit(1);
            }
        }
        None => {
            let settings = commands::resolve_settings(&cli.output.overrides())?;
            if !settings.color {
                colored::control::set_override(false);
            }
            let stdin = io::stdin();
            commands::interactive::run(
                &settings,
                cli.output.json,
                &mut stdin.lock(),
                &mut io::stdout().lock(),
            )?;
        }
    }

    Ok(())
}
