mod commands;
mod helpers;

use clap::Parser;
use scenario_core::domain::ScenarioError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "scenario_synth=info,scenario_core=info";

/// Installs the stderr subscriber; `RUST_LOG` overrides the default filter.
pub fn init_logging() -> Result<(), ScenarioError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|source| {
            ScenarioError::internal(
                "SYS.CLI_LOGGING",
                format!("failed to install log subscriber: {}", source),
            )
        })
}

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let scenario_error = error.as_scenario_error();
            eprintln!("{}", scenario_error.diagnostic_line());
            scenario_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("scenario-synth".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "scenario-synth",
    about = "Synthesize travel-model working inputs for scenario experiments"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// List the configured input families and their trigger parameters
    Families(commands::FamiliesArgs),
    /// Write one experiment's working input files into a model directory
    Synthesize(commands::SynthesizeArgs),
    /// Run the external model in a prepared model directory
    Run(commands::RunArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Families(args) => commands::run_families_command(args),
        CliCommand::Synthesize(args) => commands::run_synthesize_command(args),
        CliCommand::Run(args) => commands::run_model_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(ScenarioError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_scenario_error(&self) -> ScenarioError {
        match self {
            Self::Usage(message) => {
                ScenarioError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => ScenarioError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<ScenarioError> for CliError {
    fn from(error: ScenarioError) -> Self {
        Self::Compute(error)
    }
}
