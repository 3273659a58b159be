use super::CliError;
use super::helpers::{load_model_config, load_parameters, render_report};
use scenario_core::domain::{ScenarioError, SynthesisRequest};
use scenario_core::modules::runner::STDOUT_LOG_NAME;
use scenario_core::modules::{ModelRunner, ScenarioSynthesizer};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct FamiliesArgs {
    /// Model configuration (JSON)
    #[arg(long)]
    config: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct SynthesizeArgs {
    /// Model configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Experiment parameters as a flat JSON object
    #[arg(long)]
    params: PathBuf,

    /// Experiment model directory receiving the working inputs
    #[arg(long)]
    model_dir: PathBuf,

    /// Identifier used in log output
    #[arg(long, default_value = "experiment")]
    experiment_id: String,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Model configuration (JSON) with a runner section
    #[arg(long)]
    config: PathBuf,

    /// Prepared experiment model directory
    #[arg(long)]
    model_dir: PathBuf,
}

pub(super) fn run_families_command(args: FamiliesArgs) -> Result<i32, CliError> {
    let config = load_model_config(&args.config)?;
    for family in &config.families {
        println!(
            "{}\t{}\t{}\t{}",
            family.name,
            family.kind,
            family.kind.parameter_names().join(","),
            config.reference_dir(family).display()
        );
    }
    Ok(0)
}

pub(super) fn run_synthesize_command(args: SynthesizeArgs) -> Result<i32, CliError> {
    let config = load_model_config(&args.config)?;
    let params = load_parameters(&args.params)?;

    let synthesizer = ScenarioSynthesizer::new(config);
    let request = SynthesisRequest::new(args.experiment_id, params, args.model_dir);
    let report = synthesizer.synthesize(&request);
    println!("{}", render_report(&report));

    if report.is_success() { Ok(0) } else { Ok(1) }
}

pub(super) fn run_model_command(args: RunArgs) -> Result<i32, CliError> {
    let config = load_model_config(&args.config)?;
    let run_config = config.runner.ok_or_else(|| {
        CliError::Compute(ScenarioError::input_validation(
            "INPUT.RUNNER_CONFIG",
            format!(
                "model config '{}' has no runner section",
                args.config.display()
            ),
        ))
    })?;

    let mut runner = ModelRunner::new(run_config);
    let result = runner.run(&args.model_dir).map(|_| ());
    match result {
        Ok(()) => {
            println!(
                "model run complete: {}",
                args.model_dir
                    .join(&runner.config().results_dir)
                    .join(STDOUT_LOG_NAME)
                    .display()
            );
            Ok(0)
        }
        Err(error) => {
            eprint!("{}", runner.last_run_logs());
            Err(CliError::Compute(error))
        }
    }
}
