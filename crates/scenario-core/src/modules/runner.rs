//! Invocation of the external model as a batch process.

use crate::domain::{ScenarioError, ScenarioResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const STDOUT_LOG_NAME: &str = "stdout.log";

/// How to launch the model. Library paths are prepended to the child's
/// `PATH`; the parent environment is never touched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelRunConfig {
    pub executable: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Relative to the model directory.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl ModelRunConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            library_paths: Vec::new(),
            env: BTreeMap::new(),
            results_dir: default_results_dir(),
        }
    }

    fn search_path(&self) -> ScenarioResult<Option<OsString>> {
        if self.library_paths.is_empty() {
            return Ok(None);
        }
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let paths = self
            .library_paths
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited));
        std::env::join_paths(paths).map(Some).map_err(|source| {
            ScenarioError::input_validation(
                "INPUT.RUNNER_PATH",
                format!("library paths cannot be joined into PATH: {}", source),
            )
        })
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_DIR)
}

/// Captured result of one model process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn render_logs(&self) -> String {
        let mut logs = String::new();
        if !self.stdout.is_empty() {
            logs.push_str("=== STDOUT ===\n");
            push_stream(&mut logs, &self.stdout);
        }
        if !self.stderr.is_empty() {
            logs.push_str("=== STDERR ===\n");
            push_stream(&mut logs, &self.stderr);
        }
        logs.push_str("=== END OF LOG ===\n");
        logs
    }
}

fn push_stream(logs: &mut String, stream: &[u8]) {
    logs.push_str(&String::from_utf8_lossy(stream));
    if !logs.ends_with('\n') {
        logs.push('\n');
    }
}

#[derive(Debug, Clone)]
pub struct ModelRunner {
    config: ModelRunConfig,
    last_run: Option<RunOutcome>,
}

impl ModelRunner {
    pub fn new(config: ModelRunConfig) -> Self {
        Self {
            config,
            last_run: None,
        }
    }

    pub fn config(&self) -> &ModelRunConfig {
        &self.config
    }

    /// Runs the model from `model_dir` and waits for it.
    ///
    /// On success stdout is also written to `<model_dir>/<results_dir>/stdout.log`.
    /// The captured outcome is kept either way for [`ModelRunner::last_run_logs`].
    pub fn run(&mut self, model_dir: &Path) -> ScenarioResult<&RunOutcome> {
        let mut command = Command::new(&self.config.executable);
        command
            .current_dir(model_dir)
            .args(&self.config.args)
            .envs(&self.config.env);
        if let Some(path) = self.config.search_path()? {
            command.env("PATH", path);
        }

        tracing::info!(
            executable = %self.config.executable.display(),
            model_dir = %model_dir.display(),
            "starting model run"
        );
        let output = command.output().map_err(|source| {
            ScenarioError::io_system(
                "IO.MODEL_EXEC",
                format!(
                    "failed to execute model command '{}': {}",
                    self.config.executable.display(),
                    source
                ),
            )
        })?;

        let outcome = self.last_run.insert(RunOutcome {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        });

        if !output.status.success() {
            let status_text = output.status.code().map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {}", code),
            );
            return Err(ScenarioError::computation(
                "RUN.MODEL_EXIT",
                format!(
                    "model command '{}' failed with {}",
                    self.config.executable.display(),
                    status_text
                ),
            ));
        }

        let results_dir = model_dir.join(&self.config.results_dir);
        let log_path = results_dir.join(STDOUT_LOG_NAME);
        fs::create_dir_all(&results_dir)
            .and_then(|()| fs::write(&log_path, &outcome.stdout))
            .map_err(|source| {
                ScenarioError::io_system(
                    "IO.MODEL_RESULTS",
                    format!("failed to write '{}': {}", log_path.display(), source),
                )
            })?;

        tracing::info!(log = %log_path.display(), "model run complete");
        Ok(outcome)
    }

    pub fn last_run(&self) -> Option<&RunOutcome> {
        self.last_run.as_ref()
    }

    pub fn last_run_logs(&self) -> String {
        self.last_run
            .as_ref()
            .map_or_else(|| "no run stored\n".to_string(), RunOutcome::render_logs)
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelRunConfig, ModelRunner, RunOutcome};

    #[test]
    fn logs_render_both_streams_and_the_end_marker() {
        let outcome = RunOutcome {
            exit_code: Some(0),
            stdout: b"model done".to_vec(),
            stderr: b"warning: slow\n".to_vec(),
        };
        assert_eq!(
            outcome.render_logs(),
            "=== STDOUT ===\nmodel done\n=== STDERR ===\nwarning: slow\n=== END OF LOG ===\n"
        );

        let quiet = RunOutcome {
            exit_code: Some(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        assert_eq!(quiet.render_logs(), "=== END OF LOG ===\n");
    }

    #[test]
    fn runner_without_a_run_reports_no_logs() {
        let runner = ModelRunner::new(ModelRunConfig::new("Rscript"));
        assert!(runner.last_run().is_none());
        assert_eq!(runner.last_run_logs(), "no run stored\n");
    }

    #[cfg(unix)]
    mod process {
        use super::super::{ModelRunConfig, ModelRunner, STDOUT_LOG_NAME};
        use crate::domain::ScenarioErrorCategory;
        use std::fs;
        use tempfile::TempDir;

        fn shell(script: &str) -> ModelRunConfig {
            let mut config = ModelRunConfig::new("sh");
            config.args = vec!["-c".to_string(), script.to_string()];
            config
        }

        #[test]
        fn successful_run_writes_stdout_log() {
            let temp = TempDir::new().expect("tempdir should be created");
            let mut config = shell("echo \"$SCENARIO_LABEL\"; pwd; echo note 1>&2");
            config
                .env
                .insert("SCENARIO_LABEL".to_string(), "exp-7".to_string());
            let mut runner = ModelRunner::new(config);

            let outcome = runner.run(temp.path()).expect("run should succeed");
            assert!(outcome.success());
            let stdout = String::from_utf8_lossy(&outcome.stdout).into_owned();
            assert!(stdout.starts_with("exp-7\n"));

            let log = fs::read_to_string(temp.path().join("results").join(STDOUT_LOG_NAME))
                .expect("stdout log should exist");
            assert_eq!(log, stdout);
            assert!(runner.last_run_logs().contains("=== STDERR ===\nnote\n"));
        }

        #[test]
        fn library_paths_lead_the_child_path() {
            let temp = TempDir::new().expect("tempdir should be created");
            let library = temp.path().join("R/bin");
            fs::create_dir_all(&library).expect("library dir");
            let mut config = shell("echo \"$PATH\"");
            config.library_paths = vec![library.clone()];
            let mut runner = ModelRunner::new(config);

            let outcome = runner.run(temp.path()).expect("run should succeed");
            let stdout = String::from_utf8_lossy(&outcome.stdout).into_owned();
            assert!(stdout.starts_with(&format!("{}:", library.display())));
        }

        #[test]
        fn failing_run_keeps_logs_and_writes_nothing() {
            let temp = TempDir::new().expect("tempdir should be created");
            let mut runner = ModelRunner::new(shell("echo partial; echo broken 1>&2; exit 3"));

            let error = runner.run(temp.path()).expect_err("exit 3 should fail");
            assert_eq!(error.category(), ScenarioErrorCategory::ComputationError);
            assert_eq!(error.placeholder(), "RUN.MODEL_EXIT");
            assert!(error.message().contains("exit code 3"));
            assert!(!temp.path().join("results").exists());

            let logs = runner.last_run_logs();
            assert!(logs.contains("partial"));
            assert!(logs.contains("broken"));
            assert_eq!(runner.last_run().and_then(|run| run.exit_code), Some(3));
        }

        #[test]
        fn missing_executable_is_an_io_error() {
            let temp = TempDir::new().expect("tempdir should be created");
            let mut runner =
                ModelRunner::new(ModelRunConfig::new(temp.path().join("no-such-model")));
            let error = runner.run(temp.path()).expect_err("executable is absent");
            assert_eq!(error.category(), ScenarioErrorCategory::IoSystemError);
            assert_eq!(error.placeholder(), "IO.MODEL_EXEC");
        }
    }
}
