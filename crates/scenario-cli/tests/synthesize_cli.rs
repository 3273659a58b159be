use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn families_command_lists_the_family_table() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = write_config(temp.path(), None);

    let output = Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("families")
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("binary should start");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("land_use\tmixture\tLUDENSITYMIX\t"));
    assert!(lines[1].starts_with("population\tcategorical\tHHPOPGROWTHRATE\t"));
}

#[test]
fn synthesize_command_writes_working_inputs() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_reference_data(temp.path());
    let config_path = write_config(temp.path(), None);
    let params_path = write_params(temp.path(), json!({"ludensitymix": 0.25, "HHPOPGROWTHRATE": "base"}));
    let model_dir = temp.path().join("model");

    let output = synthesize(&config_path, &params_path, &model_dir);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("applied land_use (mixture): 1 file(s)"));
    assert!(stdout.contains("applied population (categorical): 1 file(s)"));
    assert_eq!(
        fs::read_to_string(model_dir.join("inputs/bzone_dwelling_units.csv"))
            .expect("mixture output"),
        "Geo,Year,SFDU,Share\nB1,2010,12,0.12500\n"
    );
    assert_eq!(
        fs::read(model_dir.join("inputs/azone_hh_pop_by_age.csv")).expect("copied output"),
        fs::read(temp.path().join("refs/population/1/azone_hh_pop_by_age.csv"))
            .expect("reference readable")
    );
}

#[test]
fn synthesize_command_exits_one_when_a_family_fails() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_reference_data(temp.path());
    let config_path = write_config(temp.path(), None);
    let params_path = write_params(temp.path(), json!({"LUDENSITYMIX": 1.0, "HHPOPGROWTHRATE": 9}));
    let model_dir = temp.path().join("model");

    let output = synthesize(&config_path, &params_path, &model_dir);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("applied land_use (mixture)"));
    assert!(stdout.contains("failed population:"));
    assert!(model_dir.join("inputs/bzone_dwelling_units.csv").is_file());
}

#[test]
fn invalid_config_reports_diagnostic_and_exit_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = temp.path().join("model.json");
    fs::write(&config_path, "{ not json").expect("config should be written");
    let params_path = write_params(temp.path(), json!({}));

    let output = synthesize(&config_path, &params_path, &temp.path().join("model"));

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ERROR: [INPUT.MODEL_CONFIG]"));
}

#[test]
fn missing_arguments_are_usage_errors() {
    let output = Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("synthesize")
        .output()
        .expect("binary should start");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ERROR: [INPUT.CLI_USAGE]"));
}

#[test]
fn run_command_requires_a_runner_section() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = write_config(temp.path(), None);

    let output = Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .arg("--model-dir")
        .arg(temp.path())
        .output()
        .expect("binary should start");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ERROR: [INPUT.RUNNER_CONFIG]"));
}

#[cfg(unix)]
#[test]
fn run_command_invokes_the_model_and_keeps_stdout() {
    let temp = TempDir::new().expect("tempdir should be created");
    let runner = json!({"executable": "sh", "args": ["-c", "echo model finished"]});
    let config_path = write_config(temp.path(), Some(runner));
    let model_dir = temp.path().join("model");
    fs::create_dir_all(&model_dir).expect("model dir");

    let output = Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .arg("--model-dir")
        .arg(&model_dir)
        .output()
        .expect("binary should start");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        fs::read_to_string(model_dir.join("results/stdout.log")).expect("stdout log"),
        "model finished\n"
    );
}

#[cfg(unix)]
#[test]
fn failing_model_run_exits_with_computation_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let runner = json!({"executable": "sh", "args": ["-c", "echo boom 1>&2; exit 4"]});
    let config_path = write_config(temp.path(), Some(runner));

    let output = Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .arg("--model-dir")
        .arg(temp.path())
        .output()
        .expect("binary should start");

    assert_eq!(output.status.code(), Some(4));
    let stderr = stderr(&output);
    assert!(stderr.contains("=== STDERR ===\nboom\n"));
    assert!(stderr.contains("ERROR: [RUN.MODEL_EXIT]"));
}

fn synthesize(config: &Path, params: &Path, model_dir: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_scenario-synth"))
        .arg("synthesize")
        .arg("--config")
        .arg(config)
        .arg("--params")
        .arg(params)
        .arg("--model-dir")
        .arg(model_dir)
        .arg("--experiment-id")
        .arg("cli-test")
        .env("RUST_LOG", "off")
        .output()
        .expect("binary should start")
}

fn write_config(root: &Path, runner: Option<serde_json::Value>) -> std::path::PathBuf {
    let mut config = json!({
        "model_type": "VERSPM",
        "base_year": 2010,
        "model_year": 2040,
        "reference_root": "refs",
        "families": [
            {"name": "land_use", "directory": "ludensity", "kind": "mixture",
             "parameter": "LUDENSITYMIX"},
            {"name": "population", "directory": "population", "kind": "categorical",
             "parameter": "HHPOPGROWTHRATE", "categories": {"base": "1"}}
        ]
    });
    if let Some(runner) = runner {
        config["runner"] = runner;
    }
    let path = root.join("model.json");
    write_file(
        &path,
        &serde_json::to_string_pretty(&config).expect("config serializes"),
    );
    path
}

fn write_params(root: &Path, params: serde_json::Value) -> std::path::PathBuf {
    let path = root.join("params.json");
    write_file(&path, &params.to_string());
    path
}

fn stage_reference_data(root: &Path) {
    write_file(
        &root.join("refs/ludensity/1/bzone_dwelling_units.csv"),
        "Geo,Year,SFDU,Share\nB1,2010,10,0.1\n",
    );
    write_file(
        &root.join("refs/ludensity/2/bzone_dwelling_units.csv"),
        "Geo,Year,SFDU,Share\nB1,2040,18,0.2\n",
    );
    write_file(
        &root.join("refs/population/1/azone_hh_pop_by_age.csv"),
        "Geo,Year,Age0to14\r\nRVMPO,2010,30000\r\n",
    );
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
