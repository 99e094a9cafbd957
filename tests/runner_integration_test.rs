// tests/runner_integration_test.rs

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use ras_runner::{
    adapters::{command::script::ScriptModelRunner, filesystem::RealFileSystem},
    domain::{
        config::RunnerSettings,
        errors::RunnerError,
        payload::{PayloadFormat, PayloadLocation},
        progress::{COMPUTATION_MARKER, WARMUP_MARKER},
    },
    ports::{
        command::mock::ScriptedModelRunner, object_store::memory::InMemoryObjectStore,
        progress::mock::RecordingProgressReporter,
    },
    services::runner::Runner,
};

const STAC_PAYLOAD: &str = r#"
model_configuration:
  model_name: basin
  model_links:
    linked_input_files:
      - name: geometry
        resource_info: { scheme: s3, authority: "", fragment: models/basin/basin.g01 }
      - name: unsteady flow
        resource_info: { scheme: s3, authority: shared, fragment: flows/basin.b02 }
      - name: project
        resource_info: { scheme: s3, authority: "", fragment: models/basin/basin.prj }
    required_output_files:
      - resource_info: { scheme: s3, authority: "", fragment: runs/42/basin.p01.hdf }
      - resource_info: { scheme: s3, authority: "", fragment: runs/42/basin.log }
"#;

fn seeded_store() -> InMemoryObjectStore {
    let store = InMemoryObjectStore::new();
    store.insert("models", "jobs/42.yml", STAC_PAYLOAD);
    store.insert("models", "models/basin/basin.g01", "geometry");
    store.insert("shared", "flows/basin.b02", "unsteady flow");
    store.insert("models", "models/basin/basin.prj", "project");
    store
}

fn settings(model_dir: &Path, script: PathBuf) -> RunnerSettings {
    RunnerSettings {
        bucket: Some("models".to_string()),
        model_dir: model_dir.to_path_buf(),
        script,
        payload_format: PayloadFormat::Auto,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_run_with_scripted_model() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("model");
    let settings = settings(&model_dir, PathBuf::from("/app/run-model.sh"));

    let store = seeded_store();
    let fs = RealFileSystem;
    let reporter = RecordingProgressReporter::new();
    let model_runner = ScriptedModelRunner::succeeding([
        "Starting HEC-RAS",
        COMPUTATION_MARKER,
        "PROGRESS = 0.1",
        "PROGRESS = 0.5",
        WARMUP_MARKER,
        "PROGRESS = 0.6",
        COMPUTATION_MARKER,
        "PROGRESS = 1.0",
    ])
    .on_finish(|invocation| {
        std::fs::write(invocation.working_dir.join("basin.p01.tmp.hdf"), "results").unwrap();
    });

    let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
    let location = PayloadLocation::parse("jobs/42.yml").unwrap();
    let identity = runner.run(&location).await.unwrap();

    assert_eq!(identity.name, "basin");
    assert_eq!(identity.script_args(), vec!["basin", "01", "02"]);

    assert_eq!(
        reporter.calls(),
        vec![
            "start basin",
            "report 10%",
            "report 50%",
            "report 100%",
            "finish true",
        ]
    );

    assert_eq!(
        store.requests(),
        vec![
            "GET s3://models/jobs/42.yml",
            "GET s3://models/models/basin/basin.g01",
            "GET s3://shared/flows/basin.b02",
            "GET s3://models/models/basin/basin.prj",
            "PUT s3://models/runs/42/basin.p01.hdf",
            "PUT s3://models/runs/42/basin.log",
        ]
    );

    let results = store.object("models", "runs/42/basin.p01.hdf").unwrap();
    assert_eq!(results.body, b"results");

    let log = store.object("models", "runs/42/basin.log").unwrap();
    assert_eq!(log.content_type.as_deref(), Some("text/plain"));
    let log = String::from_utf8(log.body).unwrap();
    assert!(log.starts_with("Starting HEC-RAS\n"));
    assert!(log.contains("PROGRESS = 0.6\n"));

    assert_eq!(
        std::fs::read_to_string(model_dir.join("basin.b02")).unwrap(),
        "unsteady flow"
    );
    assert!(!model_dir.join("basin.p01.tmp.hdf").exists());
}

#[tokio::test]
async fn test_full_run_with_shell_script() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("model");
    let script = dir.path().join("run-model.sh");
    std::fs::write(
        &script,
        r#"cd "$1"
echo "model=$2 geometry=$3 unsteady=$4"
echo "LABEL= Unsteady Flow Computations"
echo "PROGRESS = 0.2"
echo "PROGRESS = 0.9"
echo "results for $2" > "$2.p$3.tmp.hdf"
"#,
    )
    .unwrap();

    let settings = settings(&model_dir, script);
    let store = seeded_store();
    let fs = RealFileSystem;
    let reporter = RecordingProgressReporter::new();
    let model_runner = ScriptModelRunner::new().with_shell("/bin/sh");

    let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
    let location = PayloadLocation::parse(r#"{"s3key": "jobs/42.yml"}"#).unwrap();
    runner.run(&location).await.unwrap();

    assert_eq!(
        reporter.calls(),
        vec!["start basin", "report 20%", "report 90%", "finish true"]
    );

    let results = store.object("models", "runs/42/basin.p01.hdf").unwrap();
    assert_eq!(results.body, b"results for basin\n");

    let log = String::from_utf8(store.object("models", "runs/42/basin.log").unwrap().body).unwrap();
    assert!(log.contains("model=basin geometry=01 unsteady=02\n"));
}

#[tokio::test]
async fn test_failing_script_reports_stderr() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("model");
    let script = dir.path().join("run-model.sh");
    std::fs::write(&script, "echo 'unable to open basin.g01' >&2\nexit 4\n").unwrap();

    let settings = settings(&model_dir, script);
    let store = seeded_store();
    let fs = RealFileSystem;
    let reporter = RecordingProgressReporter::new();
    let model_runner = ScriptModelRunner::new().with_shell("/bin/sh");

    let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
    let location = PayloadLocation::parse("s3://models/jobs/42.yml").unwrap();
    let err = runner.run(&location).await.unwrap_err();

    assert!(matches!(err, RunnerError::Run { .. }));
    assert_eq!(err.stderr(), Some("unable to open basin.g01\n"));
    assert!(store.object("models", "runs/42/basin.log").is_none());
}

#[tokio::test]
async fn test_missing_input_aborts_before_model_run() {
    let dir = tempdir().unwrap();
    let model_dir = dir.path().join("model");
    let settings = settings(&model_dir, PathBuf::from("/app/run-model.sh"));

    let store = InMemoryObjectStore::new();
    store.insert("models", "jobs/42.yml", STAC_PAYLOAD);
    store.insert("models", "models/basin/basin.g01", "geometry");
    let fs = RealFileSystem;
    let reporter = RecordingProgressReporter::new();
    let model_runner = ScriptedModelRunner::succeeding(Vec::<String>::new());

    let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
    let location = PayloadLocation::parse("jobs/42.yml").unwrap();
    let err = runner.run(&location).await.unwrap_err();

    assert!(matches!(
        err,
        RunnerError::Retrieval { ref bucket, ref key, .. }
            if bucket == "shared" && key == "flows/basin.b02"
    ));
    assert!(model_runner.invocations().is_empty());
    assert!(reporter.calls().is_empty());
}
