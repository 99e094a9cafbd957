// src/services/runner.rs
use tracing::info;

use crate::{
    adapters::logging::LogSink,
    domain::{
        config::RunnerSettings, errors::RunnerError, model::ModelIdentity,
        payload::PayloadLocation,
    },
    ports::{
        command::ModelRunner, filesystem::FileSystem, object_store::ObjectStore,
        progress::ProgressReporter,
    },
    services::{
        finalizer::Finalizer,
        model_run::{log_path, ModelRun},
        payload::PayloadSource,
        stager::Stager,
    },
};

/// Drives one job from payload to uploaded results
pub struct Runner<'a> {
    settings: &'a RunnerSettings,
    store: &'a dyn ObjectStore,
    fs: &'a dyn FileSystem,
    model_runner: &'a dyn ModelRunner,
    reporter: &'a dyn ProgressReporter,
    log_sink: Option<LogSink>,
}

impl<'a> Runner<'a> {
    pub fn new(
        settings: &'a RunnerSettings,
        store: &'a dyn ObjectStore,
        fs: &'a dyn FileSystem,
        model_runner: &'a dyn ModelRunner,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            settings,
            store,
            fs,
            model_runner,
            reporter,
            log_sink: None,
        }
    }

    /// Mirror the log stream into the run log once the model is named.
    /// The sink stays attached after `run` returns; the caller detaches it.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub async fn run(&self, location: &PayloadLocation) -> Result<ModelIdentity, RunnerError> {
        let bucket = self.settings.resolve_bucket(location)?;
        let model_dir = self.settings.model_dir.as_path();

        let payload = PayloadSource::new(self.store, self.settings.payload_format)
            .load(location, &bucket)
            .await?;

        let staged = Stager::new(self.store, self.fs, &bucket, model_dir)
            .stage(&payload.inputs)
            .await?;

        let identity = ModelIdentity::from_payload(&payload)?;
        self.attach_run_log(&identity)?;

        info!(
            model = %identity.name,
            geometry = identity.geometry_id.as_deref().unwrap_or("-"),
            unsteady = identity.unsteady_id.as_deref().unwrap_or("-"),
            "staged {} model inputs",
            staged.len()
        );
        ModelRun::new(
            self.model_runner,
            self.fs,
            self.reporter,
            &self.settings.script,
            model_dir,
        )
        .execute(&identity)
        .await?;

        info!("Pushing results......");
        let finalizer = Finalizer::new(self.store, self.fs, &bucket, model_dir);
        for path in finalizer.strip_tmp_markers()? {
            info!("finalized {}", path.display());
        }
        finalizer.upload(&payload.outputs).await?;

        info!("Done");
        Ok(identity)
    }

    fn attach_run_log(&self, identity: &ModelIdentity) -> Result<(), RunnerError> {
        let Some(sink) = &self.log_sink else {
            return Ok(());
        };
        let path = log_path(&self.settings.model_dir, &identity.name);
        let writer = self
            .fs
            .open_append(&path)
            .map_err(|e| RunnerError::transfer(&path, e))?;
        sink.attach(writer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        adapters::filesystem::RealFileSystem,
        domain::config::ConfigValidationError,
        ports::{
            command::mock::ScriptedModelRunner, object_store::memory::InMemoryObjectStore,
            progress::mock::RecordingProgressReporter,
        },
    };

    const PAYLOAD: &str = r#"{
        "inputs": [{"href": "models/basin.g01"}, {"href": "models/basin.b02"}],
        "outputs": [{"href": "runs/basin.p01.hdf"}]
    }"#;

    fn settings(model_dir: PathBuf) -> RunnerSettings {
        RunnerSettings {
            bucket: Some("models".to_string()),
            model_dir,
            ..Default::default()
        }
    }

    fn location() -> PayloadLocation {
        PayloadLocation {
            bucket: None,
            key: "jobs/payload.json".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_bucket_is_config_error() {
        let dir = tempdir().unwrap();
        let settings = RunnerSettings {
            model_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let store = InMemoryObjectStore::new();
        let fs = RealFileSystem;
        let model_runner = ScriptedModelRunner::succeeding(Vec::<String>::new());
        let reporter = RecordingProgressReporter::new();

        let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
        let result = runner.run(&location()).await;

        assert!(matches!(
            result,
            Err(RunnerError::Config(ConfigValidationError::MissingBucket))
        ));
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn test_configured_bucket_serves_links_without_one() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path().to_path_buf());
        let store = InMemoryObjectStore::new();
        store.insert("jobs", "payload.json", PAYLOAD);
        store.insert("models", "models/basin.g01", "geometry");
        store.insert("models", "models/basin.b02", "flow");
        let fs = RealFileSystem;
        let model_runner = ScriptedModelRunner::failing(1, "");
        let reporter = RecordingProgressReporter::new();

        let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
        let location = PayloadLocation::parse("s3://jobs/payload.json").unwrap();
        let _ = runner.run(&location).await;

        assert_eq!(
            store.requests(),
            vec![
                "GET s3://jobs/payload.json",
                "GET s3://models/models/basin.g01",
                "GET s3://models/models/basin.b02",
            ]
        );
    }

    #[tokio::test]
    async fn test_naming_error_stops_before_model_run() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path().to_path_buf());
        let store = InMemoryObjectStore::new();
        store.insert(
            "models",
            "jobs/payload.json",
            r#"{"inputs": [{"href": "a.g01"}, {"href": "b.b02"}]}"#,
        );
        store.insert("models", "a.g01", "geometry");
        store.insert("models", "b.b02", "flow");
        let fs = RealFileSystem;
        let model_runner = ScriptedModelRunner::succeeding(Vec::<String>::new());
        let reporter = RecordingProgressReporter::new();

        let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
        let result = runner.run(&location()).await;

        assert!(matches!(result, Err(RunnerError::Naming(_))));
        assert!(model_runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_uploads_nothing() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path().to_path_buf());
        let store = InMemoryObjectStore::new();
        store.insert("models", "jobs/payload.json", PAYLOAD);
        store.insert("models", "models/basin.g01", "geometry");
        store.insert("models", "models/basin.b02", "flow");
        let fs = RealFileSystem;
        let model_runner = ScriptedModelRunner::failing(1, "boom\n");
        let reporter = RecordingProgressReporter::new();

        let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter);
        let result = runner.run(&location()).await;

        assert!(matches!(result, Err(RunnerError::Run { .. })));
        assert_eq!(
            store.requests(),
            vec![
                "GET s3://models/jobs/payload.json",
                "GET s3://models/models/basin.g01",
                "GET s3://models/models/basin.b02",
            ]
        );
    }

    #[tokio::test]
    async fn test_log_sink_attached_to_run_log() {
        let dir = tempdir().unwrap();
        let settings = settings(dir.path().to_path_buf());
        let store = InMemoryObjectStore::new();
        store.insert("models", "jobs/payload.json", PAYLOAD);
        store.insert("models", "models/basin.g01", "geometry");
        store.insert("models", "models/basin.b02", "flow");
        let fs = RealFileSystem;
        let model_runner = ScriptedModelRunner::failing(1, "");
        let reporter = RecordingProgressReporter::new();
        let sink = LogSink::new();

        let runner = Runner::new(&settings, &store, &fs, &model_runner, &reporter)
            .with_log_sink(sink.clone());
        let _ = runner.run(&location()).await;

        assert!(sink.detach().is_some());
        assert!(dir.path().join("basin.log").exists());
    }
}
