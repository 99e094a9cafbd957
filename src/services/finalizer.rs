// src/services/finalizer.rs
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    domain::{errors::RunnerError, payload::ResourceLink},
    ports::{filesystem::FileSystem, object_store::ObjectStore},
};

const TMP_MARKER: &str = ".tmp";

/// Content type for an output file; `.log` files are always plain text
pub fn content_type_for(path: &Path) -> String {
    if path.extension().is_some_and(|ext| ext == "log") {
        return "text/plain".to_string();
    }
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// File name with its first `.tmp` removed, if it has one
fn strip_tmp_marker(file_name: &str) -> Option<String> {
    file_name
        .find(TMP_MARKER)
        .map(|i| format!("{}{}", &file_name[..i], &file_name[i + TMP_MARKER.len()..]))
}

/// Publishes the model's results once it has exited cleanly
pub struct Finalizer<'a> {
    store: &'a dyn ObjectStore,
    fs: &'a dyn FileSystem,
    bucket: &'a str,
    model_dir: &'a Path,
}

impl<'a> Finalizer<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        fs: &'a dyn FileSystem,
        bucket: &'a str,
        model_dir: &'a Path,
    ) -> Self {
        Self {
            store,
            fs,
            bucket,
            model_dir,
        }
    }

    /// Rename every `*.tmp*` file below the model directory. Returns the new paths.
    pub fn strip_tmp_markers(&self) -> Result<Vec<PathBuf>, RunnerError> {
        let files = self
            .fs
            .list_files(self.model_dir)
            .map_err(|e| RunnerError::transfer(self.model_dir, e))?;

        let mut renamed = Vec::new();
        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(new_name) = strip_tmp_marker(file_name) else {
                continue;
            };

            let target = path.with_file_name(new_name);
            self.fs
                .rename(&path, &target)
                .map_err(|e| RunnerError::transfer(&path, e))?;
            debug!(from = %path.display(), to = %target.display(), "renamed temporary output");
            renamed.push(target);
        }

        Ok(renamed)
    }

    /// Upload each declared output in order, stopping at the first failure
    pub async fn upload(&self, outputs: &[ResourceLink]) -> Result<(), RunnerError> {
        for link in outputs {
            let path = self.model_dir.join(link.file_name());
            let body = self
                .fs
                .read_file(&path)
                .map_err(|e| RunnerError::transfer(&path, e))?;

            let bucket = link.bucket_or(self.bucket);
            let content_type = content_type_for(&path);
            self.store
                .put_object(bucket, &link.key, body, &content_type)
                .await
                .map_err(|e| RunnerError::transfer(&path, e))?;

            info!("uploaded {} to s3://{bucket}/{}", path.display(), link.key);
        }

        Ok(())
    }
}
