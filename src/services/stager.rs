// src/services/stager.rs
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    domain::{errors::RunnerError, payload::ResourceLink},
    ports::{filesystem::FileSystem, object_store::ObjectStore},
};

/// Downloads payload inputs into the model directory
pub struct Stager<'a> {
    store: &'a dyn ObjectStore,
    fs: &'a dyn FileSystem,
    bucket: &'a str,
    model_dir: &'a Path,
}

impl<'a> Stager<'a> {
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

    /// Stage every input in order, stopping at the first failure.
    /// Returns the local paths written.
    pub async fn stage(&self, inputs: &[ResourceLink]) -> Result<Vec<PathBuf>, RunnerError> {
        self.fs
            .create_dir_all(self.model_dir)
            .map_err(|e| RunnerError::transfer(self.model_dir, e))?;

        let mut staged = Vec::with_capacity(inputs.len());
        for link in inputs {
            let bucket = link.bucket_or(self.bucket);
            let body = self
                .store
                .get_object(bucket, &link.key)
                .await
                .map_err(|e| RunnerError::retrieval(bucket, &link.key, e))?;

            let path = self.model_dir.join(link.file_name());
            self.fs
                .write_file(&path, &body)
                .map_err(|e| RunnerError::transfer(&path, e))?;

            info!("downloaded s3://{bucket}/{} to {}", link.key, path.display());
            staged.push(path);
        }

        Ok(staged)
    }
}
