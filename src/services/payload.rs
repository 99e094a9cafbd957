// src/services/payload.rs
use tracing::{debug, info};

use crate::{
    domain::{
        errors::RunnerError,
        payload::{Payload, PayloadFormat, PayloadLocation},
    },
    ports::object_store::ObjectStore,
};

/// Fetches the job payload and turns it into a [`Payload`]
pub struct PayloadSource<'a> {
    store: &'a dyn ObjectStore,
    format: PayloadFormat,
}

impl<'a> PayloadSource<'a> {
    pub fn new(store: &'a dyn ObjectStore, format: PayloadFormat) -> Self {
        Self { store, format }
    }

    pub async fn load(
        &self,
        location: &PayloadLocation,
        default_bucket: &str,
    ) -> Result<Payload, RunnerError> {
        let bucket = location.bucket.as_deref().unwrap_or(default_bucket);

        let body = self
            .store
            .get_object(bucket, &location.key)
            .await
            .map_err(|e| RunnerError::retrieval(bucket, &location.key, e))?;

        let format = self.format.detect(&location.key, &body);
        debug!(%format, key = %location.key, "parsing payload");

        let payload =
            Payload::from_slice(format, &body).map_err(|e| RunnerError::Parse(e.to_string()))?;

        info!(
            inputs = payload.inputs.len(),
            outputs = payload.outputs.len(),
            "loaded payload s3://{bucket}/{}",
            location.key
        );
        Ok(payload)
    }
}
