// src/ports/object_store.rs
// Object storage port (interface)

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the object store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("No such object: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object store unreachable: {0}")]
    Unreachable(String),

    #[error("Object transfer failed: {0}")]
    Transfer(String),
}

/// Port for object storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of an object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store an object, replacing any existing one
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Object stored by [`InMemoryObjectStore`]
    #[derive(Debug, Clone, PartialEq)]
    pub struct StoredObject {
        pub body: Vec<u8>,
        pub content_type: Option<String>,
    }

    /// Object store kept in memory, for tests and dry runs
    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: Mutex<HashMap<(String, String), StoredObject>>,
        requests: Mutex<Vec<String>>,
    }

    impl InMemoryObjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
            if let Ok(mut objects) = self.objects.lock() {
                objects.insert(
                    (bucket.to_string(), key.to_string()),
                    StoredObject {
                        body: body.into(),
                        content_type: None,
                    },
                );
            }
        }

        pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .ok()?
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
        }

        /// Requests seen so far, as `GET s3://bucket/key` / `PUT s3://bucket/key`
        pub fn requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .map(|requests| requests.clone())
                .unwrap_or_default()
        }

        fn record(&self, method: &str, bucket: &str, key: &str) {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(format!("{method} s3://{bucket}/{key}"));
            }
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.record("GET", bucket, key);
            self.object(bucket, key)
                .map(|object| object.body)
                .ok_or_else(|| StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
        }

        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            self.record("PUT", bucket, key);
            let mut objects = self
                .objects
                .lock()
                .map_err(|e| StorageError::Transfer(e.to_string()))?;
            objects.insert(
                (bucket.to_string(), key.to_string()),
                StoredObject {
                    body,
                    content_type: Some(content_type.to_string()),
                },
            );
            Ok(())
        }
    }
}
