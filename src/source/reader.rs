//! Reading records from an object-store location

use super::decoder::JsonDocumentDecoder;
use crate::error::{Error, Result};
use crate::storage::StorageLocation;
use crate::types::{RecordOrigin, SourcedRecord};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use tracing::{debug, info, warn};

/// Default number of objects fetched concurrently
pub const DEFAULT_READ_CONCURRENCY: usize = 8;

/// Everything read from a source in one pass
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Records in object order, then document order
    pub records: Vec<SourcedRecord>,
    /// Number of objects decoded
    pub objects_read: usize,
    /// Total bytes fetched
    pub bytes_read: usize,
}

/// A readable collection of JSON records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Location, for logs and errors
    fn location(&self) -> &str;

    /// Read and decode every record
    ///
    /// Fails on the first unreachable object or malformed document.
    async fn read_all(&self) -> Result<SourceBatch>;
}

/// Source backed by an object-store prefix
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    location: StorageLocation,
    concurrency: usize,
    decoder: JsonDocumentDecoder,
}

impl ObjectStoreSource {
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            concurrency: DEFAULT_READ_CONCURRENCY,
            decoder: JsonDocumentDecoder::new(),
        }
    }

    /// Set how many objects are fetched at once
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn fetch(&self, path: &ObjectPath) -> Result<(String, Bytes)> {
        let name = self.location.relative(path);
        let data = self
            .location
            .get(path)
            .await
            .map_err(|e| Error::source_unavailable(self.location.display(path), e.to_string()))?;
        debug!(object = %name, bytes = data.len(), "Object fetched");
        Ok((name, data))
    }
}

#[async_trait]
impl RecordSource for ObjectStoreSource {
    fn location(&self) -> &str {
        self.location.url()
    }

    async fn read_all(&self) -> Result<SourceBatch> {
        let listed = self
            .location
            .list()
            .await
            .map_err(|e| Error::source_unavailable(self.location.url(), e.to_string()))?;

        let paths: Vec<ObjectPath> = listed
            .into_iter()
            .map(|meta| meta.location)
            .filter(|path| !is_hidden(path))
            .collect();

        info!(
            location = %self.location.url(),
            objects = paths.len(),
            "Source objects listed"
        );
        if paths.is_empty() {
            warn!(location = %self.location.url(), "Source location has no objects");
        }

        let fetched: Vec<(String, Bytes)> = futures::stream::iter(paths)
            .map(|path| async move { self.fetch(&path).await })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut batch = SourceBatch::default();
        for (name, data) in fetched {
            let records = self.decoder.decode(&name, &data)?;
            debug!(object = %name, records = records.len(), "Object decoded");

            batch.bytes_read += data.len();
            batch.objects_read += 1;
            batch.records.extend(
                records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| SourcedRecord::new(RecordOrigin::new(name.clone(), i), record)),
            );
        }

        info!(
            objects = batch.objects_read,
            records = batch.records.len(),
            bytes = batch.bytes_read,
            "Source read"
        );
        Ok(batch)
    }
}

/// Commit markers and hidden files
fn is_hidden(path: &ObjectPath) -> bool {
    path.filename()
        .is_some_and(|name| name.starts_with('_') || name.starts_with('.'))
}
