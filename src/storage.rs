//! Object storage locations (S3, R2, GCS, Azure, local filesystem)
//!
//! A [`StorageLocation`] is an object store plus a key prefix inside it.
//! Sources and destinations are both addressed this way; every object path
//! handed out by this module already includes the prefix.

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Where a location string points
enum Target {
    Cloud(Url),
    Local(PathBuf),
}

/// Normalised identity of a location
///
/// Different spellings of one place (`/data/raw`, `file:///data/raw`,
/// `./raw` from `/data`) produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKey {
    Local(PathBuf),
    Cloud {
        scheme: String,
        bucket: String,
        prefix: ObjectPath,
    },
}

impl LocationKey {
    /// Normalise a location string without opening it
    pub fn parse(location: &str) -> Result<Self> {
        match classify(location)? {
            Target::Local(path) => Ok(LocationKey::Local(canonical_local(&path)?)),
            Target::Cloud(url) => {
                let (bucket, prefix) = bucket_and_prefix(&url, location)?;
                Ok(LocationKey::Cloud {
                    scheme: url.scheme().to_string(),
                    bucket: bucket.to_string(),
                    prefix,
                })
            }
        }
    }

    /// Whether one location equals or contains the other
    pub fn overlaps(&self, other: &LocationKey) -> bool {
        match (self, other) {
            (LocationKey::Local(a), LocationKey::Local(b)) => a.starts_with(b) || b.starts_with(a),
            (
                LocationKey::Cloud {
                    scheme: scheme_a,
                    bucket: bucket_a,
                    prefix: prefix_a,
                },
                LocationKey::Cloud {
                    scheme: scheme_b,
                    bucket: bucket_b,
                    prefix: prefix_b,
                },
            ) => {
                scheme_a == scheme_b
                    && bucket_a == bucket_b
                    && (prefix_a.prefix_match(prefix_b).is_some()
                        || prefix_b.prefix_match(prefix_a).is_some())
            }
            _ => false,
        }
    }
}

/// Object store plus key prefix, parsed from a URL
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix within the bucket/container
    prefix: ObjectPath,
    /// URL scheme (s3, r2, gs, az, file)
    scheme: String,
    /// Location as given by the user
    url: String,
}

impl StorageLocation {
    /// Wrap an existing store
    pub fn new(
        store: Arc<dyn ObjectStore>,
        prefix: ObjectPath,
        scheme: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            prefix,
            scheme: scheme.into(),
            url: url.into(),
        }
    }

    /// Open a location for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (endpoint from `R2_ENDPOINT_URL`)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///path` or `/local/path/` - Local filesystem
    ///
    /// A local path must exist. A local file is opened as a single-object
    /// location.
    pub fn source(location: &str) -> Result<Self> {
        match classify(location)? {
            Target::Cloud(url) => open_cloud(&url, location),
            Target::Local(path) => {
                if !path.exists() {
                    return Err(Error::source_unavailable(location, "path does not exist"));
                }

                let (root, prefix) = if path.is_file() {
                    let parent = match path.parent() {
                        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                        _ => PathBuf::from("."),
                    };
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .ok_or_else(|| Error::invalid_value("source_location", location))?;
                    (parent, ObjectPath::from(name))
                } else {
                    (path, ObjectPath::default())
                };

                open_local(&root, prefix, location)
                    .map_err(|e| Error::source_unavailable(location, e.to_string()))
            }
        }
    }

    /// Open a location for writing, creating local directories as needed
    pub fn destination(location: &str) -> Result<Self> {
        match classify(location)? {
            Target::Cloud(url) => open_cloud(&url, location),
            Target::Local(path) => {
                std::fs::create_dir_all(&path).map_err(|e| {
                    Error::destination_unavailable(
                        location,
                        format!("failed to create directory: {e}"),
                    )
                })?;
                open_local(&path, ObjectPath::default(), location)
                    .map_err(|e| Error::destination_unavailable(location, e.to_string()))
            }
        }
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// The location as given by the user
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prefix(&self) -> &ObjectPath {
        &self.prefix
    }

    /// Object path for a key relative to the prefix
    ///
    /// The key is taken verbatim, so `%XX` escapes survive.
    pub fn child(&self, relative: &str) -> Result<ObjectPath> {
        let relative = relative.trim_matches('/');
        let joined = if self.prefix.as_ref().is_empty() {
            relative.to_string()
        } else if relative.is_empty() {
            self.prefix.to_string()
        } else {
            format!("{}/{relative}", self.prefix)
        };

        ObjectPath::parse(&joined)
            .map_err(|e| Error::output(format!("Invalid object path '{joined}': {e}")))
    }

    /// Key of an object relative to the prefix
    ///
    /// For a single-object location this is the object's file name.
    pub fn relative(&self, path: &ObjectPath) -> String {
        let relative = path
            .prefix_match(&self.prefix)
            .map(|parts| {
                parts
                    .map(|p| p.as_ref().to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|| path.to_string());

        if relative.is_empty() {
            path.filename().unwrap_or_default().to_string()
        } else {
            relative
        }
    }

    /// Full URL of an object, for logs and reports
    pub fn display(&self, path: &ObjectPath) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.relative(path)
        )
    }

    /// List every object under the prefix, sorted by path
    ///
    /// If nothing is listed but the prefix itself names an object, that
    /// object is returned alone.
    pub async fn list(&self) -> object_store::Result<Vec<ObjectMeta>> {
        let prefix = (!self.prefix.as_ref().is_empty()).then_some(&self.prefix);
        let mut objects: Vec<ObjectMeta> = self.store.list(prefix).try_collect().await?;

        if objects.is_empty() && prefix.is_some() {
            match self.store.head(&self.prefix).await {
                Ok(meta) => objects.push(meta),
                Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        objects.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(objects)
    }

    /// List the objects under a key relative to the prefix
    pub async fn list_under(&self, relative: &str) -> Result<Vec<ObjectMeta>> {
        let dir = self.child(relative)?;
        let prefix = (!dir.as_ref().is_empty()).then_some(&dir);
        self.store
            .list(prefix)
            .try_collect()
            .await
            .map_err(|e| Error::destination_unavailable(self.display(&dir), e.to_string()))
    }

    /// Fetch the full contents of an object
    pub async fn get(&self, path: &ObjectPath) -> object_store::Result<Bytes> {
        self.store.get(path).await?.bytes().await
    }

    /// Write bytes to a key relative to the prefix
    pub async fn put(&self, relative: &str, data: Bytes) -> Result<ObjectPath> {
        let path = self.child(relative)?;

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::destination_unavailable(self.display(&path), e.to_string()))?;

        debug!(path = %path, "Object written");
        Ok(path)
    }

    /// Delete every object under a key relative to the prefix
    pub async fn delete_prefix(&self, relative: &str) -> Result<usize> {
        let objects = self.list_under(relative).await?;

        for meta in &objects {
            self.store.delete(&meta.location).await.map_err(|e| {
                Error::destination_unavailable(self.display(&meta.location), e.to_string())
            })?;
        }

        if !objects.is_empty() {
            debug!(prefix = relative, count = objects.len(), "Objects deleted");
        }
        Ok(objects.len())
    }
}

/// Decide whether a location string is a cloud URL or a local path
fn classify(location: &str) -> Result<Target> {
    if location.trim().is_empty() {
        return Err(Error::invalid_value("location", "must not be empty"));
    }

    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map(Target::Local).map_err(|()| {
            Error::invalid_value("location", format!("Invalid file URL: {location}"))
        }),
        Ok(url) if matches!(url.scheme(), "s3" | "r2" | "gs" | "az") => Ok(Target::Cloud(url)),
        // Single letters are Windows drive prefixes
        Ok(url) if url.scheme().len() > 1 => Err(Error::invalid_value(
            "location",
            format!("Unsupported scheme '{}' in {location}", url.scheme()),
        )),
        _ => Ok(Target::Local(PathBuf::from(location))),
    }
}

fn bucket_and_prefix<'u>(url: &'u Url, location: &str) -> Result<(&'u str, ObjectPath)> {
    let bucket = url
        .host_str()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::invalid_value("location", format!("Missing bucket in {location}")))?;
    let prefix = ObjectPath::from_url_path(url.path())
        .map_err(|e| Error::invalid_value("location", format!("{location}: {e}")))?;
    Ok((bucket, prefix))
}

/// Absolute local path with `.`/`..` removed and symlinks resolved as far
/// as the path exists
fn canonical_local(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| {
                Error::invalid_value("location", format!("cannot resolve {}: {e}", path.display()))
            })?
            .join(path)
    };

    let mut normal = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other.as_os_str()),
        }
    }

    let mut existing = normal.as_path();
    let mut missing: Vec<&OsStr> = Vec::new();
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            return Ok(missing
                .iter()
                .rev()
                .fold(resolved, |path, part| path.join(part)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(normal.clone()),
        }
    }
}

/// Build an S3, R2, GCS or Azure store from environment credentials
fn open_cloud(url: &Url, location: &str) -> Result<StorageLocation> {
    let scheme = url.scheme();
    let (bucket, prefix) = bucket_and_prefix(url, location)?;

    let client_error =
        |e: object_store::Error| Error::config(format!("Failed to create {scheme} client: {e}"));

    let store: Arc<dyn ObjectStore> = match scheme {
        "s3" | "r2" => {
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
            if scheme == "r2" {
                if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                    builder = builder.with_endpoint(endpoint);
                }
            }
            Arc::new(builder.build().map_err(client_error)?)
        }
        "gs" => Arc::new(
            GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(client_error)?,
        ),
        _ => Arc::new(
            MicrosoftAzureBuilder::from_env()
                .with_container_name(bucket)
                .build()
                .map_err(client_error)?,
        ),
    };

    Ok(StorageLocation::new(store, prefix, scheme, location))
}

fn open_local(
    root: &Path,
    prefix: ObjectPath,
    location: &str,
) -> object_store::Result<StorageLocation> {
    let store = LocalFileSystem::new_with_prefix(root)?;
    Ok(StorageLocation::new(Arc::new(store), prefix, "file", location))
}
