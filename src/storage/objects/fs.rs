//! Filesystem object store: one directory per bucket under a root.

use crate::storage::objects::{is_valid_object_name, Bucket, ObjectStore};
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.name())
    }

    fn object_path(&self, bucket: Bucket, name: &str) -> anyhow::Result<PathBuf> {
        if !is_valid_object_name(name) {
            return Err(anyhow::anyhow!("invalid object name '{}'", name));
        }
        Ok(self.bucket_dir(bucket).join(name))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn ensure_bucket(&self, bucket: Bucket) -> anyhow::Result<()> {
        let dir = self.bucket_dir(bucket);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating bucket directory {}", dir.display()))?;
        Ok(())
    }

    async fn list(&self, bucket: Bucket) -> anyhow::Result<Vec<String>> {
        let dir = self.bucket_dir(bucket);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("listing bucket '{}'", bucket.name()))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().to_str() {
                // In-flight writes are hidden dot files.
                Some(name) if !name.starts_with('.') => names.push(name.to_string()),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }

    async fn get(&self, bucket: Bucket, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.object_path(bucket, name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn put(&self, bucket: Bucket, name: &str, data: &[u8]) -> anyhow::Result<()> {
        let path = self.object_path(bucket, name)?;
        self.ensure_bucket(bucket).await?;

        // Write next to the target, then rename, so readers never see a partial object.
        let tmp = path.with_file_name(format!(".{}.partial", name));
        fs::write(&tmp, data)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("moving object into place at {}", path.display()))?;

        debug!(bucket = bucket.name(), object = name, size = data.len(), "object store: put");
        Ok(())
    }
}
