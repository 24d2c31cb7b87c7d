//! Object store for uploaded PDFs and exported CSVs.

use async_trait::async_trait;

pub mod fs;
pub mod memory;

pub use fs::FilesystemObjectStore;
pub use memory::MemoryObjectStore;

/// Storage namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Uploaded book PDFs.
    Books,
    /// Exported question CSVs.
    Output,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Books, Bucket::Output];

    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Books => "books",
            Bucket::Output => "output",
        }
    }

    /// Maximum object size in bytes.
    pub fn size_limit(&self) -> usize {
        match self {
            Bucket::Books => 50 * 1024 * 1024,
            Bucket::Output => 10 * 1024 * 1024,
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates the bucket if needed. An existing bucket is not an error.
    async fn ensure_bucket(&self, bucket: Bucket) -> anyhow::Result<()>;

    /// Object names in the bucket, sorted alphabetically.
    async fn list(&self, bucket: Bucket) -> anyhow::Result<Vec<String>>;

    /// Reads an object; `Ok(None)` if it does not exist.
    async fn get(&self, bucket: Bucket, name: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Writes an object, replacing any existing one with the same name.
    async fn put(&self, bucket: Bucket, name: &str, data: &[u8]) -> anyhow::Result<()>;
}

/// Object names are flat: no separators and no leading dot.
pub fn is_valid_object_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
