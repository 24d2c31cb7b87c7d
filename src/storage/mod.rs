pub mod catalog;
pub mod objects;

pub use catalog::{Catalog, MemoryCatalog, PgCatalog, ReportUpdate};
pub use objects::{Bucket, FilesystemObjectStore, MemoryObjectStore, ObjectStore};
