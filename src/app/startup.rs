//! Builds the service and its backends from configuration.

use crate::app::book_service::BookService;
use crate::infra::config::{CatalogConfig, Config, StorageConfig};
use crate::infra::llm::{ChatModel, OpenAiClient};
use crate::storage::catalog::{Catalog, MemoryCatalog, PgCatalog};
use crate::storage::objects::{FilesystemObjectStore, MemoryObjectStore, ObjectStore};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn build_service(config: &Config) -> anyhow::Result<BookService> {
    let catalog: Arc<dyn Catalog> = match &config.catalog {
        CatalogConfig::Postgres {
            database_url,
            max_connections,
        } => {
            info!(max_connections, "connecting to Postgres catalog");
            Arc::new(PgCatalog::connect(database_url, *max_connections).await?)
        }
        CatalogConfig::Memory => {
            warn!("using in-memory catalog; data is lost on restart");
            Arc::new(MemoryCatalog::new())
        }
    };

    let objects: Arc<dyn ObjectStore> = match &config.storage {
        StorageConfig::Filesystem { root } => {
            info!(root = %root.display(), "using filesystem object store");
            Arc::new(FilesystemObjectStore::new(root.clone()))
        }
        StorageConfig::Memory => {
            warn!("using in-memory object store; uploads are lost on restart");
            Arc::new(MemoryObjectStore::new())
        }
    };

    let llm: Option<Arc<dyn ChatModel>> = match &config.llm {
        Some(llm_config) => {
            info!(model = %llm_config.model, base_url = %llm_config.base_url, "language model configured");
            Some(Arc::new(OpenAiClient::new(llm_config)?))
        }
        None => {
            warn!("OPENAI_API_KEY not set; metadata extraction requests will fail");
            None
        }
    };

    let service = BookService::new(catalog, objects, llm, config.extraction.clone());
    service.ensure_buckets().await?;
    Ok(service)
}
