use book_question_pipeline::infra::config::{CatalogConfig, StorageConfig};
use book_question_pipeline::storage::objects::Bucket;
use book_question_pipeline::{build_service, Config};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads the same env vars as api_server:\n\
           CATALOG_BACKEND, DATABASE_URL, STORAGE_BACKEND, STORAGE_ROOT,\n\
           OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Fails with a readable message on bad or missing values.
    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  BIND_ADDR={}", config.bind_addr);
    match &config.catalog {
        CatalogConfig::Postgres { max_connections, .. } => {
            println!("  Catalog: postgres (max_connections={})", max_connections)
        }
        CatalogConfig::Memory => println!("  Catalog: memory (not persisted)"),
    }
    match &config.storage {
        StorageConfig::Filesystem { root } => println!("  Storage: filesystem at {}", root.display()),
        StorageConfig::Memory => println!("  Storage: memory (not persisted)"),
    }
    match &config.llm {
        Some(llm) => println!("  LLM: {} via {}", llm.model, llm.base_url),
        None => eprintln!("  Warning: OPENAI_API_KEY not set; metadata extraction will fail."),
    }
    println!(
        "  Extraction: strict_parse={} excerpt_pages={} excerpt_max_chars={}",
        config.extraction.strict_parse, config.extraction.excerpt_pages, config.extraction.excerpt_max_chars
    );

    // Connects, creates tables and buckets.
    let service = build_service(&config).await?;
    let names: Vec<&str> = Bucket::ALL.iter().map(|b| b.name()).collect();
    println!("  Buckets ensured: {}", names.join(", "));

    service
        .health()
        .await
        .map_err(|e| anyhow::anyhow!("Health check failed: {:#}", e))?;
    println!("  Catalog and object store reachable.");

    println!("> Preflight OK");
    Ok(())
}
