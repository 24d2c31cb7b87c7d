//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Filesystem { root: PathBuf },
    Memory,
}

#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

// Keeps the key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Knobs for metadata extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Surface unparsable model replies as errors instead of storing the fallback triple.
    pub strict_parse: bool,
    pub excerpt_pages: usize,
    pub excerpt_max_chars: usize,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            strict_parse: false,
            excerpt_pages: 3,
            excerpt_max_chars: 4000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    /// `None` when `OPENAI_API_KEY` is unset; extraction then fails per request.
    pub llm: Option<LlmConfig>,
    pub extraction: ExtractionOptions,
}

impl Config {
    /// Reads configuration from the process environment (after loading `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let catalog = match var("CATALOG_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => CatalogConfig::Postgres {
                database_url: var("DATABASE_URL")
                    .context("DATABASE_URL must be set when CATALOG_BACKEND=postgres")?,
                max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), 5, "DATABASE_MAX_CONNECTIONS")?,
            },
            "memory" => CatalogConfig::Memory,
            other => anyhow::bail!("CATALOG_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("fs") {
            "fs" => StorageConfig::Filesystem {
                root: PathBuf::from(var("STORAGE_ROOT").unwrap_or_else(|| "./storage".to_string())),
            },
            "memory" => StorageConfig::Memory,
            other => anyhow::bail!("STORAGE_BACKEND must be 'fs' or 'memory', got '{}'", other),
        };

        let llm = match var("OPENAI_API_KEY") {
            Some(api_key) => Some(LlmConfig {
                api_key,
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                timeout: Duration::from_secs(parse_or(var("LLM_TIMEOUT_SECS"), 60, "LLM_TIMEOUT_SECS")?),
            }),
            None => None,
        };

        let defaults = ExtractionOptions::default();
        let extraction = ExtractionOptions {
            strict_parse: parse_bool(var("METADATA_STRICT_PARSE"), "METADATA_STRICT_PARSE")?,
            excerpt_pages: parse_or(var("EXCERPT_PAGES"), defaults.excerpt_pages, "EXCERPT_PAGES")?.max(1),
            excerpt_max_chars: parse_or(var("EXCERPT_MAX_CHARS"), defaults.excerpt_max_chars, "EXCERPT_MAX_CHARS")?
                .max(1),
        };

        Ok(Self {
            bind_addr,
            catalog,
            storage,
            llm,
            extraction,
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, v, e)),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, key: &str) -> anyhow::Result<bool> {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => anyhow::bail!("{} must be a boolean, got '{}'", key, other),
    }
}
