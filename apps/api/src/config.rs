use anyhow::{Context, Result};

use crate::ingest::chunker::ChunkStrategy;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub qdrant_collection: String,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub max_upload_size_mb: usize,
    pub default_chunk_strategy: ChunkStrategy,
    pub session_ttl_secs: u64,
    /// Raw uploads are archived only when `S3_BUCKET` is set.
    pub s3: Option<S3Config>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let openai_api_key = require_env("OPENAI_API_KEY")?;

        // Groq and OpenAI both speak the chat completions protocol.
        let llm_api_key = optional_env("LLM_API_KEY")
            .or_else(|| optional_env("GROQ_API_KEY"))
            .unwrap_or_else(|| openai_api_key.clone());

        let s3 = match optional_env("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: env_or("REDIS_URL", "redis://localhost:6379/0"),
            qdrant_url: require_env("QDRANT_URL")?,
            qdrant_api_key: optional_env("QDRANT_API_KEY"),
            qdrant_collection: env_or("QDRANT_COLLECTION", "documents"),
            embedding: EmbeddingConfig {
                api_url: env_or("EMBEDDING_API_URL", DEFAULT_OPENAI_URL),
                api_key: openai_api_key,
                model: env_or("EMBEDDING_MODEL", "text-embedding-3-large"),
                dimensions: parse_env("EMBEDDING_DIM", 3072)?,
            },
            llm: LlmConfig {
                api_url: env_or("LLM_API_URL", DEFAULT_OPENAI_URL),
                api_key: llm_api_key,
                model: env_or("LLM_MODEL", "gpt-4o-mini"),
            },
            max_upload_size_mb: parse_env("MAX_UPLOAD_SIZE_MB", 10)?,
            default_chunk_strategy: env_or("DEFAULT_CHUNK_STRATEGY", "fixed")
                .parse()
                .context("DEFAULT_CHUNK_STRATEGY is invalid")?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 60 * 60 * 24 * 30)?,
            s3,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
