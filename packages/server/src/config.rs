use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// When set, jobs are stored in Postgres; otherwise in process memory
    pub database_url: Option<String>,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    /// Cap on concurrent profile fetches across all jobs
    pub fetch_concurrency: usize,
    pub generation_timeout_secs: u64,
    /// How long finished jobs are retained before eviction
    pub job_ttl_hours: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_url: env::var("DATABASE_URL").ok(),
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL").ok(),
            fetch_concurrency: env::var("FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("FETCH_CONCURRENCY must be a valid number")?,
            generation_timeout_secs: env::var("GENERATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("GENERATION_TIMEOUT_SECS must be a valid number")?,
            job_ttl_hours: env::var("JOB_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("JOB_TTL_HOURS must be a valid number")?,
        })
    }
}
