use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://wellnest-three.vercel.app";

/// Application configuration loaded from environment variables.
///
/// API keys are NOT required at startup. A missing key surfaces as an
/// authentication failure on the first call to the provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub google_api_key: String,
    pub host: String,
    pub port: u16,
    pub corpus_dir: PathBuf,
    pub corpus_file: String,
    pub allowed_origin: String,
    pub llm_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: optional_env("GROQ_API_KEY", ""),
            google_api_key: optional_env("GOOGLE_API_KEY", ""),
            host: optional_env("HOST", "0.0.0.0"),
            port: optional_env("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            corpus_dir: PathBuf::from(optional_env("CORPUS_DIR", ".")),
            corpus_file: optional_env("CORPUS_FILE", "trydata.txt"),
            allowed_origin: optional_env("ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
            llm_timeout_secs: optional_env("LLM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
