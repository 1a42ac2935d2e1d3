use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::llm::DEFAULT_MODEL;

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub model: String,
    /// When set, final item lists are also written here as timestamped JSON.
    pub digest_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let groq_api_key = env::var("GROQ_API_KEY").context(
            "GROQ_API_KEY not found.\n\n\
                To fix this, create ~/.config/newsletter-distill/.env with:\n  \
                GROQ_API_KEY=your_key_here\n\n\
                Get your API key from: https://console.groq.com/keys",
        )?;

        let model = env::var("DISTILL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let digest_dir = env::var("DIGEST_DIR").ok().map(PathBuf::from);

        Ok(Self {
            groq_api_key,
            model,
            digest_dir,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/newsletter-distill/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("newsletter-distill").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
