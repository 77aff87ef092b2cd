use core_config::{env_or_default, env_parse_or_default, env_required};

use crate::error::VectorResult;

pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_API_VERSION: &str = "2025-01";

/// Pinecone connection configuration
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Control-plane base URL; data-plane hosts are discovered per index
    pub controller_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_controller_url(mut self, url: String) -> Self {
        self.controller_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> VectorResult<Self> {
        let api_key = env_required("PINECONE_API")?;

        let controller_url = env_or_default("PINECONE_CONTROLLER_URL", DEFAULT_CONTROLLER_URL)
            .trim_end_matches('/')
            .to_string();

        let api_version = env_or_default("PINECONE_API_VERSION", DEFAULT_API_VERSION);

        let timeout_secs = env_parse_or_default("PINECONE_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_key,
            controller_url,
            api_version,
            timeout_secs,
        })
    }
}

// Keeps the API key out of logs and error reports
impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"***")
            .field("controller_url", &self.controller_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
