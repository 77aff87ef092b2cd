mod client;
mod config;
mod wire;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

pub use client::PineconeRepository;
pub use config::{DEFAULT_API_VERSION, DEFAULT_CONTROLLER_URL, PineconeConfig};

use crate::error::{VectorError, VectorResult};

/// HTTP client carrying the Pinecone auth and API-version headers
pub(crate) fn http_client(config: &PineconeConfig) -> VectorResult<Client> {
    let mut headers = HeaderMap::new();

    let mut api_key = HeaderValue::from_str(&config.api_key)
        .map_err(|_| VectorError::Config("PINECONE_API contains invalid characters".to_string()))?;
    api_key.set_sensitive(true);
    headers.insert("Api-Key", api_key);

    let version = HeaderValue::from_str(&config.api_version)
        .map_err(|_| VectorError::Config("Invalid Pinecone API version".to_string()))?;
    headers.insert("X-Pinecone-API-Version", version);

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_rejects_header_breaking_key() {
        let config = PineconeConfig::new("bad\nkey".to_string());
        assert!(matches!(http_client(&config), Err(VectorError::Config(_))));
    }

    #[test]
    fn test_http_client_builds() {
        let config = PineconeConfig::new("pc-key".to_string()).with_timeout(5);
        assert!(http_client(&config).is_ok());
    }
}
