//! Gemini API Client
//!
//! Sends the Maps-grounded kebab lookup to Gemini and hands the answer to the
//! place extractor. One request per scan; no retries.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse};
use crate::ai::credentials::CredentialManager;
use crate::ai::extractor::extract_places;
use crate::ai::http_client::gemini_client;
use crate::ai::prompts::build_kebab_prompt;
use crate::ai::query::{PlaceQuery, QueryError};
use crate::config::GeminiConfig;
use crate::models::{Coordinates, Place};

/// Keychain entry holding the Gemini key
pub const CREDENTIAL_PROVIDER: &str = "gemini";

/// Gemini client implementing the place query
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    credential_provider: &'static str,
}

impl GeminiClient {
    /// Create a client on the shared connection pool
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(gemini_client().clone(), config)
    }

    pub fn with_client(client: Client, config: GeminiConfig) -> Self {
        Self {
            client,
            config,
            credential_provider: CREDENTIAL_PROVIDER,
        }
    }

    /// Look the key up under a different keychain entry
    pub fn with_credential_provider(mut self, provider: &'static str) -> Self {
        self.credential_provider = provider;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn api_key(&self) -> Result<String, QueryError> {
        CredentialManager::resolve_api_key(self.credential_provider, self.config.api_key.as_deref())
            .ok_or(QueryError::MissingCredential {
                provider: self.credential_provider,
            })
    }

    /// Send one `generateContent` request
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, QueryError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_error) => api_error.error.message,
                Err(_) => body,
            };
            return Err(QueryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| QueryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PlaceQuery for GeminiClient {
    async fn find_places(&self, coords: Coordinates) -> Result<Vec<Place>, QueryError> {
        let api_key = self.api_key().map_err(|e| {
            warn!(provider = self.credential_provider, "No Gemini API key configured");
            e
        })?;

        let request = GenerateContentRequest::maps_grounded(
            build_kebab_prompt(&coords),
            &coords,
            self.config.temperature,
        );

        info!(
            model = %self.config.model,
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Querying Gemini for nearest kebab"
        );

        let response = self.generate(&api_key, &request).await?;
        let text = response.text();
        let chunks = response.grounding_chunks();

        debug!(
            text_len = text.len(),
            chunks = chunks.map(|c| c.len()).unwrap_or(0),
            "Gemini response received"
        );

        let places = extract_places(&text, chunks);
        info!(found = places.len(), "Gemini answer parsed");
        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one canned HTTP response and hand back the raw request
    async fn serve_once(status: u16, body: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            // Read headers, then the declared body length
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());
        });

        (format!("http://{}", addr), rx)
    }

    fn test_config(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-api-key".to_string()),
            base_url,
            ..GeminiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_find_places_parses_grounded_answer() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Name: Ali Baba Kebab Haus\nAddress: 1 Ring\nDistance: 0.3 km\nReason: Legendary."}]},
                "groundingMetadata": {"groundingChunks": [
                    {"maps": {"uri": "https://maps.google.com/?cid=42", "title": "Ali Baba"}}
                ]}
            }]
        })
        .to_string();
        let (base_url, request_rx) = serve_once(200, body).await;

        let client = GeminiClient::with_client(Client::new(), test_config(base_url));
        let places = client
            .find_places(Coordinates::new(50.11, 8.68))
            .await
            .unwrap();

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Ali Baba");
        assert_eq!(places[0].distance, "0.3 km");
        assert_eq!(places[0].uri.as_deref(), Some("https://maps.google.com/?cid=42"));

        let request = request_rx.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-api-key"));
        assert!(request.contains("\"googleMaps\":{}"));
        assert!(request.contains("\"latitude\":50.11"));
    }

    #[tokio::test]
    async fn test_find_places_returns_empty_without_name() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "Sorry, nothing open nearby."}]}}]
        })
        .to_string();
        let (base_url, _rx) = serve_once(200, body).await;

        let client = GeminiClient::with_client(Client::new(), test_config(base_url));
        let places = client.find_places(Coordinates::new(0.0, 0.0)).await.unwrap();
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let body = json!({"error": {"code": 403, "message": "Permission denied.", "status": "PERMISSION_DENIED"}})
            .to_string();
        let (base_url, _rx) = serve_once(403, body).await;

        let client = GeminiClient::with_client(Client::new(), test_config(base_url));
        let err = client
            .find_places(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();

        match err {
            QueryError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (base_url, _rx) = serve_once(200, "not json".to_string()).await;

        let client = GeminiClient::with_client(Client::new(), test_config(base_url));
        let err = client
            .find_places(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_is_distinguishable() {
        let config = GeminiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config)
            .with_credential_provider("kebab-compass-test-missing-credential");

        let err = client
            .find_places(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(err.is_missing_credential());
    }
}
