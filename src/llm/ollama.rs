//! Blocking client for Ollama's chat endpoint.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{LanguageModel, LlmConfig, ModelServiceError};

/// Non-streaming `/api/chat` client.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaClient {
    /// Build a client for the configured server and model.
    pub fn new(config: &LlmConfig) -> Result<Self, ModelServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&config.base_url),
            model: config.model.clone(),
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String, ModelServiceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        log::debug!("Posting prompt to {} ({} chars)", self.endpoint, prompt.len());
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ModelServiceError::Unavailable(format!("{}: {}", self.endpoint, e))
                } else {
                    ModelServiceError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| ModelServiceError::InvalidResponse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(ModelServiceError::InvalidResponse(error));
        }
        body.message
            .map(|m| m.content)
            .ok_or_else(|| ModelServiceError::InvalidResponse("response has no message".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_endpoint_joins_path() {
        assert_eq!(
            chat_endpoint("http://localhost:11434"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            chat_endpoint("http://localhost:11434/"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "tinyllama:1.1b",
            messages: [ChatMessage {
                role: "user",
                content: "hello",
            }],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "tinyllama:1.1b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_client_uses_config() {
        let config = LlmConfig {
            base_url: "http://example.invalid:1234/".to_string(),
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://example.invalid:1234/api/chat");
        assert_eq!(client.name(), "tinyllama:1.1b");
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: Some(2),
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert!(client.complete("ping").is_err());
    }
}
