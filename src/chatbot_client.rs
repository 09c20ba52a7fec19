use std::env;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Path of the chatbot route, appended verbatim to the endpoint base URL.
pub const CHATBOT_PATH: &str = "/api/rag-agent/chatbot";

/// Body posted to the chatbot route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatbotRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Successful reply from the chatbot route. Every field is optional; the
/// caller decides what a missing field means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatbotResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("chatbot endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request to chatbot endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed chatbot response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct ChatbotClient {
    endpoint_url: String,
    client: reqwest::Client,
}

impl ChatbotClient {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds a client from `ENDPOINT_URL`. A missing variable is not fatal:
    /// the base is left empty and requests fail when they are sent.
    pub fn from_env() -> Self {
        let endpoint_url = env::var("ENDPOINT_URL").unwrap_or_else(|_| {
            warn!("ENDPOINT_URL environment variable not set");
            String::new()
        });

        Self::new(endpoint_url)
    }

    pub fn chatbot_url(&self) -> String {
        format!("{}{}", self.endpoint_url, CHATBOT_PATH)
    }

    pub async fn send(&self, request: &ChatbotRequest) -> Result<ChatbotResponse, ChatbotError> {
        let url = self.chatbot_url();

        debug!("Sending request to {}: {:?}", url, request);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatbotError::Status { status, body });
        }

        // Structs also deserialize from JSON arrays; only an object is a valid body.
        let bytes = response.bytes().await?;
        let body: Map<String, Value> = serde_json::from_slice(&bytes)?;
        let parsed: ChatbotResponse = serde_json::from_value(Value::Object(body))?;

        debug!("Received response from chatbot endpoint: {:?}", parsed);

        Ok(parsed)
    }
}
