use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::services::generation::{GenerationError, TextGenerator};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl OpenAiProvider {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn first_completion(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| GenerationError::ResponseError("No choices in response".to_string()))
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GenerationError::EnvironmentError("OPENAI_API_KEY not set".to_string())
        })?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = self.endpoint();
        info!("Calling generation service model={} url={}", self.config.model, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(format!(
                        "no response after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    GenerationError::RequestError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(e.to_string())
            } else {
                GenerationError::RequestError(e.to_string())
            }
        })?;

        if !status.is_success() {
            error!("Generation service returned {}: {}", status, text);
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }
        debug!("Generation service response: {}", text);

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::ResponseError(format!("Unexpected response body: {}", e)))?;
        first_completion(parsed)
    }
}
