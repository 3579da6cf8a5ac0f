use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::advisor::error::AdvisorError;

pub const TRUNCATION_MARKER: &str = "\n...(content truncated)";

/// Source of free-form remediation text for a failure description.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, prompt: &str) -> Result<String, AdvisorError>;
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_api_key_env() -> String {
    "API_KEY".to_string()
}
fn default_max_prompt_length() -> usize {
    2000
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.1
}
fn default_timeout_ms() -> u64 {
    60_000
}
fn default_system_messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system(
        "You are an assistant debugging failing Playwright tests. Analyse the error and \
         propose concrete fixes, including the Playwright calls to perform.",
    )]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token. Unset means no auth header.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_prompt_length")]
    pub max_prompt_length: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_system_messages")]
    pub system_messages: Vec<ChatMessage>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_prompt_length: default_max_prompt_length(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            system_messages: default_system_messages(),
        }
    }
}

// ============================================================================
// Prompt building
// ============================================================================

/// Cut `content` to at most `max_len` bytes on a char boundary, marking the cut.
pub fn truncate_prompt(content: &str, max_len: usize) -> String {
    if content.len() <= max_len {
        return content.to_string();
    }
    let mut end = max_len;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &content[..end], TRUNCATION_MARKER)
}

/// System messages followed by one user message wrapping the error text.
pub fn build_messages(error_text: &str, system_messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = system_messages.to_vec();
    messages.push(ChatMessage::user(format!(
        "Here's an error from a Playwright test:\n\n{}\n\nPlease suggest a specific solution to this problem.",
        error_text
    )));
    messages
}

/// Append a page-structure dump to the prompt when one is available.
pub fn with_page_structure(prompt: &str, structure: Option<&str>) -> String {
    match structure {
        Some(s) if !s.trim().is_empty() => format!(
            "{}\n\n## Page structure\n```\n{}\n```\n\nUse this structure to pick accurate selectors.",
            prompt, s
        ),
        _ => prompt.to_string(),
    }
}

// ============================================================================
// Chat-completions backend
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat-completions client.
pub struct ChatAdvisor {
    config: AdvisorConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        if config.endpoint.trim().is_empty() {
            return Err(AdvisorError::Config("endpoint is empty".to_string()));
        }
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|source| AdvisorError::Http {
                endpoint: config.endpoint.clone(),
                source,
            })?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }
}

#[async_trait]
impl Advisor for ChatAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, AdvisorError> {
        let content = truncate_prompt(prompt, self.config.max_prompt_length);
        debug!(
            length = prompt.len(),
            truncated = content.len() != prompt.len(),
            "sending prompt to advisor"
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: build_messages(&content, &self.config.system_messages),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let http_err = |source| AdvisorError::Http {
            endpoint: self.config.endpoint.clone(),
            source,
        };
        let response = builder.send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await.map_err(http_err)?;
        let answer = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(AdvisorError::EmptyResponse)?;

        info!(model = %self.config.model, length = answer.len(), "advisor responded");
        Ok(answer)
    }
}

// ============================================================================
// Static backend (for testing without a model server)
// ============================================================================

pub struct StaticAdvisor {
    pub text: String,
}

impl StaticAdvisor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Advisor for StaticAdvisor {
    async fn advise(&self, _prompt: &str) -> Result<String, AdvisorError> {
        Ok(self.text.clone())
    }
}
