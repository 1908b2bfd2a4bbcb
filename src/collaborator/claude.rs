use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::collaborator::{
    prompt, FixProposal, Harness, HarnessCollaborator, OptimizationProposal, PatchProposal,
    ProposalCollaborator, Review, ReviewCollaborator, TaskKind,
};
use crate::error::{AppError, Result};
use crate::sandbox::language::Language;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Production collaborator backed by the Anthropic Messages API.
///
/// Every call sends one system + one user message and expects a single JSON
/// object back, optionally wrapped in a fenced code block.
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }

    async fn send(&self, system: &str, user_message: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message.to_string(),
            }],
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Collaborator(format!(
                "API returned {status}: {body}"
            )));
        }

        let body = response.json::<MessagesResponse>().await?;

        tracing::debug!(
            input_tokens = body.usage.input_tokens,
            output_tokens = body.usage.output_tokens,
            "Collaborator reply"
        );

        let text = body
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }

    async fn ask<T: DeserializeOwned>(&self, system: &str, user_message: &str) -> Result<T> {
        let reply = self.send(system, user_message).await?;
        extract_json(&reply)
    }
}

#[async_trait]
impl ProposalCollaborator for ClaudeClient {
    async fn propose_fix(
        &self,
        code: &str,
        issue: &str,
        language: Language,
        feedback: &str,
    ) -> Result<FixProposal> {
        self.ask(
            prompt::DEVELOPER_SYSTEM,
            &prompt::fix_prompt(code, issue, language, feedback),
        )
        .await
    }

    async fn propose_optimization(
        &self,
        code: &str,
        language: Language,
        feedback: &str,
    ) -> Result<OptimizationProposal> {
        self.ask(
            prompt::DEVELOPER_SYSTEM,
            &prompt::optimization_prompt(code, language, feedback),
        )
        .await
    }

    async fn propose_security_patch(&self, code: &str, feedback: &str) -> Result<PatchProposal> {
        self.ask(
            prompt::DEVELOPER_SYSTEM,
            &prompt::security_patch_prompt(code, feedback),
        )
        .await
    }
}

#[async_trait]
impl ReviewCollaborator for ClaudeClient {
    async fn review(&self, code: &str, kind: TaskKind) -> Result<Review> {
        self.ask(prompt::REVIEWER_SYSTEM, &prompt::review_prompt(code, kind))
            .await
    }
}

#[async_trait]
impl HarnessCollaborator for ClaudeClient {
    async fn synthesize_harness(
        &self,
        code: &str,
        raw_input: &str,
        language: Language,
    ) -> Result<Harness> {
        self.ask(
            prompt::DEVELOPER_SYSTEM,
            &prompt::harness_prompt(code, raw_input, language),
        )
        .await
    }
}

/// Parse the JSON object out of a model reply.
///
/// Accepts a bare object, an object inside a ```json fence, or an object
/// surrounded by prose; anything else is a `CollaboratorReply` error.
fn extract_json<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let trimmed = reply.trim();

    let candidate = if let Some(fenced) = strip_fence(trimmed) {
        fenced
    } else {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => {
                return Err(AppError::CollaboratorReply(format!(
                    "no JSON object in reply: {}",
                    snippet(trimmed)
                )))
            }
        }
    };

    serde_json::from_str(candidate).map_err(|e| {
        AppError::CollaboratorReply(format!("{e} in reply: {}", snippet(candidate)))
    })
}

fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.rfind("```")?;
    Some(rest[..end].trim())
}

fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
