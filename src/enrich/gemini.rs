//! Enrichment via a Gemini-style `generateContent` endpoint.
//!
//! Sends one `POST` with a bearer credential and reads the model's JSON reply
//! from `candidates[0].content.parts[0].text`. Any failure (no credential,
//! network error, non-2xx, empty candidates, unparsable reply) is logged and
//! replaced with [`fallback_analysis`] output.
//!
//! Transient failures (network, 429, 5xx) are retried through
//! [`with_retry`] when `enrichment.max_retries > 0`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{fallback_analysis, normalize_content, Enricher};
use crate::config::EnrichmentConfig;
use crate::error::UpstreamError;
use crate::models::EnhancedContent;
use crate::retry::{with_retry, RetryPolicy};

pub struct GeminiEnricher {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    generation_config: Value,
    retry: RetryPolicy,
}

impl GeminiEnricher {
    /// Build a client for `config.endpoint` using `api_key` as the bearer
    /// credential. The request timeout comes from `config.timeout_secs`.
    pub fn new(config: &EnrichmentConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone().filter(|e| !e.trim().is_empty()),
            api_key,
            generation_config: json!({
                "temperature": config.temperature,
                "topK": config.top_k,
                "topP": config.top_p,
                "maxOutputTokens": config.max_output_tokens,
            }),
            retry: RetryPolicy::linear(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        })
    }

    /// Run the upstream call without the fallback safety net.
    pub async fn try_enrich(&self, text: &str) -> Result<EnhancedContent, UpstreamError> {
        let (endpoint, api_key) = match (&self.endpoint, &self.api_key) {
            (Some(e), Some(k)) => (e.as_str(), k.as_str()),
            _ => return Err(UpstreamError::NotConfigured),
        };

        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(text) }] }],
            "generationConfig": self.generation_config,
        });

        let reply = with_retry(&self.retry, || self.send(endpoint, api_key, &body)).await?;
        parse_reply(&reply, text)
    }

    async fn send(&self, endpoint: &str, api_key: &str, body: &Value) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "enrichment endpoint responded");

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Enricher for GeminiEnricher {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn enrich(&self, text: &str) -> EnhancedContent {
        match self.try_enrich(text).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "enrichment failed, using fallback analysis");
                fallback_analysis(text)
            }
        }
    }
}

/// The instruction sent to the model.
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"请分析以下灵感记录文本，并提供结构化的分析结果。

原始文本：
"{text}"

请按照以下JSON格式返回分析结果：
{{
  "summary": "简洁的摘要（1-2句话）",
  "details": "详细的扩展内容和建议（3-5句话）",
  "suggestions": ["具体建议1", "具体建议2", "具体建议3"],
  "tags": ["相关标签1", "相关标签2", "相关标签3"],
  "category": "主要分类（如：技术创新、生活想法、工作改进、创意设计等）"
}}

请确保返回有效的JSON格式，不要包含其他文字。"#
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Parse the raw HTTP body into normalized content.
fn parse_reply(raw: &str, original_text: &str) -> Result<EnhancedContent, UpstreamError> {
    let response: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    let generated = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .ok_or(UpstreamError::EmptyResponse)?;

    let cleaned = strip_code_fences(generated);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(UpstreamError::Malformed(
            "model reply is not a JSON object".to_string(),
        ));
    }

    Ok(normalize_content(&value, original_text))
}

/// Remove markdown code fences (```` ```json ```` / ```` ``` ````) the model
/// sometimes wraps its JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}
