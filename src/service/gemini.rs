//! Gemini-backed scene service.

use crate::error::{
    parse_retry_after, sanitize_error_message, Result, StudioError, CONFIGURATION_FAILURE,
};
use crate::references::ReferenceImage;
use crate::service::provider::SceneService;
use crate::service::types::{ScenePart, Suggestion, COMPOSITE_ASPECT_RATIO};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Instruction sent with the reference photos during scene analysis.
const ANALYSIS_INSTRUCTION: &str = "Study the attached reference photos and enumerate distinct \
     opportunities to refine them into a polished holiday portrait. Respond with a JSON array \
     of 5 to 6 objects, each with a short \"label\" and a one-sentence imperative \"description\".";

/// Gemini model variants used by the studio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image, used for photo composites.
    #[default]
    FlashImage,
    /// Gemini 2.5 Flash, used for structured scene analysis.
    Flash,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::Flash => "gemini-2.5-flash",
        }
    }
}

/// Builder for [`GeminiService`].
#[derive(Debug, Clone)]
pub struct GeminiServiceBuilder {
    api_key: Option<String>,
    image_model: GeminiModel,
    analysis_model: GeminiModel,
}

impl Default for GeminiServiceBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            image_model: GeminiModel::FlashImage,
            analysis_model: GeminiModel::Flash,
        }
    }
}

impl GeminiServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model used for composites.
    pub fn image_model(mut self, model: GeminiModel) -> Self {
        self.image_model = model;
        self
    }

    /// Sets the model used for scene analysis.
    pub fn analysis_model(mut self, model: GeminiModel) -> Self {
        self.analysis_model = model;
        self
    }

    /// Builds the service, resolving the API key.
    pub fn build(self) -> Result<GeminiService> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                StudioError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        Ok(GeminiService {
            client: reqwest::Client::new(),
            api_key,
            image_model: self.image_model,
            analysis_model: self.analysis_model,
        })
    }
}

/// Gemini scene service.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    image_model: GeminiModel,
    analysis_model: GeminiModel,
}

impl GeminiService {
    /// Creates a new `GeminiServiceBuilder`.
    pub fn builder() -> GeminiServiceBuilder {
        GeminiServiceBuilder::new()
    }

    async fn post_generate_content(
        &self,
        model: GeminiModel,
        body: &GeminiRequest,
    ) -> Result<GeminiResponse> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            model.as_str(),
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let parsed: GeminiResponse = response.json().await?;

        // Safety blocks come back as HTTP 200 with prompt feedback set
        if let Some(ref feedback) = parsed.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let message = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
                return Err(StudioError::ContentBlocked(message));
            }
        }

        Ok(parsed)
    }

    async fn generate_impl(
        &self,
        images: &[ReferenceImage],
        prompt: &str,
    ) -> Result<Vec<ScenePart>> {
        let body = GeminiRequest::composite(images, prompt);
        let response = self.post_generate_content(self.image_model, &body).await?;

        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => return Ok(Vec::new()),
        };

        if let Some(ref reason) = candidate.finish_reason {
            if matches!(
                reason.as_str(),
                "SAFETY"
                    | "IMAGE_SAFETY"
                    | "IMAGE_PROHIBITED_CONTENT"
                    | "PROHIBITED_CONTENT"
                    | "RECITATION"
                    | "BLOCKLIST"
            ) {
                return Err(StudioError::ContentBlocked(format!(
                    "Content blocked by safety filter: {reason}"
                )));
            }
        }

        let parts = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default();
        tracing::debug!(parts = parts.len(), "composite response received");
        Ok(parts.into_iter().filter_map(response_part).collect())
    }

    async fn suggest_impl(&self, images: &[ReferenceImage]) -> Result<Vec<Suggestion>> {
        let body = GeminiRequest::analysis(images);
        let response = self
            .post_generate_content(self.analysis_model, &body)
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .ok_or_else(|| StudioError::Decode("no text part in analysis response".into()))?;

        parse_suggestions(&text)
    }
}

#[async_trait]
impl SceneService for GeminiService {
    async fn generate_composite(
        &self,
        images: &[ReferenceImage],
        prompt: &str,
    ) -> Result<Vec<ScenePart>> {
        self.generate_impl(images, prompt).await
    }

    async fn suggest_refinements(&self, images: &[ReferenceImage]) -> Result<Vec<Suggestion>> {
        self.suggest_impl(images).await
    }
}

/// Parses a suggestion batch, discarding the whole batch on any malformed
/// entry. Partial recovery is never attempted.
fn parse_suggestions(text: &str) -> Result<Vec<Suggestion>> {
    let suggestions: Vec<Suggestion> = serde_json::from_str(text)?;
    if suggestions
        .iter()
        .any(|s| s.label.trim().is_empty() || s.description.trim().is_empty())
    {
        return Err(StudioError::Decode(
            "analysis entry with an empty field".into(),
        ));
    }
    Ok(suggestions)
}

fn response_part(part: GeminiPartResponse) -> Option<ScenePart> {
    if let Some(inline) = part.inline_data {
        return Some(ScenePart::Inline {
            media_type: inline.mime_type,
            data: inline.data,
        });
    }
    part.text.map(ScenePart::Text)
}

fn parse_error(status: u16, body: &str, headers: &reqwest::header::HeaderMap) -> StudioError {
    let text = sanitize_error_message(body);
    if status == 404 || text.contains("Requested entity was not found") {
        return StudioError::InvalidRequest(CONFIGURATION_FAILURE.into());
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return StudioError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return StudioError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return StudioError::ContentBlocked(text);
    }
    StudioError::Api {
        status,
        message: text,
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<GeminiImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: String,
}

impl GeminiRequest {
    /// Builds a composite request: reference images first, then the prompt.
    fn composite(images: &[ReferenceImage], prompt: &str) -> Self {
        let mut parts = image_parts(images);
        parts.push(GeminiRequestPart::Text {
            text: prompt.to_string(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                response_mime_type: None,
                response_schema: None,
                image_config: Some(GeminiImageConfig {
                    aspect_ratio: COMPOSITE_ASPECT_RATIO.to_string(),
                }),
            },
        }
    }

    /// Builds an analysis request constrained to schema-conforming JSON.
    fn analysis(images: &[ReferenceImage]) -> Self {
        let mut parts = image_parts(images);
        parts.push(GeminiRequestPart::Text {
            text: ANALYSIS_INSTRUCTION.to_string(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: None,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(suggestion_schema()),
                image_config: None,
            },
        }
    }
}

fn image_parts(images: &[ReferenceImage]) -> Vec<GeminiRequestPart> {
    images
        .iter()
        .map(|image| GeminiRequestPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.media_type().to_string(),
                data: image.payload().to_string(),
            },
        })
        .collect()
}

/// JSON schema the analysis response must conform to.
fn suggestion_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "label": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["label", "description"]
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<GeminiInlineResponse>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineResponse {
    mime_type: String,
    data: String,
}
