use serde::{Deserialize, Serialize};

/// Which model configuration a request runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Fast, cheap model for conversational turns.
    Chat,
    /// Higher-capability model for the long-form report.
    Report,
}

/// Fixed sampling parameters; not tunable at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub model: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub const CHAT: GenerationParams = GenerationParams {
        model: "gemini-2.5-flash",
        temperature: 0.3,
        top_p: 0.95,
        max_output_tokens: 1024,
    };

    pub const REPORT: GenerationParams = GenerationParams {
        model: "gemini-2.5-pro",
        temperature: 0.4,
        top_p: 0.9,
        max_output_tokens: 8192,
    };
}

impl ModelVariant {
    pub fn params(&self) -> GenerationParams {
        match self {
            ModelVariant::Chat => GenerationParams::CHAT,
            ModelVariant::Report => GenerationParams::REPORT,
        }
    }
}

/// A flattened prompt bound to a model variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub variant: ModelVariant,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn chat(prompt: impl Into<String>) -> Self {
        Self {
            variant: ModelVariant::Chat,
            prompt: prompt.into(),
        }
    }

    pub fn report(prompt: impl Into<String>) -> Self {
        Self {
            variant: ModelVariant::Report,
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: Some(text.into()) }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl From<GenerationParams> for GenerationConfig {
    fn from(params: GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            max_output_tokens: params.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated. `None` when the
    /// model produced no text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.as_ref()?.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_in_camel_case() {
        let payload = GenerateContentRequest {
            contents: vec![Content::user("hello")],
            generation_config: GenerationParams::CHAT.into(),
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
        assert!(value["generationConfig"]["topP"].as_f64().unwrap() > 0.94);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Churn is "},{"text":"20.37 percent."}]},"finishReason":"STOP"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("Churn is 20.37 percent."));
    }

    #[test]
    fn test_response_without_text_is_none() {
        let blocked = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(blocked).unwrap();
        assert_eq!(response.text(), None);

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn test_variant_params() {
        assert_eq!(ModelVariant::Chat.params().model, "gemini-2.5-flash");
        assert_eq!(ModelVariant::Report.params().max_output_tokens, 8192);
    }
}
