//! Intent vocabulary and classifiers.
//!
//! The vocabulary is fixed and closed; classification is a pluggable
//! capability behind [`IntentClassifier`]. Classifiers must fail closed: any
//! provider or parse failure yields [`Intent::Unknown`], never an elevated
//! intent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The fixed intent vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Pre-auth self-registration
    Onboard,
    /// Login request
    Authenticate,
    /// View the caller's own profile
    ViewSelf,
    /// View another employee's profile
    ViewEmployee,
    /// Update an employee record
    UpdateEmployee,
    /// Delete an employee record
    DeleteEmployee,
    /// An upstream guardrail rejected the request
    Blocked,
    /// Anything else, including classifier failures
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// Stable wire name, used in audit events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboard => "onboard",
            Self::Authenticate => "authenticate",
            Self::ViewSelf => "view_self",
            Self::ViewEmployee => "view_employee",
            Self::UpdateEmployee => "update_employee",
            Self::DeleteEmployee => "delete_employee",
            Self::Blocked => "blocked",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a label from an external classifier. Unrecognized labels map to
    /// `Unknown` (fail closed).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            // The source history used both "onboarding" and "onboard";
            // "onboard" is canonical but both labels are accepted.
            "onboard" | "onboarding" => Self::Onboard,
            "authenticate" => Self::Authenticate,
            "view_self" => Self::ViewSelf,
            "view_employee" => Self::ViewEmployee,
            "update_employee" => Self::UpdateEmployee,
            "delete_employee" => Self::DeleteEmployee,
            "blocked" => Self::Blocked,
            _ => Self::Unknown,
        }
    }
}

/// Pluggable intent classification capability.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify free text into one intent. Implementations must fail closed.
    async fn classify(&self, text: &str) -> Intent;
}

/// Deterministic keyword classifier.
///
/// This is the default and the test substitute for a live provider. Keyword
/// checks run in a fixed priority order over the lowercased input.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Create a new keyword classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Intent {
        let input = text.to_lowercase();

        if ["onboard", "sign up", "register"].iter().any(|kw| input.contains(kw)) {
            return Intent::Onboard;
        }
        if ["login", "log in", "sign in"].iter().any(|kw| input.contains(kw)) {
            return Intent::Authenticate;
        }
        if input.contains("delete") || input.contains("remove") {
            return Intent::DeleteEmployee;
        }
        if input.contains("update") || input.contains("change") {
            return Intent::UpdateEmployee;
        }
        if ["my profile", "show my", "me"].iter().any(|kw| input.contains(kw)) {
            return Intent::ViewSelf;
        }
        if input.contains("show") || input.contains("view") {
            return Intent::ViewEmployee;
        }

        Intent::Unknown
    }
}

const INTENT_SYSTEM_PROMPT: &str = "\
You are an intent classification engine for an internal employee management system.

Your task:
- Read the user input
- Classify the intent into ONE of the following values:

Allowed intents:
- onboard
- authenticate
- view_self
- view_employee
- update_employee
- delete_employee
- unknown

Rules:
- Do NOT infer authorization or role.
- Do NOT decide whether the action is allowed.
- Do NOT suggest alternatives.
- Do NOT add explanations.

Return ONLY valid JSON in the following format:

{
  \"intent\": \"<one of the allowed intents>\"
}";

/// OpenAI-backed classifier.
///
/// Single attempt, temperature 0, strict JSON output. Every failure mode
/// (transport, non-2xx, malformed JSON, unknown label) degrades to
/// [`Intent::Unknown`].
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClassifier {
    /// Create a classifier for the given API key and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }

    /// Override the API endpoint (used to point at a local stub in tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request_label(&self, text: &str) -> Result<String, String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": INTENT_SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("provider returned {}", response.status()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {e}"))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| "missing message content".to_string())?;

        let parsed: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| format!("content is not JSON: {e}"))?;

        parsed["intent"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "missing intent field".to_string())
    }
}

#[async_trait]
impl IntentClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Intent {
        match self.request_label(text).await {
            Ok(label) => {
                let intent = Intent::from_label(&label);
                debug!(label = %label, intent = intent.as_str(), "intent classified");
                intent
            }
            Err(reason) => {
                // Fail closed: an unreachable or confused provider must never
                // grant an elevated intent.
                warn!(reason = %reason, "intent classification failed, defaulting to unknown");
                Intent::Unknown
            }
        }
    }
}
