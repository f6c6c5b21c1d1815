// src/enrichment/annotator.rs
use crate::config::EnrichmentConfig;
use crate::errors::{ScrapeError, ScrapeResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Env var holding the chat-completions API key.
pub const API_KEY_VAR: &str = "LLM_API_KEY";

/// A field that an LLM may return as one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// The fixed field list the annotator is asked for. Everything is optional;
/// the reply is best-effort and validated before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAnnotation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<OneOrMany>,
    #[serde(default)]
    pub service_hours: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
    #[serde(default)]
    pub fees: Option<String>,
    #[serde(default)]
    pub languages_offered: Option<OneOrMany>,
    #[serde(default)]
    pub capacity: Option<String>,
}

/// Turns raw page text into a ServiceAnnotation via a chat-completions
/// endpoint. The model's output is treated as opaque: anything that does not
/// parse into the expected shape is an ExternalServiceFailure, which callers
/// absorb by keeping the record with the annotation absent.
pub struct LlmAnnotator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmAnnotator {
    /// Reads the API key from the environment; absent key is a setup error
    /// the caller should surface before starting a run.
    pub fn from_env(config: &EnrichmentConfig) -> ScrapeResult<Self> {
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| {
            ScrapeError::ExternalServiceFailure(format!("{API_KEY_VAR} is not set"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::ExternalServiceFailure(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub async fn annotate(
        &self,
        page_text: &str,
        service_name: &str,
    ) -> ScrapeResult<ServiceAnnotation> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert at analyzing social service websites \
                                and extracting structured information."
                },
                {
                    "role": "user",
                    "content": build_prompt(page_text, service_name)
                }
            ],
            "temperature": 0.3,
            "max_tokens": 2000
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScrapeError::ExternalServiceFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::ExternalServiceFailure(format!(
                "annotator returned HTTP {status}"
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ScrapeError::ExternalServiceFailure(e.to_string()))?;

        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ScrapeError::ExternalServiceFailure("reply carries no content".to_string())
            })?;

        debug!("Annotator reply: {} chars", content.len());
        parse_annotation(content)
    }
}

/// Validate an opaque annotator reply into the fixed field shape.
pub fn parse_annotation(raw: &str) -> ScrapeResult<ServiceAnnotation> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ScrapeError::ExternalServiceFailure(format!("malformed JSON: {e}")))?;

    if !value.is_object() {
        return Err(ScrapeError::ExternalServiceFailure(
            "annotation is not a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ScrapeError::ExternalServiceFailure(format!("unexpected shape: {e}")))
}

fn build_prompt(page_text: &str, service_name: &str) -> String {
    format!(
        "Extract these fields from the service provider text below and reply \
         with valid JSON only: name, description, location, contact_phone, \
         service_hours, eligibility_criteria, fees, languages_offered, capacity.\n\
         Use null for any field not found. contact_phone and languages_offered \
         may be a single string or an array.\n\n\
         Service Provider: {service_name}\n\n\
         Text:\n{page_text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_reply_parses_with_missing_fields_absent() {
        let annotation = parse_annotation(
            r#"{
                "name": "Cybertip",
                "contact_phone": ["1-866-658-9022", "204-945-5735"],
                "languages_offered": "English",
                "fees": null
            }"#,
        )
        .unwrap();

        assert_eq!(annotation.name.as_deref(), Some("Cybertip"));
        assert_eq!(
            annotation.contact_phone,
            Some(OneOrMany::Many(vec![
                "1-866-658-9022".to_string(),
                "204-945-5735".to_string()
            ]))
        );
        assert_eq!(
            annotation.languages_offered,
            Some(OneOrMany::One("English".to_string()))
        );
        assert_eq!(annotation.fees, None);
        assert_eq!(annotation.capacity, None);
    }

    #[test]
    fn malformed_replies_are_external_service_failures() {
        for raw in ["not json at all", "[1, 2, 3]", "\"just a string\""] {
            let err = parse_annotation(raw).unwrap_err();
            assert!(
                matches!(err, ScrapeError::ExternalServiceFailure(_)),
                "expected ExternalServiceFailure for {raw:?}"
            );
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let annotation =
            parse_annotation(r#"{"name": "X", "confidence": 0.9, "extra": {"a": 1}}"#).unwrap();
        assert_eq!(annotation.name.as_deref(), Some("X"));
    }
}
