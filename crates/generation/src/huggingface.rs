use crate::{http_client, GenerationError, ObjectiveGenerator};
use docfill_types::FieldMapping;
use serde_json::{json, Value};
use std::time::Duration;

pub(crate) const DEFAULT_MODEL: &str = "google/flan-t5-large";
const TOKEN_VARIABLE: &str = "HUGGINGFACE_API_TOKEN";
const INFERENCE_URL: &str = "https://api-inference.huggingface.co/models/";

/// Hugging Face hosted inference.
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    client: reqwest::blocking::Client,
    token: String,
    model: String,
}

impl HuggingFaceProvider {
    pub fn new(
        token: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenerationError::MissingCredentials(TOKEN_VARIABLE))?;
        Ok(Self {
            client: http_client(timeout)?,
            token,
            model,
        })
    }

    fn prompt(source_text: &str) -> String {
        format!(
            "Você é um assistente que escreve um 'Objetivo da Empresa' curto (1-2 parágrafos) \
             baseado nas informações abaixo. Seja direto e formal.\n\n\
             INFORMAÇÕES:\n{}\n\n\
             RETORNE APENAS o texto final, sem rótulos.",
            source_text
        )
    }
}

/// Pulls the generated text out of the shapes the inference API returns.
fn extract_text(result: &Value) -> String {
    fn from_object(object: &serde_json::Map<String, Value>) -> Option<String> {
        ["generated_text", "text"]
            .iter()
            .filter_map(|key| object.get(*key)?.as_str())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }

    let text = match result {
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => {
                from_object(first).unwrap_or_else(|| Value::Object(first.clone()).to_string())
            }
            Some(Value::String(first)) => first.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        Value::Object(object) => from_object(object).unwrap_or_else(|| result.to_string()),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    text.trim().to_string()
}

impl ObjectiveGenerator for HuggingFaceProvider {
    fn generate(
        &self,
        source_text: &str,
        _context: &FieldMapping,
    ) -> Result<String, GenerationError> {
        let url = format!("{}{}", INFERENCE_URL, self.model);
        let payload = json!({
            "inputs": Self::prompt(source_text),
            "options": { "wait_for_model": true },
        });

        tracing::info!("requesting objective from Hugging Face model {}", self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        Ok(extract_text(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_from_list_of_objects() {
        let result = json!([{ "generated_text": "  A empresa atua no varejo.  " }]);
        assert_eq!(extract_text(&result), "A empresa atua no varejo.");
    }

    #[test]
    fn test_extract_text_falls_back_to_text_key() {
        let result = json!({ "text": "Objetivo" });
        assert_eq!(extract_text(&result), "Objetivo");
    }

    #[test]
    fn test_extract_text_stringifies_unknown_shapes() {
        assert_eq!(extract_text(&json!(["plain"])), "plain");
        assert_eq!(extract_text(&json!({ "other": 1 })), r#"{"other":1}"#);
        assert_eq!(extract_text(&json!([])), "");
    }

    #[test]
    fn test_prompt_embeds_source_text() {
        let prompt = HuggingFaceProvider::prompt("Atividade principal: Varejo");
        assert!(prompt.contains("INFORMAÇÕES:\nAtividade principal: Varejo\n"));
    }

    #[test]
    fn test_blank_token_is_missing_credentials() {
        let err = HuggingFaceProvider::new(
            Some("  ".to_string()),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredentials(_)));
    }
}
