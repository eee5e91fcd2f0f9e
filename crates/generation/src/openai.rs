use crate::{http_client, GenerationError, ObjectiveGenerator};
use docfill_types::FieldMapping;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";
const KEY_VARIABLE: &str = "OPENAI_API_KEY";
const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f32 = 0.2;

/// OpenAI chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiProvider {
    pub fn new(key: Option<String>, model: String, timeout: Duration) -> Result<Self, GenerationError> {
        let key = key
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingCredentials(KEY_VARIABLE))?;
        Ok(Self {
            client: http_client(timeout)?,
            key,
            model,
        })
    }

    fn prompt(source_text: &str) -> String {
        format!(
            "Escreva um texto curto (1-2 parágrafos) intitulado 'Objetivo da Empresa' baseado nas \
             informações abaixo. Use linguagem formal e direta. Retorne apenas o texto.\n\n\
             INFORMAÇÕES:\n{}\n",
            source_text
        )
    }
}

fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| GenerationError::MalformedResponse("response has no choices".to_string()))
}

impl ObjectiveGenerator for OpenAiProvider {
    fn generate(
        &self,
        source_text: &str,
        _context: &FieldMapping,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(source_text),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        tracing::info!("requesting objective from OpenAI model {}", self.model);
        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.key)
            .json(&request)
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
        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_reads_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  Objetivo formal.\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Objetivo formal.");
    }

    #[test]
    fn test_parse_completion_without_choices_is_malformed() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_serializes_expected_fields() {
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: OpenAiProvider::prompt("Resumo: Varejo"),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["max_tokens"], 256);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Resumo: Varejo"));
    }
}
