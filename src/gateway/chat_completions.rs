use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::{Value, json};

use crate::gateway::{
    GenerateRequest, TextGenerator,
    error::{GatewayError, GatewayErrorKind, map_http_error},
};

/// Client for an OpenAI-style `POST /chat/completions` endpoint.
///
/// The prompt travels as a single user message; the completion is read from
/// `choices[0].message.content`. Model selection is per-request so the same
/// client serves both pipeline stages.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    request_timeout: Duration,
}

impl ChatCompletionsClient {
    pub fn new(endpoint: impl Into<String>, request_timeout_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
            endpoint: endpoint.into(),
            request_timeout: Duration::from_millis(request_timeout_ms.max(1)),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        let body = json!({
            "model": request.model,
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
        });

        let response = self
            .client
            .post(self.completions_url())
            .timeout(self.request_timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", &request.request_id)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GatewayError::new(
                        GatewayErrorKind::Timeout,
                        format!("chat completion request timed out: {}", err),
                    )
                } else {
                    GatewayError::new(
                        GatewayErrorKind::BackendTransient,
                        format!("chat completion request failed: {}", err),
                    )
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let payload: Value = response.json().await.map_err(|err| {
            GatewayError::new(
                GatewayErrorKind::ProtocolViolation,
                format!("chat completion response is not JSON: {}", err),
            )
            .with_retryable(false)
        })?;

        extract_completion_text(&payload)
    }
}

fn extract_completion_text(payload: &Value) -> Result<String, GatewayError> {
    let content = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str);

    match content {
        Some(text) => Ok(text.to_string()),
        None => Err(GatewayError::new(
            GatewayErrorKind::ProtocolViolation,
            "chat completion response has no choices[0].message.content",
        )
        .with_retryable(false)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatCompletionsClient, extract_completion_text};

    #[test]
    fn completions_url_normalizes_trailing_slash() {
        let client = ChatCompletionsClient::new("http://localhost:8000/", 1000);
        assert_eq!(
            client.completions_url(),
            "http://localhost:8000/chat/completions"
        );
    }

    #[test]
    fn reads_first_choice_content() {
        let payload = json!({
            "choices": [
                {"message": {"content": "{\"region\":\"amygdala\"}"}},
                {"message": {"content": "ignored"}}
            ]
        });
        let text = extract_completion_text(&payload).expect("content should extract");
        assert_eq!(text, "{\"region\":\"amygdala\"}");
    }

    #[test]
    fn empty_choices_is_a_protocol_violation() {
        let payload = json!({"choices": []});
        let err = extract_completion_text(&payload).expect_err("must fail");
        assert!(!err.retryable);
    }
}
