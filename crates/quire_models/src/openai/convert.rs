//! Conversion between quire and chat completion wire types.

use super::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAiConfig};
use quire_core::{GenerateRequest, GenerateResponse};
use quire_error::{ServiceError, ServiceErrorKind};
use quire_interface::{FinishReason, StreamChunk};

/// Upper bound on requested output tokens, applied whatever the
/// configuration or request asks for.
pub const MAX_OUTPUT_TOKENS_CAP: u32 = 4096;

/// Build the wire request, filling gaps from the client configuration.
#[tracing::instrument(skip_all, fields(messages = request.messages.len(), stream))]
pub(crate) fn to_chat_request(
    request: &GenerateRequest,
    config: &OpenAiConfig,
    stream: bool,
) -> ChatCompletionRequest {
    let requested = request.max_tokens.unwrap_or(*config.max_tokens());
    let max_tokens = requested.min(MAX_OUTPUT_TOKENS_CAP);
    if requested > MAX_OUTPUT_TOKENS_CAP {
        tracing::warn!(
            requested,
            cap = MAX_OUTPUT_TOKENS_CAP,
            "Clamping requested output length"
        );
    }

    ChatCompletionRequest {
        model: request
            .model
            .clone()
            .unwrap_or_else(|| config.model().clone()),
        messages: request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.wire_name().to_string(),
                content: m.content.clone(),
            })
            .collect(),
        max_tokens: Some(max_tokens),
        temperature: Some(request.temperature.unwrap_or(*config.temperature())),
        stream: Some(stream),
    }
}

/// Convert ChatCompletionResponse to GenerateResponse
pub(crate) fn from_chat_response(
    response: ChatCompletionResponse,
) -> Result<GenerateResponse, ServiceError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        ServiceError::new(ServiceErrorKind::Unknown("No choices in response".into()))
    })?;

    Ok(GenerateResponse {
        text: choice.message.content,
        finish_reason: choice.finish_reason,
    })
}

/// Convert a streamed chunk; `None` when it carries neither text nor a finish reason.
pub(crate) fn chunk_to_stream_chunk(chunk: ChatCompletionChunk) -> Option<StreamChunk> {
    let choice = chunk.choices.into_iter().next()?;
    let content = choice.delta.content.unwrap_or_default();
    let finish_reason = choice.finish_reason.as_deref().map(FinishReason::from_wire);

    if content.is_empty() && finish_reason.is_none() {
        return None;
    }

    Some(StreamChunk {
        content,
        is_final: finish_reason.is_some(),
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::Message;

    fn config() -> OpenAiConfig {
        OpenAiConfig::builder()
            .api_key("sk-test")
            .max_tokens(9000u32)
            .build()
            .unwrap()
    }

    #[test]
    fn test_configured_limit_is_clamped() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::user("hi")])
            .build()
            .unwrap();

        let chat = to_chat_request(&request, &config(), false);
        assert_eq!(chat.max_tokens, Some(MAX_OUTPUT_TOKENS_CAP));
        assert_eq!(chat.model, "gpt-3.5-turbo");
        assert_eq!(chat.temperature, Some(0.7));
        assert_eq!(chat.messages[0].role, "user");
    }

    #[test]
    fn test_request_values_override_config() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::system("sys")])
            .max_tokens(1000u32)
            .temperature(1.1f32)
            .model("gpt-4o")
            .build()
            .unwrap();

        let chat = to_chat_request(&request, &config(), true);
        assert_eq!(chat.max_tokens, Some(1000));
        assert_eq!(chat.temperature, Some(1.1));
        assert_eq!(chat.model, "gpt-4o");
        assert_eq!(chat.stream, Some(true));
    }

    #[test]
    fn test_role_only_chunk_is_skipped() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c1","choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert!(chunk_to_stream_chunk(chunk).is_none());
    }

    #[test]
    fn test_finish_chunk_is_final() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"length"}]}"#,
        )
        .unwrap();
        let converted = chunk_to_stream_chunk(chunk).unwrap();
        assert!(converted.is_final);
        assert_eq!(converted.finish_reason, Some(FinishReason::Length));
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let response = ChatCompletionResponse {
            id: String::new(),
            model: String::new(),
            choices: vec![],
            usage: None,
        };
        assert!(from_chat_response(response).is_err());
    }
}
