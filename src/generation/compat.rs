//! Chat-completions fallback protocol. Generation intent travels only as prompt
//! text, and the image comes back as free text that has to be scraped.

use crate::{
    config::GenerationSettings,
    error::{GenError, Result},
    generation::{endpoint, extract},
    models::{GenerationRequest, GenerationResult},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_TOKENS: u32 = 4000;

const SYSTEM_PROMPT: &str = "You are an AI image generator. You strictly output image URLs.";

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    /// Usually a string; some proxies send an array of text blocks.
    #[serde(default)]
    pub content: Option<Value>,
}

fn instructions(request: &GenerationRequest) -> String {
    let aspect_ratio = request.aspect_ratio.explicit().unwrap_or("Default");
    format!(
        "STRICT IMAGE GENERATION REQUEST:\n\
         - Generate a REALISTIC, HIGH-QUALITY image based on the user prompt.\n\
         - Aspect Ratio: {}\n\
         - Target Resolution: {} ({} ({}))\n\
         - DO NOT return code. DO NOT return markdown descriptions.\n\
         - RETURN ONLY THE IMAGE URL.",
        aspect_ratio,
        request.resolution,
        request.resolution.dimensions(),
        request.resolution
    )
}

pub fn encode(request: &GenerationRequest) -> ChatRequest {
    let mut blocks = vec![ContentBlock::Text {
        text: format!("{}\n\n{}", request.prompt, instructions(request)),
    }];

    if let Some(reference) = &request.reference_image {
        blocks.push(ContentBlock::ImageUrl {
            image_url: ImageUrl {
                url: reference.clone(),
            },
        });
    }

    ChatRequest {
        model: request.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: ChatContent::Text(SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: "user",
                content: ChatContent::Blocks(blocks),
            },
        ],
        max_tokens: MAX_TOKENS,
    }
}

fn content_text(content: Value) -> String {
    match content {
        Value::String(text) => text,
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

pub fn decode(response: ChatResponse) -> Result<GenerationResult> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(content_text)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(GenError::NoImage("chat completion returned no content".into()));
    }

    let reference = extract::image_reference(&content).ok_or_else(|| {
        GenError::NoImage("could not find an image URL in the chat completion".into())
    })?;

    Ok(GenerationResult::from_stored(&reference))
}

/// One full compat attempt: normalize, encode, send, decode.
pub async fn generate(
    http: &Client,
    settings: &GenerationSettings,
    api_key: &str,
    request: &GenerationRequest,
) -> Result<GenerationResult> {
    let url = endpoint::compat_endpoint(settings.base_url());
    let payload = encode(request);

    log::info!("Attempting compat generation: {}", url);

    let response = http
        .post(&url)
        .timeout(settings.attempt_timeout)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenError::from_status(status.as_u16(), &body));
    }

    let body = response.text().await?;
    let decoded: ChatResponse = serde_json::from_str(&body)?;
    decode(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, Resolution};
    use serde_json::json;

    #[test]
    fn encodes_two_messages_with_attachment() {
        let request = GenerationRequest::new("a cat", "chat-model")
            .with_reference_image("data:image/png;base64,AAAA");

        let body = serde_json::to_value(encode(&request)).unwrap();

        assert_eq!(body["model"], "chat-model");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");

        let blocks = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(
            blocks[1],
            json!({"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}})
        );
    }

    #[test]
    fn instructions_carry_ratio_and_dimensions() {
        let request = GenerationRequest::new("a cat", "m")
            .with_aspect_ratio(AspectRatio::Portrait9x16)
            .with_resolution(Resolution::Res4K);
        let body = serde_json::to_value(encode(&request)).unwrap();
        let text = body["messages"][1]["content"][0]["text"].as_str().unwrap();

        assert!(text.starts_with("a cat\n\n"));
        assert!(text.contains("Aspect Ratio: 9:16"));
        assert!(text.contains("3840x2160"));
        assert!(text.contains("RETURN ONLY THE IMAGE URL"));
    }

    #[test]
    fn default_ratio_is_spelled_out() {
        let text = instructions(&GenerationRequest::new("a cat", "m"));
        assert!(text.contains("Aspect Ratio: Default"));
        assert!(text.contains("1024x1024"));
    }

    fn response(content: Value) -> ChatResponse {
        serde_json::from_value(json!({"choices": [{"message": {"content": content}}]})).unwrap()
    }

    #[test]
    fn decodes_by_precedence() {
        let cases = [
            ("![img](https://x.test/b.png)", "https://x.test/b.png"),
            ("See https://x.test/c.png", "https://x.test/c.png"),
            ("https://x.test/d.png extra", "https://x.test/d.png"),
        ];
        for (content, expected) in cases {
            let result = decode(response(json!(content))).unwrap();
            assert_eq!(result, GenerationResult::Url(expected.into()));
        }
    }

    #[test]
    fn decodes_block_array_content() {
        let result = decode(response(json!([{"type": "text", "text": "![x](https://x.test/e.png)"}])))
            .unwrap();
        assert_eq!(result.to_string(), "https://x.test/e.png");
    }

    #[test]
    fn empty_content_is_no_image() {
        assert!(matches!(decode(response(json!(""))), Err(GenError::NoImage(_))));
        assert!(matches!(decode(response(Value::Null)), Err(GenError::NoImage(_))));
        assert!(matches!(
            decode(serde_json::from_value(json!({"choices": []})).unwrap()),
            Err(GenError::NoImage(_))
        ));
        assert!(matches!(
            decode(serde_json::from_value(json!({"choices": null})).unwrap()),
            Err(GenError::NoImage(_))
        ));
    }

    #[test]
    fn prose_without_url_is_no_image() {
        let err = decode(response(json!("I can't generate images."))).unwrap_err();
        assert!(matches!(err, GenError::NoImage(_)));
    }
}
