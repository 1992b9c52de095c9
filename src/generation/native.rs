//! Native `generateContent` protocol: structured image config, inline base64 parts.

use crate::{
    config::GenerationSettings,
    error::{truncate_body, GenError, Result},
    generation::{endpoint, extract},
    models::{DataUri, GenerationRequest, GenerationResult, Resolution},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Header the native provider reads the key from.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Mime type assumed for inline response data that does not declare one.
const DEFAULT_RESPONSE_MIME: &str = "image/png";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRequest {
    pub contents: Vec<NativeContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct NativeContent {
    pub parts: Vec<NativePart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NativePart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NativeResponse {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

/// Repeats the structured config inside the prompt, for intermediaries that
/// drop `generationConfig`.
fn technical_suffix(request: &GenerationRequest) -> String {
    let mut suffix = format!(" --resolution {}", request.resolution);
    if let Some(aspect_ratio) = request.aspect_ratio.explicit() {
        suffix.push_str(&format!(" --aspect_ratio {}", aspect_ratio));
    }
    suffix
}

pub fn encode(request: &GenerationRequest) -> NativeRequest {
    let mut parts = vec![NativePart::Text(format!(
        "{}{}",
        request.prompt,
        technical_suffix(request)
    ))];

    if let Some(uri) = request.reference_image.as_deref().and_then(DataUri::parse) {
        parts.push(NativePart::InlineData(InlineData {
            mime_type: Some(uri.mime_type),
            data: Some(uri.data),
        }));
    }

    // 1K is the provider's implicit default and is never sent.
    let image_size = match request.resolution {
        Resolution::Res1K => None,
        other => Some(other.as_str().to_string()),
    };

    NativeRequest {
        contents: vec![NativeContent { parts }],
        generation_config: GenerationConfig {
            image_config: ImageConfig {
                aspect_ratio: request.aspect_ratio.explicit().map(String::from),
                image_size,
            },
        },
    }
}

pub fn decode(response: NativeResponse) -> Result<GenerationResult> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenError::NoImage("native response has no candidates".into()))?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let inline = parts.iter().find_map(|part| {
        let inline = part.inline_data.as_ref()?;
        let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
        let mime_type = inline.mime_type.as_deref().unwrap_or(DEFAULT_RESPONSE_MIME);
        Some(DataUri::new(mime_type, data))
    });
    if let Some(uri) = inline {
        return Ok(GenerationResult::Inline(uri));
    }

    parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .find_map(extract::find_url)
        .map(|url| GenerationResult::Url(url.to_string()))
        .ok_or_else(|| GenError::NoImage("native response contained no image data".into()))
}

fn status_error(status: u16, body: &str) -> GenError {
    match status {
        401 | 403 => GenError::AuthRejected {
            status,
            message: truncate_body(body),
        },
        404 => GenError::EndpointNotFound(format!(
            "native generateContent path is not served here: {}",
            truncate_body(body)
        )),
        400 => GenError::ParameterRejected(truncate_body(body)),
        _ => GenError::from_status(status, body),
    }
}

/// One full native attempt: normalize, encode, send, decode.
pub async fn generate(
    http: &Client,
    settings: &GenerationSettings,
    api_key: &str,
    request: &GenerationRequest,
) -> Result<GenerationResult> {
    let url = endpoint::native_endpoint(settings.base_url(), &request.model, api_key);
    let payload = encode(request);

    log::info!("Attempting native generation: {}", endpoint::redact_key(&url));
    log::debug!(
        "Native generation config: {}",
        serde_json::to_string(&payload.generation_config)?
    );

    let response = http
        .post(&url)
        .timeout(settings.attempt_timeout)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, api_key)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 400 {
            log::warn!("Native API rejected parameters: {}", truncate_body(&body));
        }
        return Err(status_error(status.as_u16(), &body));
    }

    let body = response.text().await?;
    let decoded: NativeResponse = serde_json::from_str(&body)?;
    decode(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;
    use serde_json::json;

    #[test]
    fn encodes_text_then_inline_image() {
        let request = GenerationRequest::new("a cat", "m")
            .with_aspect_ratio(AspectRatio::Landscape16x9)
            .with_resolution(Resolution::Res4K)
            .with_reference_image("data:image/png;base64,AAAA");

        let body = serde_json::to_value(encode(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{
                    "parts": [
                        {"text": "a cat --resolution 4K --aspect_ratio 16:9"},
                        {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
                    ]
                }],
                "generationConfig": {
                    "imageConfig": {"aspectRatio": "16:9", "imageSize": "4K"}
                }
            })
        );
    }

    #[test]
    fn omits_defaults_from_image_config() {
        let request = GenerationRequest::new("a cat", "m");
        let body = serde_json::to_value(encode(&request)).unwrap();

        assert_eq!(body["generationConfig"]["imageConfig"], json!({}));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a cat --resolution 1K");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn two_k_is_sent() {
        let request = GenerationRequest::new("a cat", "m").with_resolution(Resolution::Res2K);
        let body = serde_json::to_value(encode(&request)).unwrap();
        assert_eq!(body["generationConfig"]["imageConfig"]["imageSize"], "2K");
    }

    fn response(value: serde_json::Value) -> NativeResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decodes_inline_part() {
        let result = decode(response(json!({
            "candidates": [{"content": {"parts": [
                {"text": "here you go"},
                {"inlineData": {"mimeType": "image/jpeg", "data": "ZZZZ"}}
            ]}}]
        })))
        .unwrap();

        assert_eq!(result.to_string(), "data:image/jpeg;base64,ZZZZ");
    }

    #[test]
    fn inline_part_beats_earlier_text_url() {
        let result = decode(response(json!({
            "candidates": [{"content": {"parts": [
                {"text": "https://x.test/text.png"},
                {"inlineData": {"data": "QUJD"}}
            ]}}]
        })))
        .unwrap();

        assert_eq!(result.to_string(), "data:image/png;base64,QUJD");
    }

    #[test]
    fn falls_back_to_text_url() {
        let result = decode(response(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here: https://x.test/a.png done"}
            ]}}]
        })))
        .unwrap();

        assert_eq!(result, GenerationResult::Url("https://x.test/a.png".into()));
    }

    #[test]
    fn missing_candidates_is_no_image() {
        let err = decode(response(json!({}))).unwrap_err();
        assert!(matches!(err, GenError::NoImage(_)));

        let err = decode(response(json!({"candidates": [{"content": {"parts": [
            {"text": "sorry"}
        ]}}]})))
        .unwrap_err();
        assert!(matches!(err, GenError::NoImage(_)));
    }

    #[test]
    fn null_lists_are_no_image() {
        let err = decode(response(json!({"candidates": null}))).unwrap_err();
        assert!(matches!(err, GenError::NoImage(_)));

        let err = decode(response(json!({"candidates": [{"content": {"parts": null}}]})))
            .unwrap_err();
        assert!(matches!(err, GenError::NoImage(_)));
    }

    #[test]
    fn classifies_statuses() {
        assert!(matches!(status_error(404, ""), GenError::EndpointNotFound(_)));
        assert!(matches!(status_error(400, ""), GenError::ParameterRejected(_)));
        assert!(matches!(status_error(401, ""), GenError::AuthRejected { status: 401, .. }));
        assert!(matches!(status_error(403, ""), GenError::AuthRejected { status: 403, .. }));
        assert!(matches!(
            status_error(500, "oops"),
            GenError::Transport { status: Some(500), .. }
        ));
    }
}
