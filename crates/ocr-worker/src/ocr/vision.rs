//! Google Cloud Vision `DOCUMENT_TEXT_DETECTION` per page image.

use super::cloud::CloudClient;
use super::raster::{PageRecognizer, PageText, PdfiumRasterizer, RasterBackend, RasterSettings};
use super::CLOUD_MAX_CHARS;
use crate::core::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::types::TextMethod;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Confidence reported when the response carries no per-token scores.
pub const DEFAULT_VISION_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<StatusError>,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

/// Mean confidence of the token annotations, i.e. everything after the first
/// whole-text annotation. Tokens without a score are ignored.
pub fn mean_token_confidence(annotations: &[TextAnnotation]) -> f32 {
    if annotations.len() < 2 {
        return DEFAULT_VISION_CONFIDENCE;
    }

    let scores: Vec<f32> = annotations[1..].iter().filter_map(|a| a.confidence).collect();
    if scores.is_empty() {
        return DEFAULT_VISION_CONFIDENCE;
    }

    scores.iter().sum::<f32>() / scores.len() as f32
}

fn page_text_from_response(response: BatchAnnotateResponse) -> Result<PageText> {
    let Some(image) = response.responses.into_iter().next() else {
        return Err(WorkerError::backend("Vision returned no response for the image"));
    };

    if let Some(error) = image.error {
        return Err(WorkerError::backend(format!(
            "Vision error {}: {}",
            error.code, error.message
        )));
    }

    let confidence = mean_token_confidence(&image.text_annotations);
    let text = image
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description)
        .unwrap_or_default();

    Ok(PageText {
        text,
        confidence: Some(confidence),
    })
}

pub struct VisionRecognizer {
    client: CloudClient,
    endpoint: String,
}

impl VisionRecognizer {
    pub fn new(config: &WorkerConfig) -> Result<Self> {
        Ok(Self {
            client: CloudClient::new(&config.cloud)?,
            endpoint: VISION_ENDPOINT.to_string(),
        })
    }
}

#[async_trait]
impl PageRecognizer for VisionRecognizer {
    async fn recognize(&self, png: &[u8]) -> Result<PageText> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(png) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
            }]
        });

        let response: BatchAnnotateResponse = self.client.post_json(&self.endpoint, &body).await?;
        page_text_from_response(response)
    }
}

impl RasterBackend<VisionRecognizer> {
    pub fn vision(config: &WorkerConfig) -> Result<Self> {
        Ok(RasterBackend::new(
            Arc::new(PdfiumRasterizer),
            VisionRecognizer::new(config)?,
            RasterSettings {
                name: "google_vision",
                method_tag: "vision_api",
                method: TextMethod::GoogleVisionApi,
                dpi: config.ocr_dpi,
                max_pages: config.max_ocr_pages,
                max_chars: CLOUD_MAX_CHARS,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(text: &str, confidence: Option<f32>) -> TextAnnotation {
        TextAnnotation {
            description: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_confidence_defaults_with_single_annotation() {
        assert_eq!(mean_token_confidence(&[]), DEFAULT_VISION_CONFIDENCE);
        assert_eq!(
            mean_token_confidence(&[annotation("whole page", Some(0.1))]),
            DEFAULT_VISION_CONFIDENCE
        );
    }

    #[test]
    fn test_confidence_excludes_whole_text_annotation() {
        let annotations = vec![
            annotation("VCC 3.3", Some(0.1)),
            annotation("VCC", Some(0.9)),
            annotation("3.3", Some(0.7)),
        ];
        assert!((mean_token_confidence(&annotations) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_ignores_unscored_tokens() {
        let annotations = vec![
            annotation("VCC 3.3", None),
            annotation("VCC", None),
            annotation("3.3", Some(0.6)),
        ];
        assert!((mean_token_confidence(&annotations) - 0.6).abs() < 1e-6);
        assert_eq!(
            mean_token_confidence(&[annotation("a b", None), annotation("a", None)]),
            DEFAULT_VISION_CONFIDENCE
        );
    }

    #[test]
    fn test_response_takes_first_annotation_as_text() {
        let response: BatchAnnotateResponse = serde_json::from_value(json!({
            "responses": [{
                "textAnnotations": [
                    { "description": "Supply voltage 3.3 V" },
                    { "description": "Supply", "confidence": 0.5 },
                    { "description": "voltage", "confidence": 1.0 }
                ]
            }]
        }))
        .unwrap();

        let page = page_text_from_response(response).unwrap();
        assert_eq!(page.text, "Supply voltage 3.3 V");
        assert_eq!(page.confidence, Some(0.75));
    }

    #[test]
    fn test_response_error_fails_the_page() {
        let response: BatchAnnotateResponse = serde_json::from_value(json!({
            "responses": [{ "error": { "code": 3, "message": "Bad image data." } }]
        }))
        .unwrap();

        let err = page_text_from_response(response).unwrap_err();
        assert!(err.to_string().contains("Bad image data."));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let response: BatchAnnotateResponse = serde_json::from_value(json!({ "responses": [{}] })).unwrap();
        let page = page_text_from_response(response).unwrap();
        assert!(page.text.is_empty());
    }
}
