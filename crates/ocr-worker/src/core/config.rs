//! Worker configuration.
//!
//! Configuration is an explicit value handed to the pipeline at construction time. It is
//! assembled from (lowest to highest precedence) built-in defaults, an optional
//! `ocr-worker.toml`, and environment variables.

use crate::{Result, WorkerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "ocr-worker.toml";

/// Main worker configuration.
///
/// ```rust
/// use ocr_worker::core::config::WorkerConfig;
///
/// let config = WorkerConfig::default();
/// assert_eq!(config.ocr_dpi, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Inputs at or over this size are rejected before any work
    #[serde(default = "default_max_pdf_bytes")]
    pub max_pdf_bytes: usize,

    /// Rasterization DPI for the image-based backends
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u16,

    /// Only the first N pages are rasterized
    #[serde(default = "default_max_ocr_pages")]
    pub max_ocr_pages: usize,

    /// Timeout for `pdf_url` downloads
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub tesseract: TesseractConfig,
}

/// Google Cloud backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Document AI processor region
    #[serde(default = "default_location")]
    pub location: String,

    /// Presence selects the Document AI backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_id: Option<String>,

    /// Gates the Cloud Vision backend
    #[serde(default)]
    pub vision_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth access token. Never written back out.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Local Tesseract backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseractConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_languages")]
    pub languages: String,

    #[serde(default = "default_oem")]
    pub oem: u8,

    #[serde(default = "default_psm")]
    pub psm: u8,

    /// Executable name or path
    #[serde(default = "default_binary")]
    pub binary: String,
}

/// Text backend selected by a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    DocumentAi,
    Vision,
    Tesseract,
    TextLayer,
}

fn default_max_pdf_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_ocr_dpi() -> u16 {
    200
}

fn default_max_ocr_pages() -> usize {
    20
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_location() -> String {
    "us".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_languages() -> String {
    "eng+ita".to_string()
}

fn default_oem() -> u8 {
    3
}

fn default_psm() -> u8 {
    6
}

fn default_binary() -> String {
    "tesseract".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_pdf_bytes: default_max_pdf_bytes(),
            ocr_dpi: default_ocr_dpi(),
            max_ocr_pages: default_max_ocr_pages(),
            download_timeout_secs: default_download_timeout_secs(),
            cloud: CloudConfig::default(),
            tesseract: TesseractConfig::default(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: default_location(),
            processor_id: None,
            vision_enabled: false,
            api_key: None,
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            languages: default_languages(),
            oem: default_oem(),
            psm: default_psm(),
            binary: default_binary(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl WorkerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WorkerError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| WorkerError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Discover `ocr-worker.toml` in the current directory or any parent.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(WorkerError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Explicit file if given, else a discovered one, else defaults; then environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::discover()?.unwrap_or_default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DOCUMENT_AI_PROCESSOR_ID").and_then(non_empty) {
            self.cloud.processor_id = Some(value);
        }
        if let Some(value) = lookup("DOCUMENT_AI_LOCATION").and_then(non_empty) {
            self.cloud.location = value;
        }
        if let Some(value) = lookup("GOOGLE_CLOUD_PROJECT").and_then(non_empty) {
            self.cloud.project_id = Some(value);
        }
        if let Some(value) = lookup("GOOGLE_VISION_ENABLED") {
            self.cloud.vision_enabled = parse_flag(&value);
        }
        if let Some(value) = lookup("GOOGLE_API_KEY").and_then(non_empty) {
            self.cloud.api_key = Some(value);
        }
        if let Some(value) = lookup("GOOGLE_ACCESS_TOKEN").and_then(non_empty) {
            self.cloud.access_token = Some(value);
        }
        if let Some(value) = lookup("TESSERACT_ENABLED") {
            self.tesseract.enabled = parse_flag(&value);
        }
        if let Some(value) = lookup("OCR_WORKER_MAX_PDF_BYTES") {
            self.max_pdf_bytes = value.trim().parse().map_err(|e| {
                WorkerError::validation(format!("Invalid OCR_WORKER_MAX_PDF_BYTES '{}': {}", value, e))
            })?;
        }
        Ok(())
    }

    /// True when Cloud Vision is enabled and some credential is available.
    pub fn vision_available(&self) -> bool {
        self.cloud.vision_enabled && (self.cloud.api_key.is_some() || self.cloud.access_token.is_some())
    }

    /// Backend in priority order: Document AI, Cloud Vision, Tesseract, text layer.
    pub fn backend_kind(&self) -> BackendKind {
        if self.cloud.processor_id.is_some() {
            BackendKind::DocumentAi
        } else if self.vision_available() {
            BackendKind::Vision
        } else if self.tesseract.enabled {
            BackendKind::Tesseract
        } else {
            BackendKind::TextLayer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_pdf_bytes, 100 * 1024 * 1024);
        assert_eq!(config.max_ocr_pages, 20);
        assert_eq!(config.download_timeout_secs, 30);
        assert_eq!(config.cloud.location, "us");
        assert_eq!(config.tesseract.languages, "eng+ita");
        assert_eq!(config.backend_kind(), BackendKind::TextLayer);
    }

    #[test]
    fn test_from_toml_file_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
ocr_dpi = 300

[tesseract]
enabled = true
languages = "eng"
"#,
        )
        .unwrap();

        let config = WorkerConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.ocr_dpi, 300);
        assert_eq!(config.max_ocr_pages, 20);
        assert!(config.tesseract.enabled);
        assert_eq!(config.tesseract.languages, "eng");
        assert_eq!(config.tesseract.psm, 6);
        assert_eq!(config.backend_kind(), BackendKind::Tesseract);
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "ocr_dpi = \"lots\"").unwrap();

        let err = WorkerConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, WorkerError::Validation { .. }));
    }

    #[test]
    fn test_from_toml_file_missing() {
        assert!(WorkerConfig::from_toml_file("/nonexistent/ocr-worker.toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WorkerConfig::default();
        config
            .apply_env_overrides(env(&[
                ("DOCUMENT_AI_PROCESSOR_ID", "p123"),
                ("DOCUMENT_AI_LOCATION", "eu"),
                ("GOOGLE_CLOUD_PROJECT", "acme"),
                ("OCR_WORKER_MAX_PDF_BYTES", "1024"),
            ]))
            .unwrap();

        assert_eq!(config.cloud.processor_id.as_deref(), Some("p123"));
        assert_eq!(config.cloud.location, "eu");
        assert_eq!(config.cloud.project_id.as_deref(), Some("acme"));
        assert_eq!(config.max_pdf_bytes, 1024);
        assert_eq!(config.backend_kind(), BackendKind::DocumentAi);
    }

    #[test]
    fn test_env_blank_processor_is_ignored() {
        let mut config = WorkerConfig::default();
        config.apply_env_overrides(env(&[("DOCUMENT_AI_PROCESSOR_ID", "  ")])).unwrap();
        assert!(config.cloud.processor_id.is_none());
    }

    #[test]
    fn test_env_invalid_size_is_validation_error() {
        let mut config = WorkerConfig::default();
        let err = config
            .apply_env_overrides(env(&[("OCR_WORKER_MAX_PDF_BYTES", "huge")]))
            .unwrap_err();
        assert!(matches!(err, WorkerError::Validation { .. }));
    }

    #[test]
    fn test_vision_needs_credentials() {
        let mut config = WorkerConfig::default();
        config.apply_env_overrides(env(&[("GOOGLE_VISION_ENABLED", "true")])).unwrap();
        assert!(!config.vision_available());
        assert_eq!(config.backend_kind(), BackendKind::TextLayer);

        config.apply_env_overrides(env(&[("GOOGLE_API_KEY", "key")])).unwrap();
        assert_eq!(config.backend_kind(), BackendKind::Vision);
    }

    #[test]
    fn test_vision_outranks_tesseract() {
        let mut config = WorkerConfig::default();
        config.tesseract.enabled = true;
        config.cloud.vision_enabled = true;
        config.cloud.access_token = Some("token".to_string());
        assert_eq!(config.backend_kind(), BackendKind::Vision);
    }

    #[test]
    fn test_access_token_not_serialized() {
        let mut config = WorkerConfig::default();
        config.cloud.access_token = Some("secret".to_string());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret"));
    }
}
