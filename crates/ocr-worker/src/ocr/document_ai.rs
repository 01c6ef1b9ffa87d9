//! Google Document AI backend.
//!
//! The whole PDF is sent once to a configured processor. The returned document holds the
//! full text plus per-page paragraphs and tables that address that text through
//! `textAnchor` segments. Each page becomes one block: paragraphs in order, then every
//! table as tab-separated rows between `[TABLE]` and `[/TABLE]` markers.

use super::cloud::CloudClient;
use super::{CLOUD_MAX_CHARS, TextBackend, prepare_page_text};
use crate::core::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::types::{TextBlock, TextMethod};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::path::Path;

/// Fixed confidence assigned to Document AI output.
pub const DOCUMENT_AI_CONFIDENCE: f32 = 0.95;

pub fn processor_endpoint(project_id: &str, location: &str, processor_id: &str) -> String {
    format!(
        "https://{location}-documentai.googleapis.com/v1/projects/{project_id}/locations/{location}/processors/{processor_id}:process"
    )
}

/// Int64 fields arrive as JSON strings; accept numbers too.
fn deserialize_index<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(u64),
        Text(String),
    }

    match Index::deserialize(deserializer)? {
        Index::Number(n) => Ok(n as usize),
        Index::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextSegment {
    #[serde(default, deserialize_with = "deserialize_index")]
    start_index: usize,
    #[serde(default, deserialize_with = "deserialize_index")]
    end_index: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextAnchor {
    #[serde(default)]
    text_segments: Vec<TextSegment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Layout {
    #[serde(default)]
    text_anchor: TextAnchor,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Paragraph {
    #[serde(default)]
    layout: Layout,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableCell {
    #[serde(default)]
    layout: Layout,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableRow {
    #[serde(default)]
    cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentTable {
    #[serde(default)]
    header_rows: Vec<TableRow>,
    #[serde(default)]
    body_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentPage {
    #[serde(default)]
    page_number: Option<usize>,
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
    #[serde(default)]
    tables: Vec<DocumentTable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Document {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<DocumentPage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProcessResponse {
    document: Document,
}

/// Document text addressable by character offsets.
struct AnchoredText {
    chars: Vec<char>,
}

impl AnchoredText {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    fn resolve(&self, anchor: &TextAnchor) -> String {
        anchor
            .text_segments
            .iter()
            .map(|segment| {
                let end = segment.end_index.min(self.chars.len());
                let start = segment.start_index.min(end);
                self.chars[start..end].iter().collect::<String>()
            })
            .collect()
    }
}

fn render_table(table: &DocumentTable, text: &AnchoredText) -> String {
    let mut out = String::from("[TABLE]\n");
    for row in table.header_rows.iter().chain(&table.body_rows) {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| text.resolve(&cell.layout.text_anchor).trim().to_string())
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out.push_str("[/TABLE]");
    out
}

/// Raw (uncleaned) text of one page.
fn page_raw_text(page: &DocumentPage, text: &AnchoredText) -> String {
    let mut raw: String = page
        .paragraphs
        .iter()
        .map(|p| text.resolve(&p.layout.text_anchor))
        .collect();

    for table in &page.tables {
        raw.push('\n');
        raw.push_str(&render_table(table, text));
        raw.push('\n');
    }

    raw
}

fn blocks_from_document(document: &Document) -> Vec<TextBlock> {
    let text = AnchoredText::new(&document.text);
    document
        .pages
        .iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let text = prepare_page_text(&page_raw_text(page, &text), CLOUD_MAX_CHARS)?;
            Some(TextBlock {
                page: page.page_number.unwrap_or(index + 1),
                text,
                extraction_method: TextMethod::GoogleDocumentAi,
                confidence: Some(DOCUMENT_AI_CONFIDENCE),
            })
        })
        .collect()
}

pub struct DocumentAiBackend {
    client: CloudClient,
    endpoint: Option<String>,
}

impl DocumentAiBackend {
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        let cloud = &config.cloud;
        let endpoint = match (&cloud.project_id, &cloud.processor_id) {
            (Some(project), Some(processor)) => Some(processor_endpoint(project, &cloud.location, processor)),
            _ => None,
        };

        Ok(Self {
            client: CloudClient::new(cloud)?,
            endpoint,
        })
    }
}

#[async_trait]
impl TextBackend for DocumentAiBackend {
    fn name(&self) -> &str {
        "document_ai"
    }

    fn method_tag(&self) -> &str {
        "document_ai"
    }

    async fn extract_text(&self, pdf_path: &Path) -> Result<Vec<TextBlock>> {
        let Some(endpoint) = &self.endpoint else {
            return Err(WorkerError::validation(
                "Document AI needs both a project id and a processor id",
            ));
        };

        let pdf = tokio::fs::read(pdf_path).await?;
        let body = json!({
            "rawDocument": {
                "content": STANDARD.encode(&pdf),
                "mimeType": "application/pdf",
            }
        });

        let response: ProcessResponse = self.client.post_json(endpoint, &body).await?;
        tracing::debug!(pages = response.document.pages.len(), "Document AI returned document");
        Ok(blocks_from_document(&response.document))
    }
}
