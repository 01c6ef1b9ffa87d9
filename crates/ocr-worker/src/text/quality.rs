//! Extraction-confidence scoring.
//!
//! The score is a weighted blend of three saturating ratios. Caps and weights are part of
//! the response contract: changing them changes every score downstream has stored.

use crate::types::{Table, TextBlock};

const TEXT_WEIGHT: f64 = 0.3;
const TABLE_WEIGHT: f64 = 0.4;
const CONTENT_WEIGHT: f64 = 0.3;

const TEXT_BLOCK_CAP: f64 = 10.0;
const TABLE_CAP: f64 = 5.0;
const SUBSTANTIAL_BLOCK_CAP: f64 = 8.0;

/// Blocks longer than this many characters count as substantial content.
pub const SUBSTANTIAL_BLOCK_CHARS: usize = 100;

/// Score an extraction from collection sizes alone.
///
/// Returns a value in `[0, 1]`; `0.0` when there are neither blocks nor tables.
pub fn calculate_quality(text_blocks: usize, tables: usize, substantial_blocks: usize) -> f64 {
    if text_blocks == 0 && tables == 0 {
        return 0.0;
    }

    let text_score = (text_blocks as f64 / TEXT_BLOCK_CAP).min(1.0);
    let table_score = (tables as f64 / TABLE_CAP).min(1.0);
    let content_score = (substantial_blocks as f64 / SUBSTANTIAL_BLOCK_CAP).min(1.0);

    let score = TEXT_WEIGHT * text_score + TABLE_WEIGHT * table_score + CONTENT_WEIGHT * content_score;
    score.clamp(0.0, 1.0)
}

/// Score the final collections of a request.
pub fn score_extraction(text_blocks: &[TextBlock], tables: &[Table]) -> f64 {
    let substantial = text_blocks
        .iter()
        .filter(|block| block.text.chars().count() > SUBSTANTIAL_BLOCK_CHARS)
        .count();
    calculate_quality(text_blocks.len(), tables.len(), substantial)
}
