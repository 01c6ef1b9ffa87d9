pub mod normalize;
pub mod quality;

pub use normalize::{clean_text, collapse_whitespace, is_placeholder_cell, normalize_cell, truncate_chars};
pub use quality::{calculate_quality, score_extraction};
