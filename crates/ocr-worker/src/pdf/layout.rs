//! Positioned words and ruling lines for table detection.
//!
//! Words come from pdfium's character boxes, grouped with spacing heuristics. Ruling lines
//! come from the page content stream (lopdf): stroked lines and thin filled rectangles, the
//! two ways PDF generators draw table borders. All coordinates are PDF user space
//! (bottom-left origin, points).

use super::bindings::{bind_pdfium, load_document};
use super::error::{PdfError, Result};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use pdfium_render::prelude::*;
use std::path::Path;

/// Characters separated by more than this distance (points) start a new word.
const WORD_SPACING_THRESHOLD: f32 = 3.0;

/// Rectangles thinner than this (points) are treated as a single ruling line.
const RULE_MAX_THICKNESS: f32 = 2.0;

/// Segments shorter than this (points) are glyph decorations, not rulings.
const RULE_MIN_LENGTH: f32 = 4.0;

/// A word with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            y0,
            y1,
        }
    }

    pub fn x_center(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn y_center(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }
}

/// An axis-aligned ruling segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Ruling {
    /// Build a normalized segment (`x0 <= x1`, `y0 <= y1`).
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        (self.y1 - self.y0) <= RULE_MAX_THICKNESS && (self.x1 - self.x0) >= RULE_MIN_LENGTH
    }

    pub fn is_vertical(&self) -> bool {
        (self.x1 - self.x0) <= RULE_MAX_THICKNESS && (self.y1 - self.y0) >= RULE_MIN_LENGTH
    }
}

/// Everything the table strategies need to know about one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: usize,
    pub words: Vec<Word>,
    pub rulings: Vec<Ruling>,
}

/// Read words and rulings for every page of the PDF at `path`.
pub fn read_page_layouts(path: &Path) -> Result<Vec<PageLayout>> {
    let pdfium = bind_pdfium(PdfError::LayoutExtractionFailed, "table layout")?;
    let document = load_document(&pdfium, path)?;

    let rulings_by_page = match Document::load(path) {
        Ok(doc) => doc
            .get_pages()
            .values()
            .map(|page_id| extract_rulings(&doc, *page_id))
            .collect::<Vec<_>>(),
        Err(e) => {
            tracing::warn!("Content stream unavailable, lattice detection disabled: {}", e);
            Vec::new()
        }
    };

    let mut layouts = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let words = extract_words_from_page(&page)?;
        layouts.push(PageLayout {
            page_number: index + 1,
            words,
            rulings: rulings_by_page.get(index).cloned().unwrap_or_default(),
        });
    }

    Ok(layouts)
}

/// Extract words with positions from a PDF page.
pub fn extract_words_from_page(page: &PdfPage) -> Result<Vec<Word>> {
    let page_text = page
        .text()
        .map_err(|e| PdfError::LayoutExtractionFailed(format!("Failed to get page text: {}", e)))?;

    group_chars_into_words(page_text.chars())
}

/// Character with position information extracted from PDF.
#[derive(Debug, Clone)]
struct CharInfo {
    text: char,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

fn group_chars_into_words(chars: PdfPageTextChars) -> Result<Vec<Word>> {
    let mut words: Vec<Word> = Vec::new();
    let mut current_word_chars: Vec<CharInfo> = Vec::new();

    for pdf_char in chars.iter() {
        let bounds = pdf_char
            .loose_bounds()
            .map_err(|e| PdfError::LayoutExtractionFailed(format!("Failed to get char bounds: {}", e)))?;

        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };

        let char_info = CharInfo {
            text: ch,
            x: bounds.left().value,
            y: bounds.bottom().value,
            width: bounds.width().value,
            height: bounds.height().value,
        };

        if char_info.text.is_whitespace() {
            if let Some(word) = finalize_word(&current_word_chars) {
                words.push(word);
            }
            current_word_chars.clear();
            continue;
        }

        if should_start_new_word(&current_word_chars, &char_info) {
            if let Some(word) = finalize_word(&current_word_chars) {
                words.push(word);
            }
            current_word_chars.clear();
        }

        current_word_chars.push(char_info);
    }

    if let Some(word) = finalize_word(&current_word_chars) {
        words.push(word);
    }

    Ok(words)
}

/// A character far from the previous one, or on another line, starts a new word.
fn should_start_new_word(current_word_chars: &[CharInfo], new_char: &CharInfo) -> bool {
    let Some(last_char) = current_word_chars.last() else {
        return false;
    };

    let vertical_distance = (new_char.y - last_char.y).abs();
    if vertical_distance > last_char.height * 0.5 {
        return true;
    }

    let horizontal_gap = new_char.x - (last_char.x + last_char.width);
    horizontal_gap > WORD_SPACING_THRESHOLD
}

fn finalize_word(chars: &[CharInfo]) -> Option<Word> {
    if chars.is_empty() {
        return None;
    }

    let text: String = chars.iter().map(|c| c.text).collect();
    let x0 = chars.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    let x1 = chars.iter().map(|c| c.x + c.width).fold(f32::NEG_INFINITY, f32::max);
    let y0 = chars.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    let y1 = chars.iter().map(|c| c.y + c.height).fold(f32::NEG_INFINITY, f32::max);

    Some(Word { text, x0, x1, y0, y1 })
}

/// 2D affine transform `[a b c d e f]` as used by the PDF `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

fn operand_floats(operands: &[Object]) -> Option<Vec<f32>> {
    operands.iter().map(|o| o.as_float().ok()).collect()
}

/// Pending path segment in device space, before painting decides whether it counts.
enum PathPiece {
    Line(Ruling),
    Rect { x0: f32, y0: f32, x1: f32, y1: f32 },
}

fn extract_rulings(doc: &Document, page_id: ObjectId) -> Vec<Ruling> {
    let content = match doc.get_page_content(page_id).and_then(|data| Content::decode(&data)) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("Skipping rulings for page {:?}: {}", page_id, e);
            return Vec::new();
        }
    };

    rulings_from_operations(&content.operations)
}

/// Walk content-stream operations and collect painted axis-aligned segments.
pub(crate) fn rulings_from_operations(operations: &[lopdf::content::Operation]) -> Vec<Ruling> {
    let mut rulings = Vec::new();
    let mut ctm = Matrix::IDENTITY;
    let mut stack: Vec<Matrix> = Vec::new();
    let mut path: Vec<PathPiece> = Vec::new();
    let mut current: Option<(f32, f32)> = None;

    for op in operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => ctm = stack.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(v) = operand_floats(&op.operands).filter(|v| v.len() == 6) {
                    ctm = Matrix([v[0], v[1], v[2], v[3], v[4], v[5]]).then(&ctm);
                }
            }
            "m" => {
                if let Some(v) = operand_floats(&op.operands).filter(|v| v.len() == 2) {
                    current = Some(ctm.apply(v[0], v[1]));
                }
            }
            "l" => {
                if let Some(v) = operand_floats(&op.operands).filter(|v| v.len() == 2) {
                    let end = ctm.apply(v[0], v[1]);
                    if let Some(start) = current {
                        path.push(PathPiece::Line(Ruling::new(start.0, start.1, end.0, end.1)));
                    }
                    current = Some(end);
                }
            }
            "re" => {
                if let Some(v) = operand_floats(&op.operands).filter(|v| v.len() == 4) {
                    let (ax, ay) = ctm.apply(v[0], v[1]);
                    let (bx, by) = ctm.apply(v[0] + v[2], v[1] + v[3]);
                    path.push(PathPiece::Rect {
                        x0: ax.min(bx),
                        y0: ay.min(by),
                        x1: ax.max(bx),
                        y1: ay.max(by),
                    });
                    current = Some((ax, ay));
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                for piece in path.drain(..) {
                    push_piece(&mut rulings, piece);
                }
                current = None;
            }
            "n" => {
                path.clear();
                current = None;
            }
            _ => {}
        }
    }

    rulings
}

fn push_piece(rulings: &mut Vec<Ruling>, piece: PathPiece) {
    match piece {
        PathPiece::Line(ruling) => {
            if ruling.is_horizontal() || ruling.is_vertical() {
                rulings.push(ruling);
            }
        }
        PathPiece::Rect { x0, y0, x1, y1 } => {
            let width = x1 - x0;
            let height = y1 - y0;
            if height <= RULE_MAX_THICKNESS || width <= RULE_MAX_THICKNESS {
                let ruling = Ruling::new(x0, y0, x1, y1);
                if ruling.is_horizontal() || ruling.is_vertical() {
                    rulings.push(ruling);
                }
            } else {
                rulings.push(Ruling::new(x0, y0, x1, y0));
                rulings.push(Ruling::new(x0, y1, x1, y1));
                rulings.push(Ruling::new(x0, y0, x0, y1));
                rulings.push(Ruling::new(x1, y0, x1, y1));
            }
        }
    }
}
