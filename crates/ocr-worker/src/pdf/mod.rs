//! PDF access.
//!
//! - **Layout**: positioned words (pdfium) and ruling lines (content stream) for table
//!   detection
//! - **Rendering**: pages rasterized to PNG for the image-based text backends
//! - **Text layer**: embedded page text without rasterization (lopdf)
mod bindings;
pub mod error;
pub mod layout;
pub mod rendering;
pub mod text;

pub use error::PdfError;
pub use layout::{PageLayout, Ruling, Word, read_page_layouts};
pub use rendering::render_pages_to_png;
pub use text::TextLayer;
