//! Table extraction.
//!
//! Several independent detection strategies run over the same PDF and the one that
//! finds the most tables wins. The winner's raw grids are then cleaned into [`Table`]s:
//! placeholder cells dropped, cell text normalized, the first non-empty row tagged as
//! header.
//!
//! Strategies only ever see a file path, so alternative detectors can be plugged in
//! through [`TableStrategy`] without touching the selection logic.

pub mod detect;

use crate::error::Result;
use crate::pdf::read_page_layouts;
use crate::text::normalize::{is_placeholder_cell, normalize_cell};
use crate::types::{Cell, Row, RowType, Table};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

pub use detect::DetectionMode;

/// Wire value of `Table::extraction_method`.
pub const TABLE_EXTRACTION_METHOD: &str = "tabula";

/// A detected grid before cleaning. Cells are `None` where the detector found no text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// 1-based page the grid was found on.
    pub page: usize,
    pub rows: Vec<Vec<Option<String>>>,
}

/// A table detection strategy.
pub trait TableStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Detect every table in the PDF at `path`, in document order.
    fn extract(&self, path: &Path) -> Result<Vec<RawTable>>;
}

/// Strategy backed by the layout detectors in [`detect`].
#[derive(Debug, Clone, Copy)]
pub struct LayoutStrategy {
    mode: DetectionMode,
}

impl LayoutStrategy {
    pub fn new(mode: DetectionMode) -> Self {
        Self { mode }
    }
}

impl TableStrategy for LayoutStrategy {
    fn name(&self) -> &str {
        self.mode.name()
    }

    fn extract(&self, path: &Path) -> Result<Vec<RawTable>> {
        let layouts = read_page_layouts(path)?;
        Ok(layouts.iter().flat_map(|page| self.mode.detect(page)).collect())
    }
}

/// Pick the strategy result with strictly the most tables; ties keep the earliest.
pub fn select_best<T>(results: Vec<(String, Vec<T>)>) -> Option<(String, Vec<T>)> {
    results.into_iter().fold(None, |best, candidate| match best {
        Some(current) if current.1.len() >= candidate.1.len() => Some(current),
        _ => Some(candidate),
    })
}

/// Clean one raw grid into rows. Returns `None` for grids with fewer than two
/// non-empty rows.
fn build_rows(raw: &RawTable) -> Option<Vec<Row>> {
    let mut rows: Vec<Row> = Vec::new();

    for raw_row in &raw.rows {
        let is_header = rows.is_empty();
        let cells: Vec<Cell> = raw_row
            .iter()
            .enumerate()
            .filter_map(|(col, value)| {
                let value = value.as_deref()?;
                if is_placeholder_cell(value) {
                    return None;
                }
                let text = normalize_cell(value);
                (!text.is_empty()).then_some(Cell { text, col, is_header })
            })
            .collect();

        if cells.is_empty() {
            continue;
        }

        rows.push(Row {
            cells,
            row_type: if is_header { RowType::Header } else { RowType::Data },
        });
    }

    (rows.len() >= 2).then_some(rows)
}

/// Convert a strategy's raw grids into output tables.
///
/// `page` is the grid's 1-based position in the strategy output (skipped grids keep
/// their slot); the page the grid was found on goes to `source_page`.
pub fn build_tables(strategy: &str, raw_tables: &[RawTable]) -> Vec<Table> {
    raw_tables
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let rows = build_rows(raw)?;
            let columns = rows[0].cells.len();
            let data_rows = rows.iter().filter(|r| r.row_type == RowType::Data).count();
            Some(Table {
                page: index + 1,
                source_page: raw.page,
                table_id: format!("{}_{}", strategy, index),
                rows,
                extraction_method: TABLE_EXTRACTION_METHOD.to_string(),
                columns,
                data_rows,
            })
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Result of running all strategies.
#[derive(Debug, Clone, Default)]
pub struct TableExtraction {
    /// Winning strategy, `None` when every strategy failed.
    pub strategy: Option<String>,
    pub tables: Vec<Table>,
}

/// Runs the configured strategies and keeps the best result.
#[derive(Clone)]
pub struct TableExtractor {
    strategies: Vec<Arc<dyn TableStrategy>>,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(LayoutStrategy::new(DetectionMode::Standard)),
            Arc::new(LayoutStrategy::new(DetectionMode::Lattice)),
            Arc::new(LayoutStrategy::new(DetectionMode::Stream)),
        ])
    }
}

impl TableExtractor {
    pub fn new(strategies: Vec<Arc<dyn TableStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy in order. A strategy that fails or panics is logged and skipped;
    /// if all fail the extraction is empty.
    pub fn extract(&self, path: &Path) -> TableExtraction {
        let mut results = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(path))) {
                Ok(Ok(raw)) => {
                    tracing::debug!(strategy = strategy.name(), count = raw.len(), "Table strategy finished");
                    results.push((strategy.name().to_string(), raw));
                }
                Ok(Err(e)) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "Table strategy failed");
                }
                Err(payload) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        panic = panic_message(payload.as_ref()),
                        "Table strategy panicked"
                    );
                }
            }
        }

        match select_best(results) {
            Some((name, raw)) => {
                let tables = build_tables(&name, &raw);
                TableExtraction {
                    strategy: Some(name),
                    tables,
                }
            }
            None => TableExtraction::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;

    struct FixedStrategy {
        name: &'static str,
        tables: usize,
    }

    impl TableStrategy for FixedStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn extract(&self, _path: &Path) -> Result<Vec<RawTable>> {
            Ok((0..self.tables).map(|i| sample_raw(i + 1)).collect())
        }
    }

    struct FailingStrategy;

    impl TableStrategy for FailingStrategy {
        fn name(&self) -> &str {
            "broken"
        }

        fn extract(&self, _path: &Path) -> Result<Vec<RawTable>> {
            Err(WorkerError::parsing("no layout"))
        }
    }

    struct PanickingStrategy;

    impl TableStrategy for PanickingStrategy {
        fn name(&self) -> &str {
            "lattice"
        }

        fn extract(&self, _path: &Path) -> Result<Vec<RawTable>> {
            panic!("pdfium crashed on page 2");
        }
    }

    fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn sample_raw(page: usize) -> RawTable {
        RawTable {
            page,
            rows: vec![
                vec![cell("Param"), cell("Min"), cell("Max")],
                vec![cell("VCC"), cell("2.7"), cell("5.5")],
            ],
        }
    }

    fn extractor(counts: &[(&'static str, usize)]) -> TableExtractor {
        TableExtractor::new(
            counts
                .iter()
                .map(|&(name, tables)| Arc::new(FixedStrategy { name, tables }) as Arc<dyn TableStrategy>)
                .collect(),
        )
    }

    #[test]
    fn test_select_best_prefers_most_tables() {
        let best = select_best(vec![
            ("standard".to_string(), vec![1]),
            ("lattice".to_string(), vec![1, 2, 3]),
            ("stream".to_string(), vec![1, 2]),
        ]);
        assert_eq!(best.map(|(name, _)| name), Some("lattice".to_string()));
    }

    #[test]
    fn test_select_best_tie_keeps_first() {
        let best = select_best(vec![
            ("standard".to_string(), vec![1, 2]),
            ("lattice".to_string(), vec![1, 2]),
        ]);
        assert_eq!(best.map(|(name, _)| name), Some("standard".to_string()));
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best::<u8>(Vec::new()).is_none());
    }

    #[test]
    fn test_extractor_picks_lattice() {
        let result = extractor(&[("standard", 1), ("lattice", 3), ("stream", 2)]).extract(Path::new("unused.pdf"));
        assert_eq!(result.strategy.as_deref(), Some("lattice"));
        assert_eq!(result.tables.len(), 3);
        assert_eq!(result.tables[2].table_id, "lattice_2");
    }

    #[test]
    fn test_extractor_skips_failing_strategy() {
        let result = TableExtractor::new(vec![
            Arc::new(FailingStrategy),
            Arc::new(FixedStrategy { name: "stream", tables: 1 }),
        ])
        .extract(Path::new("unused.pdf"));
        assert_eq!(result.strategy.as_deref(), Some("stream"));
        assert_eq!(result.tables.len(), 1);
    }

    #[test]
    fn test_extractor_skips_panicking_strategy() {
        let result = TableExtractor::new(vec![
            Arc::new(FixedStrategy { name: "standard", tables: 1 }),
            Arc::new(PanickingStrategy),
            Arc::new(FixedStrategy { name: "stream", tables: 2 }),
        ])
        .extract(Path::new("unused.pdf"));
        assert_eq!(result.strategy.as_deref(), Some("stream"));
        assert_eq!(result.tables.len(), 2);
    }

    #[test]
    fn test_panic_message_payloads() {
        let literal = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "static message");

        let formatted = panic::catch_unwind(|| panic!("page {}", 7)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "page 7");
    }

    #[test]
    fn test_extractor_all_failing_is_empty() {
        let result = TableExtractor::new(vec![Arc::new(FailingStrategy)]).extract(Path::new("unused.pdf"));
        assert!(result.strategy.is_none());
        assert!(result.tables.is_empty());
    }

    #[test]
    fn test_build_tables_header_and_normalization() {
        let raw = RawTable {
            page: 4,
            rows: vec![
                vec![None, cell("nan"), None],
                vec![cell("Param"), cell("  Lower  bound "), cell("Max")],
                vec![cell("VCC"), cell("NaN"), cell("5.5 TYP")],
                vec![cell("ICC"), cell("1"), cell("None")],
            ],
        };
        let tables = build_tables("stream", &[raw]);
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.page, 1);
        assert_eq!(table.source_page, 4);
        assert_eq!(table.table_id, "stream_0");
        assert_eq!(table.extraction_method, "tabula");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.columns, 3);
        assert_eq!(table.data_rows, 2);

        assert_eq!(table.rows[0].row_type, RowType::Header);
        assert!(table.rows[0].cells.iter().all(|c| c.is_header));
        assert_eq!(table.rows[0].cells[1].text, "Lower bound");

        let vcc = &table.rows[1];
        assert_eq!(vcc.row_type, RowType::Data);
        assert_eq!(vcc.cells.len(), 2);
        assert_eq!(vcc.cells[1].text, "5.5 typical");
        assert_eq!(vcc.cells[1].col, 2);
        assert!(!vcc.cells[1].is_header);
    }

    #[test]
    fn test_build_tables_drops_single_row_grids_but_keeps_positions() {
        let single = RawTable {
            page: 1,
            rows: vec![vec![cell("Only")], vec![None, cell("nan")]],
        };
        let tables = build_tables("lattice", &[single, sample_raw(2)]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 2);
        assert_eq!(tables[0].table_id, "lattice_1");
    }

    #[test]
    fn test_default_extractor_strategy_order() {
        assert_eq!(TableExtractor::default().strategy_names(), vec!["standard", "lattice", "stream"]);
    }
}
