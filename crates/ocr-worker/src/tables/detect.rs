//! Table detection over page layouts.
//!
//! Three detection modes with different layout assumptions:
//!
//! - **Standard**: no assumption; every text line on a page belongs to one candidate grid
//! - **Lattice**: tables are drawn with ruling lines; cells are the boxes between them
//! - **Stream**: tables are whitespace-aligned; a table is a run of consecutive lines that
//!   each split into at least two columns
//!
//! Detection never infers headers; it only produces grids of optional cell strings.

use super::RawTable;
use crate::pdf::{PageLayout, Ruling, Word};

/// Words whose vertical centres differ by less than this fraction of the line height sit
/// on the same line.
const LINE_TOLERANCE_RATIO: f32 = 0.5;

/// Horizontal gap, as a multiple of line height, that separates two columns.
const COLUMN_GAP_RATIO: f32 = 1.2;
const MIN_COLUMN_GAP: f32 = 6.0;

/// Maximum distance between consecutive stream rows, as a multiple of line height.
const ROW_GAP_RATIO: f32 = 2.5;

/// Slack (points) when comparing column extents and ruling positions.
const POSITION_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    Standard,
    Lattice,
    Stream,
}

impl DetectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            DetectionMode::Standard => "standard",
            DetectionMode::Lattice => "lattice",
            DetectionMode::Stream => "stream",
        }
    }

    /// Detect the raw tables of one page.
    pub fn detect(&self, page: &PageLayout) -> Vec<RawTable> {
        match self {
            DetectionMode::Standard => detect_standard(page),
            DetectionMode::Lattice => detect_lattice(page),
            DetectionMode::Stream => detect_stream(page),
        }
    }
}

#[derive(Debug, Clone)]
struct TextLine {
    words: Vec<Word>,
    y_center: f32,
    height: f32,
}

/// Contiguous run of words inside a line, i.e. one candidate cell.
#[derive(Debug, Clone)]
struct Segment {
    text: String,
    x0: f32,
    x1: f32,
}

impl Segment {
    fn center(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

/// Group words into lines, top of the page first, words left to right.
fn group_into_lines(words: &[Word]) -> Vec<TextLine> {
    let mut sorted: Vec<&Word> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.y_center().total_cmp(&a.y_center()).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<TextLine> = Vec::new();
    for word in sorted {
        if let Some(line) = lines.last_mut() {
            let tolerance = line.height.max(word.height()) * LINE_TOLERANCE_RATIO;
            if (line.y_center - word.y_center()).abs() <= tolerance {
                let n = line.words.len() as f32;
                line.y_center = (line.y_center * n + word.y_center()) / (n + 1.0);
                line.height = line.height.max(word.height());
                line.words.push(word.clone());
                continue;
            }
        }

        lines.push(TextLine {
            words: vec![word.clone()],
            y_center: word.y_center(),
            height: word.height(),
        });
    }

    for line in &mut lines {
        line.words.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }

    lines
}

/// Split a line into cells wherever the gap between words is wide.
fn split_segments(line: &TextLine) -> Vec<Segment> {
    let gap_threshold = (line.height * COLUMN_GAP_RATIO).max(MIN_COLUMN_GAP);
    let mut segments: Vec<Segment> = Vec::new();

    for word in &line.words {
        match segments.last_mut() {
            Some(segment) if word.x0 - segment.x1 < gap_threshold => {
                segment.text.push(' ');
                segment.text.push_str(&word.text);
                segment.x1 = segment.x1.max(word.x1);
            }
            _ => segments.push(Segment {
                text: word.text.clone(),
                x0: word.x0,
                x1: word.x1,
            }),
        }
    }

    segments
}

/// Column extents shared by all rows, derived from rows with at least two cells.
fn column_bands(rows: &[Vec<Segment>]) -> Vec<(f32, f32)> {
    let mut spans: Vec<(f32, f32)> = rows
        .iter()
        .filter(|row| row.len() >= 2)
        .flatten()
        .map(|segment| (segment.x0, segment.x1))
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut bands: Vec<(f32, f32)> = Vec::new();
    for (x0, x1) in spans {
        match bands.last_mut() {
            Some(band) if x0 <= band.1 + POSITION_TOLERANCE => band.1 = band.1.max(x1),
            _ => bands.push((x0, x1)),
        }
    }

    bands
}

fn band_index(bands: &[(f32, f32)], segment: &Segment) -> usize {
    let center = segment.center();
    bands
        .iter()
        .position(|(x0, x1)| center >= x0 - POSITION_TOLERANCE && center <= x1 + POSITION_TOLERANCE)
        .or_else(|| {
            bands
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let da = (center - (a.0 + a.1) / 2.0).abs();
                    let db = (center - (b.0 + b.1) / 2.0).abs();
                    da.total_cmp(&db)
                })
                .map(|(index, _)| index)
        })
        .unwrap_or(0)
}

fn grid_from_rows(rows: &[Vec<Segment>], bands: &[(f32, f32)]) -> Vec<Vec<Option<String>>> {
    let width = bands.len().max(1);
    rows.iter()
        .map(|segments| {
            let mut cells: Vec<Option<String>> = vec![None; width];
            for segment in segments {
                let index = band_index(bands, segment).min(width - 1);
                cells[index] = match cells[index].take() {
                    Some(existing) => Some(format!("{} {}", existing, segment.text)),
                    None => Some(segment.text.clone()),
                };
            }
            cells
        })
        .collect()
}

fn detect_standard(page: &PageLayout) -> Vec<RawTable> {
    let rows: Vec<Vec<Segment>> = group_into_lines(&page.words).iter().map(split_segments).collect();
    if rows.len() < 2 || !rows.iter().any(|row| row.len() >= 2) {
        return Vec::new();
    }

    let bands = column_bands(&rows);
    vec![RawTable {
        page: page.page_number,
        rows: grid_from_rows(&rows, &bands),
    }]
}

struct RunLine {
    y_center: f32,
    height: f32,
    segments: Vec<Segment>,
}

fn flush_run(run: &mut Vec<RunLine>, tables: &mut Vec<RawTable>, page_number: usize) {
    if run.len() >= 2 {
        let rows: Vec<Vec<Segment>> = run.drain(..).map(|line| line.segments).collect();
        let bands = column_bands(&rows);
        tables.push(RawTable {
            page: page_number,
            rows: grid_from_rows(&rows, &bands),
        });
    } else {
        run.clear();
    }
}

fn detect_stream(page: &PageLayout) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut run: Vec<RunLine> = Vec::new();

    for line in group_into_lines(&page.words) {
        let segments = split_segments(&line);
        let multi_column = segments.len() >= 2;

        let continues_run = multi_column
            && run.last().is_none_or(|prev| {
                prev.y_center - line.y_center <= prev.height.max(line.height) * ROW_GAP_RATIO
            });

        if !continues_run {
            flush_run(&mut run, &mut tables, page.page_number);
        }

        if multi_column {
            run.push(RunLine {
                y_center: line.y_center,
                height: line.height,
                segments,
            });
        }
    }

    flush_run(&mut run, &mut tables, page.page_number);
    tables
}

/// Merge sorted positions closer than the tolerance; returns ascending cluster means.
fn cluster_positions(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.collect();
    sorted.sort_by(f32::total_cmp);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for value in sorted {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|last| value - last <= POSITION_TOLERANCE) => {
                cluster.push(value)
            }
            _ => clusters.push(vec![value]),
        }
    }

    clusters
        .iter()
        .map(|cluster| cluster.iter().sum::<f32>() / cluster.len() as f32)
        .collect()
}

fn rulings_touch(a: &Ruling, b: &Ruling) -> bool {
    a.x0 - POSITION_TOLERANCE <= b.x1
        && b.x0 - POSITION_TOLERANCE <= a.x1
        && a.y0 - POSITION_TOLERANCE <= b.y1
        && b.y0 - POSITION_TOLERANCE <= a.y1
}

/// Group rulings into connected frames (union-find over touching segments).
fn connected_components(rulings: &[Ruling]) -> Vec<Vec<Ruling>> {
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut parent: Vec<usize> = (0..rulings.len()).collect();
    for i in 0..rulings.len() {
        for j in (i + 1)..rulings.len() {
            if rulings_touch(&rulings[i], &rulings[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<Ruling>)> = Vec::new();
    for (i, ruling) in rulings.iter().enumerate() {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(*ruling),
            None => groups.push((root, vec![*ruling])),
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

/// Place words into the cells of a ruled grid. `xs` ascending, `ys` descending (top first).
fn fill_grid(words: &[Word], xs: &[f32], ys: &[f32]) -> Vec<Vec<Option<String>>> {
    let mut ordered: Vec<&Word> = words.iter().collect();
    ordered.sort_by(|a, b| b.y_center().total_cmp(&a.y_center()).then(a.x0.total_cmp(&b.x0)));

    let mut cells: Vec<Vec<Option<String>>> = vec![vec![None; xs.len() - 1]; ys.len() - 1];
    for word in ordered {
        let (cx, cy) = (word.x_center(), word.y_center());
        let Some(col) = xs.windows(2).position(|w| cx >= w[0] && cx < w[1]) else {
            continue;
        };
        let Some(row) = ys.windows(2).position(|w| cy <= w[0] && cy > w[1]) else {
            continue;
        };

        cells[row][col] = match cells[row][col].take() {
            Some(existing) => Some(format!("{} {}", existing, word.text)),
            None => Some(word.text.clone()),
        };
    }

    cells
}

fn detect_lattice(page: &PageLayout) -> Vec<RawTable> {
    let rulings: Vec<Ruling> = page
        .rulings
        .iter()
        .copied()
        .filter(|r| r.is_horizontal() || r.is_vertical())
        .collect();
    if rulings.len() < 4 {
        return Vec::new();
    }

    let mut grids: Vec<(Vec<f32>, Vec<f32>)> = connected_components(&rulings)
        .into_iter()
        .filter_map(|component| {
            let xs = cluster_positions(
                component
                    .iter()
                    .filter(|r| r.is_vertical())
                    .map(|r| (r.x0 + r.x1) / 2.0),
            );
            let mut ys = cluster_positions(
                component
                    .iter()
                    .filter(|r| r.is_horizontal())
                    .map(|r| (r.y0 + r.y1) / 2.0),
            );
            ys.reverse();
            (xs.len() >= 2 && ys.len() >= 2).then_some((xs, ys))
        })
        .collect();

    grids.sort_by(|a, b| b.1[0].total_cmp(&a.1[0]).then(a.0[0].total_cmp(&b.0[0])));

    grids
        .into_iter()
        .map(|(xs, ys)| RawTable {
            page: page.page_number,
            rows: fill_grid(&page.words, &xs, &ys),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 10pt-high word whose vertical centre is `y`.
    fn word(text: &str, x0: f32, y: f32) -> Word {
        let width = 6.0 * text.chars().count() as f32;
        Word::new(text, x0, y - 5.0, x0 + width, y + 5.0)
    }

    /// A prose line with normal word spacing.
    fn prose(text: &str, y: f32) -> Vec<Word> {
        let mut x = 50.0;
        text.split(' ')
            .map(|w| {
                let out = word(w, x, y);
                x = out.x1 + 3.0;
                out
            })
            .collect()
    }

    fn spec_sheet_page() -> PageLayout {
        let mut words = prose("Electrical characteristics of the device", 750.0);
        for (y, cells) in [
            (700.0, ["Param", "Min", "Max"]),
            (685.0, ["VCC", "2.7", "5.5"]),
            (670.0, ["ICC", "1", "12"]),
        ] {
            words.push(word(cells[0], 50.0, y));
            words.push(word(cells[1], 200.0, y));
            words.push(word(cells[2], 350.0, y));
        }
        words.extend(prose("All values measured at room temperature", 600.0));

        PageLayout {
            page_number: 2,
            words,
            rulings: Vec::new(),
        }
    }

    fn ruled_page() -> PageLayout {
        let mut rulings = Vec::new();
        for x in [50.0, 150.0, 250.0] {
            rulings.push(Ruling::new(x, 640.0, x, 700.0));
        }
        for y in [700.0, 670.0, 640.0] {
            rulings.push(Ruling::new(50.0, y, 250.0, y));
        }

        PageLayout {
            page_number: 1,
            words: vec![
                Word::new("Param", 80.0, 680.0, 120.0, 690.0),
                Word::new("Value", 180.0, 680.0, 220.0, 690.0),
                Word::new("VCC", 90.0, 650.0, 110.0, 660.0),
                Word::new("3.3", 190.0, 650.0, 210.0, 660.0),
                Word::new("Footnote", 50.0, 600.0, 100.0, 610.0),
            ],
            rulings,
        }
    }

    fn texts(rows: &[Vec<Option<String>>]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.as_deref().unwrap_or("")).collect())
            .collect()
    }

    #[test]
    fn test_group_into_lines_orders_top_down() {
        let lines = group_into_lines(&spec_sheet_page().words);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1].words[0].text, "Param");
        assert_eq!(lines[3].words.len(), 3);
    }

    #[test]
    fn test_split_segments_keeps_prose_together() {
        let lines = group_into_lines(&prose("Electrical characteristics of the device", 750.0));
        let segments = split_segments(&lines[0]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Electrical characteristics of the device");
    }

    #[test]
    fn test_stream_detects_aligned_run() {
        let tables = DetectionMode::Stream.detect(&spec_sheet_page());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 2);
        assert_eq!(
            texts(&tables[0].rows),
            vec![vec!["Param", "Min", "Max"], vec!["VCC", "2.7", "5.5"], vec!["ICC", "1", "12"]]
        );
    }

    #[test]
    fn test_stream_splits_runs_on_large_vertical_gap() {
        let mut page = spec_sheet_page();
        for (y, cells) in [(300.0, ["Pin", "Name"]), (285.0, ["1", "GND"])] {
            page.words.push(word(cells[0], 50.0, y));
            page.words.push(word(cells[1], 200.0, y));
        }
        let tables = DetectionMode::Stream.detect(&page);
        assert_eq!(tables.len(), 2);
        assert_eq!(texts(&tables[1].rows), vec![vec!["Pin", "Name"], vec!["1", "GND"]]);
    }

    #[test]
    fn test_standard_takes_whole_page() {
        let tables = DetectionMode::Standard.detect(&spec_sheet_page());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 5);
        assert_eq!(tables[0].rows[1][0].as_deref(), Some("Param"));
    }

    #[test]
    fn test_standard_ignores_single_column_pages() {
        let page = PageLayout {
            page_number: 1,
            words: [prose("Just a paragraph", 700.0), prose("and another line", 685.0)].concat(),
            ..Default::default()
        };
        assert!(DetectionMode::Standard.detect(&page).is_empty());
    }

    #[test]
    fn test_lattice_fills_ruled_grid() {
        let tables = DetectionMode::Lattice.detect(&ruled_page());
        assert_eq!(tables.len(), 1);
        assert_eq!(texts(&tables[0].rows), vec![vec!["Param", "Value"], vec!["VCC", "3.3"]]);
    }

    #[test]
    fn test_lattice_without_rulings_finds_nothing() {
        assert!(DetectionMode::Lattice.detect(&spec_sheet_page()).is_empty());
    }

    #[test]
    fn test_lattice_separates_disjoint_frames() {
        let mut page = ruled_page();
        for x in [300.0, 400.0] {
            page.rulings.push(Ruling::new(x, 400.0, x, 500.0));
        }
        for y in [500.0, 400.0] {
            page.rulings.push(Ruling::new(300.0, y, 400.0, y));
        }
        page.words.push(Word::new("Second", 330.0, 445.0, 370.0, 455.0));

        let tables = DetectionMode::Lattice.detect(&page);
        assert_eq!(tables.len(), 2);
        assert_eq!(texts(&tables[1].rows), vec![vec!["Second"]]);
    }

    #[test]
    fn test_cluster_positions_merges_nearby() {
        let clusters = cluster_positions([100.0, 50.0, 101.0, 250.0].into_iter());
        assert_eq!(clusters, vec![50.0, 100.5, 250.0]);
    }
}
