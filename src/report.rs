//! Presentation model for query results.
//!
//! Builds the result panel text (totals, area, age table) and the age table's
//! drag-selection sum. Rendering is left to the host.

use serde::Serialize;

use crate::model::Selection;
use crate::query::QueryResult;

/// Columns of the age table.
pub const AGE_TABLE_COLUMNS: usize = 3;

/// One age table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeRow {
    pub label: String,
    pub count: u64,
    /// Share of the total, rounded to one decimal
    pub percent: f64,
}

impl AgeRow {
    pub fn count_text(&self) -> String {
        format!("{}명", group_thousands(self.count))
    }

    pub fn percent_text(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

/// Result panel contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    /// Queried region label (region queries only)
    pub region_label: Option<String>,
    pub total_population: u64,
    pub total_households: u64,
    /// Analysed area (drawn shapes only)
    pub area_km2: Option<f64>,
    /// Empty when the total population is zero
    pub age_rows: Vec<AgeRow>,
}

impl AnalysisReport {
    pub fn from_result(result: &QueryResult) -> Self {
        let (title, region_label, area_km2) = match &result.selection {
            Selection::Circle { .. } => (
                "원형 영역 분석 결과",
                None,
                result.analysis_area_sqm.map(|sqm| sqm / 1_000_000.0),
            ),
            Selection::Polygon { .. } => (
                "다각형 영역 분석 결과",
                None,
                result.analysis_area_sqm.map(|sqm| sqm / 1_000_000.0),
            ),
            Selection::Region { path } => ("지역 조회 결과", Some(path.label()), None),
        };

        let total = result.age_distribution.total();
        let age_rows = if total == 0 {
            Vec::new()
        } else {
            result
                .age_distribution
                .iter()
                .map(|entry| AgeRow {
                    label: entry.label.clone(),
                    count: entry.count,
                    percent: (entry.count as f64 / total as f64 * 1000.0).round() / 10.0,
                })
                .collect()
        };

        Self {
            title: title.to_string(),
            region_label,
            total_population: result.total_population,
            total_households: result.total_households,
            area_km2,
            age_rows,
        }
    }

    pub fn population_text(&self) -> String {
        format!("{}명", group_thousands(self.total_population))
    }

    pub fn households_text(&self) -> String {
        format!("{}세대", group_thousands(self.total_households))
    }

    pub fn area_text(&self) -> Option<String> {
        self.area_km2.map(|km2| format!("{:.2}km²", km2))
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if let Some(label) = &self.region_label {
            out.push_str(&format!("조회 지역: {}\n", label));
        }
        out.push_str(&format!("총 인구수: {}\n", self.population_text()));
        out.push_str(&format!("총 가구수: {}\n", self.households_text()));
        if let Some(area) = self.area_text() {
            out.push_str(&format!("분석 면적: {}\n", area));
        }

        if self.age_rows.is_empty() {
            out.push_str("인구 데이터가 없습니다.\n");
            return out;
        }
        out.push_str("\n연령별 인구 분포\n");
        for row in &self.age_rows {
            out.push_str(&format!(
                "{:<10}{:>14}{:>8}\n",
                row.label,
                row.count_text(),
                row.percent_text()
            ));
        }
        out
    }
}

/// Format an integer with comma thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a sum with thousands separators and at most one decimal.
pub fn format_sum(sum: f64) -> String {
    let tenths = (sum.abs() * 10.0).round() as u64;
    let sign = if sum < 0.0 && tenths > 0 { "-" } else { "" };
    match tenths % 10 {
        0 => format!("{}{}", sign, group_thousands(tenths / 10)),
        frac => format!("{}{}.{}", sign, group_thousands(tenths / 10), frac),
    }
}

/// Rectangular drag selection over the age table's cells.
///
/// Cells are indexed row-major over a 3-column grid (label, count, percent).
#[derive(Debug, Clone, Default)]
pub struct AgeTableSelection {
    anchor: Option<usize>,
    cells: Vec<usize>,
    dragging: bool,
}

impl AgeTableSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection at `cell`.
    pub fn press(&mut self, cell: usize) {
        self.anchor = Some(cell);
        self.cells = vec![cell];
        self.dragging = true;
    }

    /// Extend the selection to the rectangle spanned by the anchor and `cell`.
    pub fn hover(&mut self, cell: usize, cell_count: usize) {
        let (true, Some(anchor)) = (self.dragging, self.anchor) else {
            return;
        };
        let (lo, hi) = (anchor.min(cell), anchor.max(cell));
        let (row_a, row_b) = (lo / AGE_TABLE_COLUMNS, hi / AGE_TABLE_COLUMNS);
        let (col_a, col_b) = (lo % AGE_TABLE_COLUMNS, hi % AGE_TABLE_COLUMNS);
        let (min_col, max_col) = (col_a.min(col_b), col_a.max(col_b));

        self.cells = (row_a.min(row_b)..=row_a.max(row_b))
            .flat_map(|row| (min_col..=max_col).map(move |col| row * AGE_TABLE_COLUMNS + col))
            .filter(|&idx| idx < cell_count)
            .collect();
    }

    /// End the drag. The selection stays.
    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Drop the selection (click outside the table).
    pub fn clear(&mut self) {
        self.anchor = None;
        self.cells.clear();
        self.dragging = false;
    }

    pub fn selected(&self) -> &[usize] {
        &self.cells
    }

    /// Sum of the selected numeric cells, shown once at least two are selected.
    pub fn summary(&self, rows: &[AgeRow]) -> Option<f64> {
        if self.cells.len() < 2 {
            return None;
        }
        let values: Vec<f64> = self
            .cells
            .iter()
            .filter_map(|&idx| {
                let row = rows.get(idx / AGE_TABLE_COLUMNS)?;
                match idx % AGE_TABLE_COLUMNS {
                    1 => Some(row.count as f64),
                    2 => Some(row.percent),
                    _ => None,
                }
            })
            .collect();

        (values.len() > 1).then(|| values.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::model::{AgeDistribution, RegionPath};

    fn result(selection: Selection, ages: &[(&str, u64)]) -> QueryResult {
        let age_distribution: AgeDistribution = ages.iter().copied().collect();
        QueryResult {
            selection,
            total_population: age_distribution.total(),
            total_households: 1234,
            age_distribution,
            analysis_area_sqm: Some(3_141_592.65),
            boundary: None,
            boundary_from_cache: false,
        }
    }

    fn circle() -> Selection {
        Selection::Circle {
            center: LatLng::new(37.5, 127.0),
            radius_m: 1000.0,
            segments: 32,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(9_876_543), "9,876,543");
    }

    #[test]
    fn test_format_sum() {
        assert_eq!(format_sum(1234.0), "1,234");
        assert_eq!(format_sum(1234.56), "1,234.6");
        assert_eq!(format_sum(33.3), "33.3");
    }

    #[test]
    fn test_circle_report() {
        let report = AnalysisReport::from_result(&result(
            circle(),
            &[("20대", 300), ("10세 미만", 100), ("10대", 600)],
        ));
        assert_eq!(report.title, "원형 영역 분석 결과");
        assert_eq!(report.population_text(), "1,000명");
        assert_eq!(report.households_text(), "1,234세대");
        assert_eq!(report.area_text().as_deref(), Some("3.14km²"));

        let labels: Vec<&str> = report.age_rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["10세 미만", "10대", "20대"]);
        assert_eq!(report.age_rows[1].percent_text(), "60.0%");
        assert_eq!(report.age_rows[1].count_text(), "600명");
    }

    #[test]
    fn test_region_report_has_label_and_no_area() {
        let report = AnalysisReport::from_result(&result(
            Selection::Region {
                path: RegionPath::sigungu("Seoul", "Gangnam"),
            },
            &[("30대", 10)],
        ));
        assert_eq!(report.title, "지역 조회 결과");
        assert_eq!(report.region_label.as_deref(), Some("Seoul Gangnam"));
        assert_eq!(report.area_text(), None);
        assert!(report.to_text().contains("조회 지역: Seoul Gangnam"));
    }

    #[test]
    fn test_zero_population_has_no_rows() {
        let report = AnalysisReport::from_result(&result(circle(), &[("20대", 0)]));
        assert!(report.age_rows.is_empty());
        assert!(report.to_text().contains("인구 데이터가 없습니다."));
    }

    fn rows() -> Vec<AgeRow> {
        [("10대", 100, 10.0), ("20대", 300, 30.0), ("30대", 600, 60.0)]
            .into_iter()
            .map(|(label, count, percent)| AgeRow {
                label: label.to_string(),
                count,
                percent,
            })
            .collect()
    }

    #[test]
    fn test_drag_selects_rectangle() {
        let mut selection = AgeTableSelection::new();
        selection.press(1);
        selection.hover(8, 9);
        assert_eq!(selection.selected(), &[1, 2, 4, 5, 7, 8]);

        selection.release();
        // Hover after release does not change the selection
        selection.hover(0, 9);
        assert_eq!(selection.selected().len(), 6);
    }

    #[test]
    fn test_summary_needs_two_numeric_cells() {
        let rows = rows();
        let mut selection = AgeTableSelection::new();
        selection.press(1);
        assert_eq!(selection.summary(&rows), None);

        // Count column of all rows
        selection.hover(7, 9);
        assert_eq!(selection.summary(&rows), Some(1000.0));

        // Label plus one count is a single numeric cell
        selection.press(0);
        selection.hover(1, 9);
        assert_eq!(selection.summary(&rows), None);

        selection.clear();
        assert!(selection.selected().is_empty());
    }
}
