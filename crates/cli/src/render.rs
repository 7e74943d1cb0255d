use rankwatch_core::chart::{Dataset, DateAxis, RenderSink, StatsView, StrokeStyle, SummaryStats};
use rankwatch_core::dashboard::StatsDisplay;
use rankwatch_core::source::FetchError;
use std::io::Write;

const GAP: &str = "·";

// "━━ #RRGGBB " ahead of every label.
const ROW_PREFIX_WIDTH: usize = 11;

/// Plain-text rendering of a chart: one row per dataset, one column per axis date.
pub fn render_text(axis: &DateAxis, datasets: &[Dataset]) -> String {
    if datasets.is_empty() {
        return "(no ranking data for this selection)\n".to_string();
    }

    let label_width = datasets
        .iter()
        .map(|d| d.label.chars().count())
        .max()
        .unwrap_or(0);

    let columns: Vec<String> = axis.iter().map(|d| d.format("%m-%d").to_string()).collect();
    let width = columns.iter().map(|c| c.len()).max().unwrap_or(0).max(3);

    let mut out = String::new();
    out.push_str(&" ".repeat(ROW_PREFIX_WIDTH + label_width));
    for c in &columns {
        out.push_str(&format!(" {c:>width$}"));
    }
    out.push('\n');

    for ds in datasets {
        let stroke = match ds.stroke_style {
            StrokeStyle::Solid => "━━",
            StrokeStyle::Dashed => "┅┅",
        };
        let pad = label_width - ds.label.chars().count();
        out.push_str(&format!("{stroke} {} {}{}", ds.color, ds.label, " ".repeat(pad)));
        for p in &ds.points {
            let cell = p.rank().map_or_else(|| GAP.to_string(), |r| r.to_string());
            out.push_str(&format!(" {cell:>width$}"));
        }
        out.push('\n');
    }
    out
}

/// Writes each chart to the terminal. A frame stays on screen once printed, so releasing an
/// instance only ends its bookkeeping.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFrame {
    pub lines: usize,
}

impl<W: Write> RenderSink for TerminalSink<W> {
    type Instance = TextFrame;

    fn create(&mut self, axis: &DateAxis, datasets: &[Dataset]) -> TextFrame {
        let text = render_text(axis, datasets);
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, "failed to write chart");
        }
        TextFrame {
            lines: text.lines().count(),
        }
    }

    fn destroy(&mut self, frame: TextFrame) {
        tracing::trace!(lines = frame.lines, "chart frame released");
    }
}

/// Prints the stats cards as one line; failures go to stderr.
#[derive(Debug, Default)]
pub struct TerminalStats {
    pub last: Option<StatsView>,
}

impl StatsDisplay for TerminalStats {
    fn display_stats(&mut self, stats: &SummaryStats) {
        let view = stats.view();
        println!(
            "Amazon最高順位: {}   楽天最高順位: {}   最終更新: {}",
            view.amazon_best, view.rakuten_best, view.last_update
        );
        self.last = Some(view);
    }

    fn display_error(&mut self, error: &FetchError) {
        eprintln!("エラー: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rankwatch_core::chart::{ChartData, ChartLifecycleManager, Palette};
    use rankwatch_core::domain::ranking::{Rank, RankingRecord};

    fn data() -> ChartData {
        let records = vec![
            RankingRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                product_name: "P1".to_string(),
                keyword: "K1".to_string(),
                amazon_rank: Rank::new(5),
                rakuten_rank: None,
            },
            RankingRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                product_name: "P1".to_string(),
                keyword: "K1".to_string(),
                amazon_rank: None,
                rakuten_rank: Rank::new(12),
            },
        ];
        ChartData::from_records(&records, &Palette::default())
    }

    #[test]
    fn text_chart_marks_gaps_and_strokes() {
        let data = data();
        let text = render_text(&data.axis, &data.datasets);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("01-01"));
        assert!(lines[1].starts_with("━━ #FF6384 P1 - K1 (Amazon)"));
        assert!(lines[1].trim_end().ends_with("5     ·"));
        assert!(lines[2].starts_with("┅┅ #FF6384 P1 - K1 (楽天)"));
        assert!(lines[2].trim_end().ends_with("·    12"));
    }

    #[test]
    fn empty_selection_prints_placeholder() {
        let text = render_text(&DateAxis::default(), &[]);
        assert_eq!(text, "(no ranking data for this selection)\n");
    }

    #[test]
    fn sink_writes_each_frame() {
        let data = data();
        let mut manager = ChartLifecycleManager::new(TerminalSink::new(Vec::new()));
        manager.replace(&data.axis, &data.datasets);
        manager.replace(&data.axis, &data.datasets);

        assert_eq!(manager.instance(), Some(&TextFrame { lines: 3 }));
        let written = String::from_utf8(manager.sink().out.clone()).unwrap();
        assert_eq!(written.matches("P1 - K1 (Amazon)").count(), 2);
    }
}
