//! Terminal rendering of calculator results and the per-form results panel.

use std::fmt::Write;

use finwise_core::api::CalculationError;
use finwise_core::models::{DisplayModel, Emphasis, LineItem, Table, TableRow, Tone};
use tracing::debug;

use crate::charts::{ChartRegistry, TextChart};

fn marker(emphasis: Emphasis) -> &'static str {
    match emphasis {
        Emphasis::Normal => " ",
        Emphasis::Strong => "*",
        Emphasis::Positive => "+",
        Emphasis::Negative => "-",
        Emphasis::Muted => "·",
    }
}

fn tone_tag(tone: Tone) -> &'static str {
    match tone {
        Tone::Info => "[info]",
        Tone::Success => "[ok]",
        Tone::Warning => "[warning]",
    }
}

fn width_of(text: &str) -> usize {
    text.chars().count()
}

fn render_lines(
    out: &mut String,
    items: &[LineItem],
) {
    let width = items.iter().map(|i| width_of(&i.label)).max().unwrap_or(0);
    for item in items {
        let _ = writeln!(
            out,
            "{} {:<width$}  {}",
            marker(item.emphasis),
            item.label,
            item.value
        );
    }
}

/// Renders `table` with left-aligned first column and right-aligned numbers.
pub fn render_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| width_of(c)).collect();
    for row in &table.rows {
        if let TableRow::Cells(cells) = row {
            for (i, cell) in cells.iter().enumerate() {
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width_of(cell)),
                    None => widths.push(width_of(cell)),
                }
            }
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", table.title);
    let _ = writeln!(out, "  {}", format_row(table.columns.as_slice()));
    for row in &table.rows {
        match row {
            TableRow::Cells(cells) => {
                let _ = writeln!(out, "  {}", format_row(cells.as_slice()));
            }
            TableRow::Elided { hidden } => {
                let noun = if *hidden == 1 { "row" } else { "rows" };
                let _ = writeln!(out, "  … {hidden} more {noun} …");
            }
        }
    }
    out
}

/// Renders a full result: headlines, breakdown, tables, charts and notes.
pub fn render_model(
    model: &DisplayModel,
    charts: &ChartRegistry<TextChart>,
) -> String {
    let mut out = String::new();
    for headline in &model.headlines {
        let _ = writeln!(out, "{}: {}", headline.label, headline.value);
    }
    if !model.breakdown.is_empty() {
        out.push('\n');
        render_lines(&mut out, &model.breakdown);
    }
    for table in &model.tables {
        out.push('\n');
        out.push_str(&render_table(table));
    }
    for spec in &model.charts {
        let Some(chart) = charts.get(&spec.canvas_id) else {
            continue;
        };
        let _ = writeln!(out, "\n[{}]", spec.canvas_id);
        for line in chart.lines() {
            let _ = writeln!(out, "{line}");
        }
    }
    if !model.notes.is_empty() {
        out.push('\n');
        for note in &model.notes {
            let _ = writeln!(out, "{} {}", tone_tag(note.tone), note.text);
        }
    }
    out
}

/// The results area of one calculator form.
///
/// Shows either the latest result or a dismissible warning. A failed
/// submission replaces the previous result, since it no longer matches the
/// inputs on screen.
#[derive(Default)]
pub struct ResultsPanel {
    result: Option<DisplayModel>,
    warning: Option<String>,
    charts: ChartRegistry<TextChart>,
}

impl ResultsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displays `model`, drawing its charts in `currency`.
    pub fn show_result(
        &mut self,
        model: DisplayModel,
        currency: &str,
    ) {
        for spec in &model.charts {
            self.charts.replace(TextChart::render(spec, currency));
        }
        let ids: Vec<&str> = model.charts.iter().map(|c| c.canvas_id.as_str()).collect();
        self.charts.retain_only(&ids);
        debug!(charts = self.charts.len(), "result displayed");

        self.result = Some(model);
        self.warning = None;
    }

    /// Displays the user-facing message for `error`.
    pub fn show_error(
        &mut self,
        error: &CalculationError,
    ) {
        self.result = None;
        self.charts.retain_only(&[]);
        self.warning = Some(error.user_message().to_string());
    }

    /// Clears the warning. Returns whether one was showing.
    pub fn dismiss_warning(&mut self) -> bool {
        self.warning.take().is_some()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn result(&self) -> Option<&DisplayModel> {
        self.result.as_ref()
    }

    pub fn charts(&self) -> &ChartRegistry<TextChart> {
        &self.charts
    }

    pub fn render(&self) -> String {
        match (&self.warning, &self.result) {
            (Some(warning), _) => format!("⚠ {warning}  (dismiss to clear)\n"),
            (None, Some(model)) => render_model(model, &self.charts),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use finwise_core::api::GENERIC_FALLBACK;
    use finwise_core::models::{ChartKind, ChartSpec, Dataset};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_model(chart_id: &str) -> DisplayModel {
        DisplayModel::new()
            .headline("Monthly payment", "$1,935.83")
            .line("Total interest", "$396,896.80", Emphasis::Negative)
            .line("Total paid", "$696,896.80", Emphasis::Strong)
            .chart(
                ChartSpec::new(chart_id, ChartKind::Bar, vec!["Year 1".to_string()])
                    .dataset(Dataset::new("Interest", vec![100.0])),
            )
            .note(Tone::Info, "Rates are illustrative")
    }

    // =========================================================================
    // render_table
    // =========================================================================

    #[test]
    fn table_aligns_columns_and_marks_elision() {
        let table = Table {
            title: "Schedule".to_string(),
            columns: vec!["Year".to_string(), "Balance".to_string()],
            rows: vec![
                TableRow::Cells(vec!["1".to_string(), "$100.00".to_string()]),
                TableRow::Elided { hidden: 1 },
                TableRow::Cells(vec!["30".to_string(), "$0.00".to_string()]),
            ],
        };

        assert_eq!(
            render_table(&table),
            "Schedule\n  Year  Balance\n  1     $100.00\n  … 1 more row …\n  30      $0.00\n"
        );
    }

    // =========================================================================
    // render_model
    // =========================================================================

    #[test]
    fn model_renders_sections_in_order() {
        let mut panel = ResultsPanel::new();
        panel.show_result(sample_model("repayment-yearly"), "USD");

        let text = panel.render();

        let headline = text.find("Monthly payment: $1,935.83").unwrap();
        let breakdown = text.find("- Total interest  $396,896.80").unwrap();
        let chart = text.find("[repayment-yearly]").unwrap();
        let note = text.find("[info] Rates are illustrative").unwrap();
        assert!(headline < breakdown && breakdown < chart && chart < note);
        assert!(text.contains("* Total paid      $696,896.80"));
    }

    // =========================================================================
    // ResultsPanel
    // =========================================================================

    #[test]
    fn error_replaces_result_and_can_be_dismissed() {
        let mut panel = ResultsPanel::new();
        panel.show_result(sample_model("a"), "USD");

        panel.show_error(&CalculationError::Rejected("Home price must be positive".to_string()));

        assert_eq!(panel.warning(), Some("Home price must be positive"));
        assert!(panel.result().is_none());
        assert!(panel.charts().is_empty());
        assert!(panel.render().contains("Home price must be positive"));

        assert!(panel.dismiss_warning());
        assert!(!panel.dismiss_warning());
        assert_eq!(panel.render(), "");
    }

    #[test]
    fn transport_errors_show_generic_message() {
        let mut panel = ResultsPanel::new();

        panel.show_error(&CalculationError::Transport {
            status: Some(503),
            message: "upstream down".to_string(),
        });

        assert_eq!(panel.warning(), Some(GENERIC_FALLBACK));
    }

    #[test]
    fn new_result_clears_warning_and_swaps_charts() {
        let mut panel = ResultsPanel::new();
        panel.show_result(sample_model("first"), "USD");
        panel.show_error(&CalculationError::Validation("x".to_string()));

        panel.show_result(sample_model("second"), "USD");

        assert_eq!(panel.warning(), None);
        assert_eq!(panel.charts().len(), 1);
        assert!(panel.charts().get("second").is_some());
    }

    #[test]
    fn resubmitting_keeps_one_chart_per_canvas() {
        let mut panel = ResultsPanel::new();

        for _ in 0..3 {
            panel.show_result(sample_model("repayment-yearly"), "USD");
        }

        assert_eq!(panel.charts().len(), 1);
    }
}
