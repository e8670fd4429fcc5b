use serde::Serialize;

use crate::format;

/// Rows kept from the start of a long schedule.
pub const HEAD_ROWS: usize = 5;
/// Rows kept from the end of a long schedule.
pub const TAIL_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    Normal,
    /// Totals and the headline answer.
    Strong,
    Positive,
    Negative,
    Muted,
}

/// One `(label, value, emphasis)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub label: String,
    pub value: String,
    pub emphasis: Emphasis,
}

impl LineItem {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::with(label, value, Emphasis::Normal)
    }

    pub fn with(
        label: impl Into<String>,
        value: impl Into<String>,
        emphasis: Emphasis,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            emphasis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Warning,
}

/// Recommendation or warning shown under the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TableRow {
    Cells(Vec<String>),
    /// Stands in for `hidden` rows left out of the middle of the table.
    Elided { hidden: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Builds a table over every row of `source`.
    pub fn full<T>(
        title: impl Into<String>,
        columns: &[&str],
        source: &[T],
        cells: impl Fn(&T) -> Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: source.iter().map(|r| TableRow::Cells(cells(r))).collect(),
        }
    }

    /// Builds a table showing the first [`HEAD_ROWS`] and last
    /// [`TAIL_ROWS`] rows of `source`, with an elision marker between them
    /// when anything was left out.
    pub fn windowed<T>(
        title: impl Into<String>,
        columns: &[&str],
        source: &[T],
        cells: impl Fn(&T) -> Vec<String>,
    ) -> Self {
        let window = window_rows(source, HEAD_ROWS, TAIL_ROWS);
        let mut rows: Vec<TableRow> = window.head.iter().map(|r| TableRow::Cells(cells(r))).collect();
        if window.hidden > 0 {
            rows.push(TableRow::Elided {
                hidden: window.hidden,
            });
        }
        rows.extend(window.tail.iter().map(|r| TableRow::Cells(cells(r))));
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

/// Head and tail slices of a long series.
#[derive(Debug, PartialEq)]
pub struct Window<'a, T> {
    pub head: &'a [T],
    pub hidden: usize,
    pub tail: &'a [T],
}

/// Splits `rows` into its first `head` and last `tail` entries. Series that
/// fit entirely are returned whole in `head`.
pub fn window_rows<T>(
    rows: &[T],
    head: usize,
    tail: usize,
) -> Window<'_, T> {
    if rows.len() <= head + tail {
        return Window {
            head: rows,
            hidden: 0,
            tail: &[],
        };
    }
    Window {
        head: &rows[..head],
        hidden: rows.len() - head - tail,
        tail: &rows[rows.len() - tail..],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    /// Datasets sharing a stack name are drawn stacked.
    pub stack: Option<String>,
}

impl Dataset {
    pub fn new(
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            label: label.into(),
            values,
            stack: None,
        }
    }

    pub fn stacked(
        mut self,
        stack: impl Into<String>,
    ) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Canvas the chart is drawn on. One live chart per canvas.
    pub canvas_id: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSpec {
    pub fn new(
        canvas_id: impl Into<String>,
        kind: ChartKind,
        labels: Vec<String>,
    ) -> Self {
        Self {
            canvas_id: canvas_id.into(),
            kind,
            labels,
            datasets: Vec::new(),
        }
    }

    pub fn dataset(
        mut self,
        dataset: Dataset,
    ) -> Self {
        self.datasets.push(dataset);
        self
    }

    pub fn is_stacked(&self) -> bool {
        self.datasets.iter().any(|d| d.stack.is_some())
    }
}

/// Everything a calculator result panel shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayModel {
    pub headlines: Vec<LineItem>,
    pub breakdown: Vec<LineItem>,
    pub tables: Vec<Table>,
    pub charts: Vec<ChartSpec>,
    pub notes: Vec<Note>,
}

impl DisplayModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headline(
        mut self,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headlines.push(LineItem::with(label, value, Emphasis::Strong));
        self
    }

    pub fn line(
        mut self,
        label: impl Into<String>,
        value: impl Into<String>,
        emphasis: Emphasis,
    ) -> Self {
        self.breakdown.push(LineItem::with(label, value, emphasis));
        self
    }

    pub fn lines(
        mut self,
        items: impl IntoIterator<Item = LineItem>,
    ) -> Self {
        self.breakdown.extend(items);
        self
    }

    pub fn table(
        mut self,
        table: Table,
    ) -> Self {
        self.tables.push(table);
        self
    }

    pub fn chart(
        mut self,
        chart: ChartSpec,
    ) -> Self {
        self.charts.push(chart);
        self
    }

    pub fn note(
        mut self,
        tone: Tone,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.notes.push(Note { tone, text });
        }
        self
    }
}

/// Per-submission values the shaping step needs besides the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeContext {
    /// ISO 4217 code amounts are rendered in.
    pub currency: String,
}

impl ShapeContext {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Amount with cents.
    pub fn money(
        &self,
        value: f64,
    ) -> String {
        format::currency(value, &self.currency, 2)
    }

    /// Amount rounded to whole units.
    pub fn money0(
        &self,
        value: f64,
    ) -> String {
        format::currency(value, &self.currency, 0)
    }

    /// Optional amount; `None` renders the placeholder.
    pub fn money_opt(
        &self,
        value: Option<f64>,
    ) -> String {
        value
            .map(|v| self.money(v))
            .unwrap_or_else(|| format::PLACEHOLDER.to_string())
    }

    pub fn compact(
        &self,
        value: f64,
    ) -> String {
        format::compact(value, &self.currency)
    }
}

impl Default for ShapeContext {
    fn default() -> Self {
        Self::new("USD")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // =========================================================================
    // windowing tests
    // =========================================================================

    #[test]
    fn short_series_is_not_windowed() {
        let rows: Vec<u32> = (1..=8).collect();
        let window = window_rows(&rows, HEAD_ROWS, TAIL_ROWS);

        assert_eq!(window.head, &rows[..]);
        assert_eq!(window.hidden, 0);
        assert!(window.tail.is_empty());
    }

    #[test]
    fn long_series_keeps_head_and_tail() {
        let rows: Vec<u32> = (1..=30).collect();
        let window = window_rows(&rows, HEAD_ROWS, TAIL_ROWS);

        assert_eq!(window.head, &[1, 2, 3, 4, 5]);
        assert_eq!(window.hidden, 22);
        assert_eq!(window.tail, &[28, 29, 30]);
    }

    #[test]
    fn windowed_table_inserts_elision_marker() {
        let rows: Vec<u32> = (1..=10).collect();
        let table = Table::windowed("Years", &["Year"], &rows, |y| vec![y.to_string()]);

        assert_eq!(table.rows.len(), HEAD_ROWS + 1 + TAIL_ROWS);
        assert_eq!(table.rows[5], TableRow::Elided { hidden: 2 });
        assert_eq!(table.rows[6], TableRow::Cells(vec!["8".to_string()]));
    }

    #[test]
    fn full_table_keeps_every_row() {
        let rows: Vec<u32> = (1..=10).collect();
        let table = Table::full("Years", &["Year"], &rows, |y| vec![y.to_string()]);

        assert_eq!(table.rows.len(), 10);
    }

    // =========================================================================
    // builder tests
    // =========================================================================

    #[test]
    fn blank_notes_are_dropped() {
        let model = DisplayModel::new()
            .note(Tone::Warning, "")
            .note(Tone::Info, "Keep going");

        assert_eq!(
            model.notes,
            vec![Note {
                tone: Tone::Info,
                text: "Keep going".to_string()
            }]
        );
    }

    #[test]
    fn headlines_are_strong() {
        let model = DisplayModel::new().headline("Monthly payment", "$1,935.83");

        assert_eq!(model.headlines[0].emphasis, Emphasis::Strong);
    }

    #[test]
    fn chart_with_stack_group_is_stacked() {
        let chart = ChartSpec::new("chart", ChartKind::Bar, vec!["1".to_string()])
            .dataset(Dataset::new("Principal", vec![1.0]).stacked("paid"))
            .dataset(Dataset::new("Interest", vec![2.0]).stacked("paid"));

        assert!(chart.is_stacked());
    }

    #[test]
    fn context_money_uses_session_currency() {
        let ctx = ShapeContext::new("GBP");

        assert_eq!(ctx.money(1234.5), "£1,234.50");
        assert_eq!(ctx.money0(1234.5), "£1,235");
        assert_eq!(ctx.money_opt(None), "—");
    }
}
