//! Live chart instances keyed by canvas id.
//!
//! At most one chart is live per canvas. Replacing a chart disposes the old
//! instance before the new one is stored, so a re-submitted form never
//! stacks charts on the same canvas.

use std::collections::BTreeMap;

use finwise_core::format;
use finwise_core::models::{ChartKind, ChartSpec};
use tracing::debug;

/// A rendered chart that owns resources until disposed.
pub trait ChartHandle {
    fn canvas_id(&self) -> &str;

    /// Releases the chart. Called exactly once by [`ChartRegistry`].
    fn dispose(&mut self);
}

pub struct ChartRegistry<H: ChartHandle> {
    live: BTreeMap<String, H>,
}

impl<H: ChartHandle> Default for ChartRegistry<H> {
    fn default() -> Self {
        Self {
            live: BTreeMap::new(),
        }
    }
}

impl<H: ChartHandle> ChartRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `chart` under its canvas id, disposing whatever was there.
    pub fn replace(
        &mut self,
        chart: H,
    ) {
        let id = chart.canvas_id().to_string();
        if let Some(mut previous) = self.live.remove(&id) {
            debug!(canvas = %id, "disposing previous chart");
            previous.dispose();
        }
        self.live.insert(id, chart);
    }

    /// Disposes every chart whose canvas id is not in `keep`.
    pub fn retain_only(
        &mut self,
        keep: &[&str],
    ) {
        let stale: Vec<String> = self
            .live
            .keys()
            .filter(|id| !keep.contains(&id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.dispose(&id);
        }
    }

    /// Disposes the chart on `canvas_id`, if any.
    pub fn dispose(
        &mut self,
        canvas_id: &str,
    ) -> bool {
        match self.live.remove(canvas_id) {
            Some(mut chart) => {
                chart.dispose();
                true
            }
            None => false,
        }
    }

    pub fn get(
        &self,
        canvas_id: &str,
    ) -> Option<&H> {
        self.live.get(canvas_id)
    }

    /// Live charts in canvas id order.
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.live.values()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl<H: ChartHandle> Drop for ChartRegistry<H> {
    fn drop(&mut self) {
        for chart in self.live.values_mut() {
            chart.dispose();
        }
    }
}

// =============================================================================
// Text charts
// =============================================================================

/// Widest bar in a text chart, in cells.
const BAR_WIDTH: usize = 32;

/// A chart drawn as horizontal bars for the terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChart {
    canvas_id: String,
    lines: Vec<String>,
    disposed: bool,
}

impl TextChart {
    pub fn render(
        spec: &ChartSpec,
        currency: &str,
    ) -> Self {
        let lines = match spec.kind {
            ChartKind::Doughnut => doughnut_lines(spec),
            ChartKind::Line | ChartKind::Bar if spec.is_stacked() => stacked_lines(spec, currency),
            ChartKind::Line | ChartKind::Bar => series_lines(spec, currency),
        };
        Self {
            canvas_id: spec.canvas_id.clone(),
            lines,
            disposed: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl ChartHandle for TextChart {
    fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    fn dispose(&mut self) {
        self.lines.clear();
        self.disposed = true;
    }
}

fn bar(
    value: f64,
    max: f64,
) -> String {
    let cells = if max > 0.0 && value.is_finite() && value > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "█".repeat(cells.min(BAR_WIDTH))
}

fn label_width(spec: &ChartSpec) -> usize {
    spec.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

/// One row per point, bars scaled to the dataset's largest value.
fn series_lines(
    spec: &ChartSpec,
    currency: &str,
) -> Vec<String> {
    let width = label_width(spec);
    let mut lines = Vec::new();
    for dataset in &spec.datasets {
        let max = dataset.values.iter().copied().fold(0.0_f64, f64::max);
        lines.push(format!("{}:", dataset.label));
        for (label, value) in spec.labels.iter().zip(&dataset.values) {
            lines.push(format!(
                "  {label:<width$} {} {}",
                bar(*value, max),
                format::compact(*value, currency)
            ));
        }
    }
    lines
}

/// One bar per label, each segment drawn with its own glyph.
fn stacked_lines(
    spec: &ChartSpec,
    currency: &str,
) -> Vec<String> {
    const GLYPHS: [char; 4] = ['█', '▓', '▒', '░'];
    let width = label_width(spec);
    let totals: Vec<f64> = (0..spec.labels.len())
        .map(|i| {
            spec.datasets
                .iter()
                .filter_map(|d| d.values.get(i))
                .filter(|v| v.is_finite() && **v > 0.0)
                .sum()
        })
        .collect();
    let max = totals.iter().copied().fold(0.0_f64, f64::max);

    let legend = spec
        .datasets
        .iter()
        .zip(GLYPHS.iter().cycle())
        .map(|(d, g)| format!("{g} {}", d.label))
        .collect::<Vec<_>>()
        .join("  ");
    let mut lines = vec![legend];
    for (i, label) in spec.labels.iter().enumerate() {
        let mut row = String::new();
        for (dataset, glyph) in spec.datasets.iter().zip(GLYPHS.iter().cycle()) {
            let value = dataset.values.get(i).copied().unwrap_or(0.0);
            let cells = bar(value, max).chars().count();
            row.extend(std::iter::repeat_n(*glyph, cells));
        }
        lines.push(format!(
            "  {label:<width$} {row} {}",
            format::compact(totals[i], currency)
        ));
    }
    lines
}

/// Shares of the first dataset, as percentages.
fn doughnut_lines(spec: &ChartSpec) -> Vec<String> {
    let Some(dataset) = spec.datasets.first() else {
        return Vec::new();
    };
    let total: f64 = dataset
        .values
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .sum();
    let width = label_width(spec);
    spec.labels
        .iter()
        .zip(&dataset.values)
        .map(|(label, value)| {
            let share = if total > 0.0 { value.max(0.0) / total * 100.0 } else { 0.0 };
            format!(
                "  {label:<width$} {} {}",
                bar(share, 100.0),
                format::percent(share, 1)
            )
        })
        .collect()
}
