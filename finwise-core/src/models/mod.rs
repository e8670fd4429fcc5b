mod calculator_key;
mod display;
mod form_input;
mod preview;
mod schema;

pub mod presets;

pub use calculator_key::{CalculatorKey, Domain, UnknownCalculator};
pub use display::{
    ChartKind, ChartSpec, Dataset, DisplayModel, Emphasis, HEAD_ROWS, LineItem, Note,
    ShapeContext, TAIL_ROWS, Table, TableRow, Tone, Window, window_rows,
};
pub use form_input::{FieldValue, FormInput, RawForm};
pub use preview::{PreviewEstimate, PreviewUnit, render_preview};
pub use schema::{FieldKind, FieldSpec, Payload, build_payload};
