pub mod client;
pub mod envelope;

pub use client::{CalculationApi, calculate};
pub use envelope::{CalculationError, Envelope, GENERIC_FALLBACK};
