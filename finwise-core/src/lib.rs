pub mod api;
pub mod calculations;
pub mod calculators;
pub mod format;
pub mod models;

pub use api::{CalculationApi, CalculationError, Envelope, calculate};
pub use calculators::{Calculator, CalculatorRegistry, DynCalculator, default_registry, shape_context};
pub use models::*;
