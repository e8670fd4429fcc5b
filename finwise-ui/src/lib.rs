pub mod app;
pub mod charts;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod render;
pub mod session;
pub mod utils;

pub use app::{App, AppError, bootstrap, run_interactive};
pub use config::UiConfig;
pub use session::{FormSession, SubmitOutcome};
