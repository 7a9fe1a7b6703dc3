pub mod cli;
pub mod errors;
pub mod loader;
pub mod output_locator;

pub use cli::{BatchOptions, BatchReport, FileOutcome, print_summary, run_batch};
pub use errors::FrontendError;
pub use output_locator::OutputTarget;
