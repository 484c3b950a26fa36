//! Articulate CLI: scrape articulation agreements into a deduplicated CSV.

pub mod config;
pub mod error;
pub mod lookup;
pub mod run;

pub use config::{resolve_urls, RunOptions, DEFAULT_OUTPUT_PATH};
pub use error::{CliError, CliResult};
pub use lookup::lookup;
pub use run::{run, run_with_page, RunSummary};
