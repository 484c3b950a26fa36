//! Articulate: extraction core for course-equivalency agreements.
//!
//! Drives a browser page through a render-convergence heuristic, walks the
//! repeating agreement rows into (receiving, institution, sending) triples,
//! and aggregates them across pages into a deduplicated, ordered dataset.

pub mod aggregate;
pub mod converge;
pub mod extract;
pub mod lookup;
pub mod reader;
pub mod renderer;
pub mod session;
pub mod types;
pub mod writer;

pub use aggregate::{aggregate, Aggregator};
pub use converge::{stabilize, ConvergenceConfig, ConvergenceReport};
pub use extract::{Extractor, RowFilter, RowMarkers, Selectors};
pub use lookup::Lookup;
pub use reader::{read_dataset, read_dataset_file};
pub use renderer::{ChromeExecutable, LaunchOptions, PageError, PageHandle, WindowSize};
pub use session::{BatchReport, PageReport, PageStatus, Session, SessionConfig};
pub use types::*;
pub use writer::{write_dataset, write_dataset_file};
