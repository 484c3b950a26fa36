//! Batch-fatal errors and their process exit codes.

use std::path::PathBuf;

/// Process exit codes.
pub mod exit_codes {
    pub const LINKS_FILE: u8 = 1;
    pub const NO_URLS: u8 = 2;
    pub const BROWSER: u8 = 3;
    pub const OUTPUT: u8 = 4;
    pub const DATASET: u8 = 5;
}

/// Errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("failed to read links file {}: {source}", path.display())]
    LinksFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no URLs provided; use --links <file> or --url <agreement>")]
    NoUrls,

    #[error("could not start browser: {0}")]
    Browser(#[from] articulate::PageError),

    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read dataset {}: {source}", path.display())]
    Dataset {
        path: PathBuf,
        source: articulate::ArticulateError,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        use exit_codes::*;
        match self {
            CliError::LinksFile { .. } => LINKS_FILE,
            CliError::NoUrls => NO_URLS,
            CliError::Browser(_) => BROWSER,
            CliError::Output { .. } => OUTPUT,
            CliError::Dataset { .. } => DATASET,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
