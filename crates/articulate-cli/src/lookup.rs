//! `lookup` subcommand: query a written dataset.

use std::io::Write;
use std::path::{Path, PathBuf};

use articulate::writer::{write_row, DELIMITER};
use articulate::{read_dataset_file, Lookup};
use tracing::{info, warn};

use crate::error::{CliError, CliResult};

/// Print the rows of the dataset at `path` that match `query`, as CSV.
///
/// Returns the number of matching rows.
pub fn lookup<W: Write>(path: &Path, query: &Lookup, mut out: W) -> CliResult<usize> {
    let triples = read_dataset_file(path).map_err(|source| CliError::Dataset {
        path: path.to_path_buf(),
        source,
    })?;
    let matches = query.run(&triples);

    let print = |out: &mut W| -> std::io::Result<()> {
        write_row(&mut *out, &query.columns(), DELIMITER)?;
        for triple in &matches {
            write_row(&mut *out, &query.project(triple), DELIMITER)?;
        }
        out.flush()
    };
    print(&mut out).map_err(|source| CliError::Output {
        path: PathBuf::from("<stdout>"),
        source,
    })?;

    if matches.is_empty() {
        warn!("no rows match {query:?} in {}", path.display());
    } else {
        info!("{} of {} rows match", matches.len(), triples.len());
    }
    Ok(matches.len())
}
