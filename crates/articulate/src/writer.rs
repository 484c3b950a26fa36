//! Delimited output for the final triple set.

use crate::types::EquivalencyTriple;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Fixed header row.
pub const HEADER: [&str; 3] = ["b_course", "cc_name", "cc_course"];

/// Field separator.
pub const DELIMITER: char = ',';

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one delimited row, quoting fields that need it.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S], sep: char) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{sep}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

/// Header plus one row per triple, in the order given.
pub fn write_dataset<W: Write>(mut w: W, triples: &[EquivalencyTriple]) -> io::Result<()> {
    write_row(&mut w, &HEADER, DELIMITER)?;
    for t in triples {
        write_row(
            &mut w,
            &[&t.receiving_course, &t.sending_institution, &t.sending_course],
            DELIMITER,
        )?;
    }
    w.flush()
}

/// Write the dataset to `path`, creating missing parent directories.
pub fn write_dataset_file(path: &Path, triples: &[EquivalencyTriple]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let out = BufWriter::new(File::create(path)?);
    write_dataset(out, triples)
}
