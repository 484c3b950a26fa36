//! Reading a written dataset back into triples.

use crate::types::{ArticulateError, ArticulateResult, EquivalencyTriple};
use crate::writer::{DELIMITER, HEADER};
use std::mem::take;
use std::path::Path;

/// Minimal delimited-text parser. Handles quoted fields, doubled quotes and CRLF.
///
/// Blank lines are skipped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline, even if quotes were unterminated.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Parse a dataset with the fixed header, keeping row order.
pub fn read_dataset(text: &str) -> ArticulateResult<Vec<EquivalencyTriple>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = parse_rows(text, DELIMITER).into_iter();

    let header = rows
        .next()
        .ok_or_else(|| ArticulateError::InvalidInput("missing header row".to_string()))?;
    if header.iter().map(|h| h.trim()).ne(HEADER.iter().copied()) {
        return Err(ArticulateError::InvalidInput(format!(
            "expected header {}, found {}",
            HEADER.join(","),
            header.join(",")
        )));
    }

    rows.enumerate()
        .map(|(i, row)| match <[String; 3]>::try_from(row) {
            Ok([receiving, institution, sending]) => {
                Ok(EquivalencyTriple::new(receiving, institution, sending))
            }
            Err(row) => Err(ArticulateError::InvalidInput(format!(
                "row {} has {} fields, expected {}",
                i + 2,
                row.len(),
                HEADER.len()
            ))),
        })
        .collect()
}

/// Read and parse the dataset at `path`.
pub fn read_dataset_file(path: &Path) -> ArticulateResult<Vec<EquivalencyTriple>> {
    let text = std::fs::read_to_string(path)?;
    read_dataset(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_dataset_file;

    #[test]
    fn test_parse_rows_quotes_and_crlf() {
        let rows = parse_rows("a,\"b, c\"\r\n\r\n\"say \"\"hi\"\"\",d\n", ',');
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b, c".to_string()],
                vec!["say \"hi\"".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_without_trailing_newline() {
        assert_eq!(parse_rows("x,y", ','), vec![vec!["x".to_string(), "y".to_string()]]);
        assert!(parse_rows("", ',').is_empty());
        assert!(parse_rows("\n\n", ',').is_empty());
    }

    #[test]
    fn test_read_written_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articulations.csv");
        let triples = vec![
            EquivalencyTriple::new("CS 61A", "College of San Mateo, CA", "CIS 22A"),
            EquivalencyTriple::new("MATH 1A + MATH 1B", "Foothill \"FH\" College", "MATH 1A"),
        ];
        write_dataset_file(&path, &triples).unwrap();
        assert_eq!(read_dataset_file(&path).unwrap(), triples);
    }

    #[test]
    fn test_read_rejects_wrong_header() {
        let err = read_dataset("course,college,other\nA,B,C\n").unwrap_err();
        assert!(matches!(err, ArticulateError::InvalidInput(_)));
        assert!(read_dataset("").is_err());
    }

    #[test]
    fn test_read_reports_short_row() {
        let err = read_dataset("b_course,cc_name,cc_course\nA,B,C\nD,E\n").unwrap_err();
        assert!(err.to_string().contains("row 3 has 2 fields"), "{err}");
    }

    #[test]
    fn test_read_header_only() {
        assert!(read_dataset("b_course,cc_name,cc_course\n").unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ArticulateError::Io(_)));
    }
}
