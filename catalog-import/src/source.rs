//! Delimited source reading
//!
//! Sources are `;`-separated with quoted fields and a header row. Bytes are
//! decoded per [`SourceEncoding`]; ISO-8859-1 never fails. Rows that the CSV
//! reader rejects, or that have more fields than the header, are skipped and
//! counted. Rows with fewer fields are kept with the missing cells absent.

use crate::{ImportError, Result};
use catalog_common::config::SourceEncoding;
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Field separator of the source files
pub const DELIMITER: u8 = b';';

/// Cell values read as absent
pub const NULL_VALUES: &[&str] = &[
    "", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "#N/A", "#N/A N/A", "#NA", "<NA>",
    "NULL", "null", "None", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

/// A parsed delimited file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows dropped as unparseable
    pub skipped: usize,
}

impl Table {
    /// Index of the first column with this exact name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value, `None` when absent
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|v| v.as_deref())
    }
}

/// Read a delimited file from disk
pub fn read_table(path: &Path, encoding: SourceEncoding) -> Result<Table> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ImportError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ImportError::Read {
                path: path.to_path_buf(),
                source: e.into(),
            });
        }
    };

    parse_table(BufReader::with_capacity(1 << 20, file), encoding).map_err(|source| {
        ImportError::Read {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Parse delimited text from any reader
pub fn parse_table<R: Read>(reader: R, encoding: SourceEncoding) -> csv::Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .double_quote(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let name = decode(h, encoding);
            if i == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name
            }
        })
        .collect();

    let mut table = Table {
        columns,
        ..Default::default()
    };

    let mut rec = ByteRecord::new();
    loop {
        match rdr.read_byte_record(&mut rec) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                debug!("Skipping unparseable row: {}", e);
                table.skipped += 1;
                continue;
            }
        }

        if rec.len() > table.columns.len() {
            debug!(
                "Skipping row at line {:?}: expected {} fields, found {}",
                rec.position().map(|p| p.line()),
                table.columns.len(),
                rec.len()
            );
            table.skipped += 1;
            continue;
        }

        // Short rows are padded with absent cells
        let mut row: Vec<Option<String>> =
            rec.iter().map(|field| cell_value(decode(field, encoding))).collect();
        row.resize(table.columns.len(), None);
        table.rows.push(row);
    }

    Ok(table)
}

/// Decode raw field bytes
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> String {
    match encoding {
        // ISO-8859-1 maps every byte to the code point of the same value
        SourceEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        SourceEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Map null-equivalent cell text to `None`
pub fn cell_value(text: String) -> Option<String> {
    if NULL_VALUES.contains(&text.as_str()) {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &[u8]) -> Table {
        parse_table(text, SourceEncoding::Latin1).unwrap()
    }

    #[test]
    fn test_semicolon_quoted_fields() {
        let table = parse(b"\"ISBN\";\"Book-Title\"\n\"0195153448\";\"Classical; Mythology\"\n");
        assert_eq!(table.columns, vec!["ISBN", "Book-Title"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1), Some("Classical; Mythology"));
    }

    #[test]
    fn test_latin1_decoding() {
        let table = parse(b"Book-Title\n\"Caf\xe9 Society\"\n");
        assert_eq!(table.cell(0, 0), Some("Café Society"));
    }

    #[test]
    fn test_utf8_decoding() {
        let table = parse_table(
            "Book-Title\n\"Café Society\"\n".as_bytes(),
            SourceEncoding::Utf8,
        )
        .unwrap();
        assert_eq!(table.cell(0, 0), Some("Café Society"));
    }

    #[test]
    fn test_long_rows_are_skipped() {
        let table = parse(b"a;b\n1;2\n1;2;3\n4;5\n");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.skipped, 1);
        assert_eq!(table.cell(1, 0), Some("4"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = parse(b"ISBN;Book-Title;Book-Author\n1;Dune\n6\n");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.skipped, 0);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.cell(0, 1), Some("Dune"));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 0), Some("6"));
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn test_null_equivalents() {
        let table = parse(b"a;b;c;d\n;NaN;N/A;0\n");
        assert_eq!(table.cell(0, 0), None);
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(0, 3), Some("0"));
    }

    #[test]
    fn test_header_only() {
        let table = parse(b"ISBN;Book-Title\n");
        assert_eq!(table.columns.len(), 2);
        assert!(table.rows.is_empty());
        assert_eq!(table.skipped, 0);
    }

    #[test]
    fn test_utf8_bom_stripped_from_header() {
        let table = parse_table("\u{feff}ISBN;Book-Title\n".as_bytes(), SourceEncoding::Utf8).unwrap();
        assert_eq!(table.columns[0], "ISBN");
    }
}
