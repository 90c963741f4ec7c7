//! CSV line source and field extraction.
//!
//! Records are read lazily with the `csv` crate, configured to split on
//! commas only: no quoting, no header row, and rows of any width. Fields are
//! read as raw bytes and decoded lossily, so undecodable bytes never stop a
//! run. Only columns 0 (year), 1 (category key) and 3 (count) are consumed.

use crate::models::Count;
use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Field delimiter of the input format.
pub const DELIMITER: u8 = b',';

const YEAR_COLUMN: usize = 0;
const KEY_COLUMN: usize = 1;
const COUNT_COLUMN: usize = 3;

/// Minimum number of fields a line needs for every consumed column to exist.
pub const MIN_FIELDS: usize = COUNT_COLUMN + 1;

/// Fatal input problems. Non-numeric fields are not errors.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("cannot open input {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading input")]
    Read(#[from] csv::Error),

    #[error("line {line_number}: expected at least 4 fields, found {found}")]
    MalformedLine { line_number: usize, found: usize },
}

/// One physical input line, already split into raw fields.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 1-indexed line number in the source.
    pub line_number: usize,
    pub record: ByteRecord,
}

/// A single input opened for one sequential pass.
pub struct LineSource<R> {
    reader: csv::Reader<R>,
}

impl LineSource<File> {
    /// Open the input file.
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let file = File::open(path).map_err(|source| InputError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened input {}", path.display());

        Ok(Self::from_reader(file))
    }
}

impl<R: Read> LineSource<R> {
    /// Wrap any byte stream in the comma-only reader configuration.
    pub fn from_reader(rdr: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .delimiter(DELIMITER)
            .from_reader(rdr);

        Self { reader }
    }

    /// Lazily yield every non-empty line until end of input.
    ///
    /// `\n` and `\r\n` terminators are both accepted. Blank lines carry no
    /// record and are passed over without being yielded.
    pub fn lines(self) -> impl Iterator<Item = Result<RawLine, InputError>> {
        self.reader
            .into_byte_records()
            .map(|result| -> Result<RawLine, InputError> {
                let record = result?;
                let line_number = record.position().map_or(0, |p| p.line() as usize);
                Ok(RawLine {
                    line_number,
                    record,
                })
            })
    }
}

/// Decode the fields of one line as text.
///
/// Never fails: invalid UTF-8 is replaced with U+FFFD, and a line without
/// delimiters yields a single field.
pub fn parse_line(record: &ByteRecord) -> Vec<Cow<'_, str>> {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Typed values extracted from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// `None` when the year column is not a number.
    pub year: Option<i64>,
    /// Category key, verbatim.
    pub key: String,
    pub count: Count,
}

impl Record {
    /// Pull the consumed columns out of a parsed line.
    pub fn extract<S: AsRef<str>>(fields: &[S], line_number: usize) -> Result<Self, InputError> {
        if fields.len() < MIN_FIELDS {
            return Err(InputError::MalformedLine {
                line_number,
                found: fields.len(),
            });
        }

        Ok(Self {
            year: parse_int(fields[YEAR_COLUMN].as_ref()),
            key: fields[KEY_COLUMN].as_ref().to_string(),
            count: Count(parse_int(fields[COUNT_COLUMN].as_ref())),
        })
    }
}

/// Parse the leading integer of a field.
///
/// Leading whitespace and a single sign are accepted, parsing stops at the
/// first non-digit, and anything after it is ignored (`"12abc"` is 12).
/// Returns `None` when no digit is found or the value does not fit in `i64`.
pub fn parse_int(field: &str) -> Option<i64> {
    let trimmed = field.trim_start();
    let sign_len = match trimmed.as_bytes().first() {
        Some(b'-') | Some(b'+') => 1,
        _ => 0,
    };

    let digits_len = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }

    trimmed[..sign_len + digits_len].parse().ok()
}
