//! The streaming line protocol.
//!
//! An intermediate record is one line, `key\tvalue`. The key ends at the first
//! tab; everything after it (tabs included) is the value.

use crate::{KeyValue, RecordError};
use std::io::{self, Write};

/// Separator between key and value.
pub const SEPARATOR: char = '\t';

/// Decodes one protocol line.
///
/// Surrounding whitespace (including the line terminator) is stripped first.
/// Blank lines come back as [`RecordError::Ignored`].
pub fn parse_line(line: &str) -> Result<KeyValue, RecordError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(RecordError::Ignored);
    }
    let (key, value) = line
        .split_once(SEPARATOR)
        .ok_or(RecordError::MissingSeparator)?;
    Ok(KeyValue::new(key.to_owned(), value.to_owned()))
}

/// Writes `kv` as one protocol line.
pub fn write_pair<W: Write + ?Sized>(out: &mut W, kv: &KeyValue) -> io::Result<()> {
    out.write_all(&kv.key)?;
    out.write_all(b"\t")?;
    out.write_all(&kv.value)?;
    out.write_all(b"\n")
}

/// Renders a float the way Python's `repr` does, so output matches jobs
/// written against the same protocol: `58.0`, `0.5`, `1e-05`, `1.5e+16`,
/// `inf`, `nan`.
///
/// Both switch to exponent notation below `1e-4` and from `1e16` on; only the
/// exponent is spelled differently.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_owned();
    }
    let repr = format!("{v:?}");
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// Parses a non-negative integer field, ignoring surrounding whitespace.
pub fn parse_index(field: &str) -> Result<u64, RecordError> {
    let field = field.trim();
    field
        .parse()
        .map_err(|_| RecordError::Integer(field.to_owned()))
}

/// Parses a signed integer field, ignoring surrounding whitespace.
pub fn parse_count(field: &str) -> Result<i64, RecordError> {
    let field = field.trim();
    field
        .parse()
        .map_err(|_| RecordError::Integer(field.to_owned()))
}

/// Parses a floating point field, ignoring surrounding whitespace.
pub fn parse_number(field: &str) -> Result<f64, RecordError> {
    let field = field.trim();
    field
        .parse()
        .map_err(|_| RecordError::Number(field.to_owned()))
}
