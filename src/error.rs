//! Per-record errors.
//!
//! None of these are fatal: the stream drivers log them and drop the line.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("line has no tab separator")]
    MissingSeparator,

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid integer `{0}`")]
    Integer(String),

    #[error("invalid number `{0}`")]
    Number(String),

    #[error("unknown matrix tag `{0}`")]
    Tag(String),

    #[error("running total overflows")]
    Overflow,

    #[error("record is not valid UTF-8")]
    Utf8,

    #[error("blank or comment line")]
    Ignored,
}
