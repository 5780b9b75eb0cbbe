//! Word count.
//!
//! The mapper emits `word\t1` per token; the reducer sums the counts of each
//! run. Counts are summed rather than counted, so the reducer also works as a
//! combiner over its own output.

use crate::codec::parse_count;
use crate::*;
use anyhow::Result;
use bytes::Bytes;
use regex::Regex;

/// Letters, digits and apostrophes, matched after lowercasing.
pub const WORD_PATTERN: &str = r"[A-Za-z0-9']+";

pub struct WordCountMapper {
    word: Regex,
}

impl WordCountMapper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            word: Regex::new(WORD_PATTERN)?,
        })
    }
}

impl Mapper for WordCountMapper {
    fn map(&self, line: &str) -> MapOutput {
        let line = line.trim().to_lowercase();
        let words = self
            .word
            .find_iter(&line)
            .map(|m| m.as_str().to_owned())
            .collect::<Vec<_>>();

        let one = Bytes::from_static(b"1");
        Ok(Box::new(
            words
                .into_iter()
                .map(move |word| KeyValue::new(word, one.clone())),
        ))
    }
}

pub struct WordCountReducer;

impl Reducer for WordCountReducer {
    type Key = Bytes;
    type Value = i64;
    type Acc = i64;

    fn decode(&self, kv: &KeyValue) -> Result<(Bytes, i64), RecordError> {
        Ok((kv.key(), parse_count(kv.value_str()?)?))
    }

    fn fold(&self, acc: &mut i64, count: i64) -> Result<(), RecordError> {
        *acc = acc.checked_add(count).ok_or(RecordError::Overflow)?;
        Ok(())
    }

    fn finish(&self, word: Bytes, total: i64) -> Option<String> {
        Some(format!("{}\t{}", String::from_utf8_lossy(&word), total))
    }
}

pub fn mapper(_aux: &Bytes) -> Result<Box<dyn Mapper>> {
    Ok(Box::new(WordCountMapper::new()?))
}

pub fn reducer(_aux: &Bytes) -> Result<Box<dyn LineReducer>> {
    Ok(Box::new(GroupedReduce::new(WordCountReducer)))
}
