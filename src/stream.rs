//! Stream drivers: run one stage over a line stream.
//!
//! Both drivers are single pass. Lines that fail to decode are logged at debug
//! level and dropped; only I/O errors end a run early.

use crate::codec::{parse_line, write_pair};
use crate::{KeyValue, LineReducer, Mapper, RecordError};
use anyhow::Result;
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// Counters for one stage run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Input lines read.
    pub lines: u64,
    /// Records written.
    pub emitted: u64,
    /// Input lines dropped as malformed.
    pub skipped: u64,
}

impl StreamStats {
    /// Records a rejected line.
    pub fn skip(&mut self, line_no: u64, err: &RecordError) {
        match err {
            // blank and comment lines are not worth counting
            RecordError::Ignored => trace!(line = line_no, "ignoring line"),
            _ => {
                debug!(line = line_no, error = %err, "skipping malformed record");
                self.skipped += 1;
            }
        }
    }
}

/// Runs `mapper` over one raw line, folding failures into `stats`.
///
/// Returns the pairs to emit, or `None` when the line was dropped.
pub fn map_line(
    mapper: &dyn Mapper,
    line: &str,
    stats: &mut StreamStats,
) -> Option<Box<dyn Iterator<Item = KeyValue>>> {
    stats.lines += 1;
    match mapper.map(line) {
        Ok(pairs) => Some(pairs),
        Err(err) => {
            stats.skip(stats.lines, &err);
            None
        }
    }
}

/// Feeds one intermediate pair to `reducer`, folding failures into `stats`.
///
/// Returns the result of a key that just finished, if any.
pub fn reduce_pair(
    reducer: &mut dyn LineReducer,
    kv: &KeyValue,
    stats: &mut StreamStats,
) -> Option<String> {
    stats.lines += 1;
    match reducer.push(kv) {
        Ok(flushed) => flushed,
        Err(err) => {
            stats.skip(stats.lines, &err);
            None
        }
    }
}

/// Splits `input` into lines, handing invalid UTF-8 to `stats` as a skip.
pub fn for_each_line<R: BufRead>(
    input: R,
    stats: &mut StreamStats,
    mut f: impl FnMut(&str, &mut StreamStats) -> Result<()>,
) -> Result<()> {
    for line in input.split(b'\n') {
        let line = line?;
        match std::str::from_utf8(&line) {
            Ok(text) => f(text, stats)?,
            Err(_) => {
                stats.lines += 1;
                stats.skip(stats.lines, &RecordError::Utf8);
            }
        }
    }
    Ok(())
}

/// Reads raw records from `input` and writes `key\tvalue` lines to `out`.
pub fn run_map<R: BufRead, W: Write>(
    mapper: &dyn Mapper,
    input: R,
    out: &mut W,
) -> Result<StreamStats> {
    let mut stats = StreamStats::default();
    for_each_line(input, &mut stats, |line, stats| {
        if let Some(pairs) = map_line(mapper, line, stats) {
            for kv in pairs {
                write_pair(out, &kv)?;
                stats.emitted += 1;
            }
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(stats)
}

/// Reads key-grouped `key\tvalue` lines from `input` and writes one result
/// line per finished key to `out`.
pub fn run_reduce<R: BufRead, W: Write>(
    reducer: &mut dyn LineReducer,
    input: R,
    out: &mut W,
) -> Result<StreamStats> {
    let mut stats = StreamStats::default();
    for_each_line(input, &mut stats, |line, stats| {
        let flushed = match parse_line(line) {
            Ok(kv) => reduce_pair(reducer, &kv, stats),
            Err(err) => {
                stats.lines += 1;
                stats.skip(stats.lines, &err);
                None
            }
        };
        if let Some(result) = flushed {
            writeln!(out, "{result}")?;
            stats.emitted += 1;
        }
        Ok(())
    })?;
    if let Some(result) = reducer.finish() {
        writeln!(out, "{result}")?;
        stats.emitted += 1;
    }
    out.flush()?;
    Ok(stats)
}

/// Streams already-decoded pairs through `reducer`, collecting the results.
pub fn reduce_pairs<'a, I>(reducer: &mut dyn LineReducer, pairs: I) -> (Vec<String>, StreamStats)
where
    I: IntoIterator<Item = &'a KeyValue>,
{
    let mut stats = StreamStats::default();
    let mut results = pairs
        .into_iter()
        .filter_map(|kv| reduce_pair(reducer, kv, &mut stats))
        .collect::<Vec<_>>();
    results.extend(reducer.finish());
    stats.emitted = results.len() as u64;
    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload;
    use bytes::Bytes;
    use std::io::Cursor;

    fn map(name: &str, aux: &[&str], input: &[u8]) -> (String, StreamStats) {
        let aux = crate::utils::serialize_args(
            &aux.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
        .unwrap();
        let mapper = (workload::named(name).unwrap().mapper_fn)(&aux).unwrap();
        let mut out = Vec::new();
        let stats = run_map(mapper.as_ref(), Cursor::new(input), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    fn reduce(name: &str, input: &[u8]) -> (String, StreamStats) {
        let mut reducer = (workload::named(name).unwrap().reducer_fn)(&Bytes::new()).unwrap();
        let mut out = Vec::new();
        let stats = run_reduce(reducer.as_mut(), Cursor::new(input), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    fn sorted(text: &str) -> String {
        let mut lines = text.lines().collect::<Vec<_>>();
        lines.sort();
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    #[test]
    fn word_count_end_to_end() {
        let (mapped, stats) = map("wc", &[], b"Hello Hadoop\nHello World\n");
        assert_eq!(mapped, "hello\t1\nhadoop\t1\nhello\t1\nworld\t1\n");
        assert_eq!(stats, StreamStats { lines: 2, emitted: 4, skipped: 0 });

        let (reduced, stats) = reduce("wc", sorted(&mapped).as_bytes());
        assert_eq!(reduced, "hadoop\t1\nhello\t2\nworld\t1\n");
        assert_eq!(stats.emitted, 3);
    }

    #[test]
    fn matrix_mult_end_to_end() {
        let input = b"A,0,0,1\nA,0,1,2\nB,0,0,3\nB,1,0,4\nnot,a,record\n";
        let (mapped, stats) = map("mm", &["--rows-a", "1", "--cols-b", "1"], input);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.emitted, 4);

        let (reduced, _) = reduce("mm", sorted(&mapped).as_bytes());
        assert_eq!(reduced, "0 0 11.0\n");
    }

    #[test]
    fn reducer_survives_garbage() {
        let input = b"a\t1\n\xff\xfe\t1\nno separator\n\na\t2\nb\tx\nb\t5";
        let (reduced, stats) = reduce("wc", input);
        assert_eq!(reduced, "a\t3\nb\t5\n");
        assert_eq!(stats.lines, 7);
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn empty_input_emits_nothing() {
        assert_eq!(reduce("wc", b"").0, "");
        assert_eq!(reduce("mm", b"").0, "");
    }

    #[test]
    fn reduce_pairs_flushes_last_key() {
        let mut reducer = (workload::named("wc").unwrap().reducer_fn)(&Bytes::new()).unwrap();
        let pairs = vec![KeyValue::new("x", "2"), KeyValue::new("y", "1")];
        let (results, stats) = reduce_pairs(reducer.as_mut(), &pairs);
        assert_eq!(results, vec!["x\t2", "y\t1"]);
        assert_eq!(stats.emitted, 2);
    }
}
