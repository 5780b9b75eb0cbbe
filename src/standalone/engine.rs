use anyhow::{bail, Context, Result};
use bytes::Bytes;
use dashmap::DashMap;
use glob::glob;
use itertools::Itertools;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use tracing::{debug, info};

use crate::codec::parse_line;
use crate::standalone::Job;
use crate::stream::{for_each_line, map_line, reduce_pairs, StreamStats};
use crate::utils::serialize_args;
use crate::*;

// types related to this engine
type BucketIndex = u32;
type Buckets = DashMap<BucketIndex, Vec<KeyValue>>;

/// Name of the job summary written next to the partition outputs.
pub const SUMMARY_FILE: &str = "job-summary.json";

#[derive(Debug, Serialize)]
pub struct PartitionSummary {
    pub partition: BucketIndex,
    pub output: String,
    pub stats: StreamStats,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub workload: &'static str,
    pub input_files: usize,
    pub combined: bool,
    pub map: StreamStats,
    pub reduce: Vec<PartitionSummary>,
}

/// Output file of one reduce partition.
pub fn partition_file(output_dir: &str, partition: BucketIndex) -> String {
    format!("{}/mr-out-{}", output_dir, partition)
}

/// Sorts `pairs` by key and runs them through a fresh reducer, decoding the
/// results back into pairs. Only valid for combinable workloads, whose
/// reducer output is itself protocol lines.
pub fn combine(
    engine: &Workload,
    serialized_args: &Bytes,
    pairs: Vec<KeyValue>,
) -> Result<Vec<KeyValue>> {
    let mut reducer = (engine.reducer_fn)(serialized_args)?;
    let sorted = pairs.into_iter().sorted_by(|a, b| a.key.cmp(&b.key)).collect_vec();
    let (results, _) = reduce_pairs(reducer.as_mut(), &sorted);
    Ok(results
        .iter()
        .filter_map(|line| parse_line(line).ok())
        .collect())
}

/// Maps every input file and partitions the output by `ihash(key) % n_reduce`.
pub fn perform_map(
    job: &Job,
    engine: &Workload,
    serialized_args: &Bytes,
) -> Result<(Buckets, StreamStats, usize)> {
    if job.n_reduce == 0 {
        bail!("a job needs at least one reduce partition");
    }
    let mapper = (engine.mapper_fn)(serialized_args)?;
    let combine_output = job.combine && engine.combinable;

    let buckets: Buckets = Buckets::new();
    let mut stats = StreamStats::default();
    let mut input_files = 0;

    for pathspec in glob(&job.input)?.flatten() {
        if !pathspec.is_file() {
            continue;
        }
        input_files += 1;
        debug!(path = %pathspec.display(), "mapping input file");

        let file = File::open(&pathspec)
            .with_context(|| format!("cannot open input {}", pathspec.display()))?;
        let mut pairs = Vec::new();
        for_each_line(BufReader::new(file), &mut stats, |line, stats| {
            if let Some(out) = map_line(mapper.as_ref(), line, stats) {
                pairs.extend(out);
            }
            Ok(())
        })?;
        stats.emitted += pairs.len() as u64;

        let pairs = if combine_output {
            let before = pairs.len();
            let combined = combine(engine, serialized_args, pairs)?;
            debug!(before, after = combined.len(), "combined map output");
            combined
        } else {
            pairs
        };

        for kv in pairs {
            let bucket_no = ihash(&kv.key) % job.n_reduce;
            #[allow(clippy::unwrap_or_default)]
            buckets.entry(bucket_no).or_insert(Vec::new()).push(kv);
        }
    }

    if input_files == 0 {
        bail!("no input files match `{}`", job.input);
    }
    Ok((buckets, stats, input_files))
}

/// Sorts each partition by key and streams it through the grouped reducer.
///
/// Every partition gets an output file, even an empty one.
pub fn perform_reduce(
    job: &Job,
    engine: &Workload,
    serialized_args: &Bytes,
    buckets: Buckets,
) -> Result<Vec<PartitionSummary>> {
    let output_dir = &job.output;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir))?;

    let mut summaries = Vec::with_capacity(job.n_reduce as usize);
    for reduce_id in 0..job.n_reduce {
        let bkt = buckets
            .remove(&reduce_id)
            .map(|(_, bkt)| bkt)
            .unwrap_or_default();
        // stable, so values keep their map order within a key run
        let bkt = bkt.into_iter().sorted_by(|a, b| a.key.cmp(&b.key)).collect_vec();

        let mut reducer = (engine.reducer_fn)(serialized_args)?;
        let (results, stats) = reduce_pairs(reducer.as_mut(), &bkt);

        let out_pathspec = partition_file(output_dir, reduce_id);
        let mut out_file = BufWriter::new(File::create(&out_pathspec)?);
        for line in &results {
            writeln!(out_file, "{line}")?;
        }
        out_file.flush()?;

        debug!(partition = reduce_id, records = stats.emitted, "reduced partition");
        summaries.push(PartitionSummary {
            partition: reduce_id,
            output: out_pathspec,
            stats,
        });
    }
    Ok(summaries)
}

/// Runs `job` end to end and writes [`SUMMARY_FILE`] into the output directory.
pub fn run_job(job: &Job) -> Result<JobSummary> {
    if job.n_reduce == 0 {
        bail!("a job needs at least one reduce partition");
    }
    let engine = workload::named(&job.workload)?;
    let serialized_args = serialize_args(&job.args)?;

    /*  The map logic carries out mapping and also shuffle. This makes sense in
     *  the case of a standalone system.
     */
    let (buckets, map_stats, input_files) = perform_map(job, &engine, &serialized_args)?;
    info!(
        workload = engine.name,
        input_files,
        lines = map_stats.lines,
        pairs = map_stats.emitted,
        skipped = map_stats.skipped,
        "map phase done"
    );

    let reduce = perform_reduce(job, &engine, &serialized_args, buckets)?;
    info!(
        partitions = reduce.len(),
        records = reduce.iter().map(|p| p.stats.emitted).sum::<u64>(),
        "reduce phase done"
    );

    let summary = JobSummary {
        workload: engine.name,
        input_files,
        combined: job.combine && engine.combinable,
        map: map_stats,
        reduce,
    };
    let summary_path = Path::new(&job.output).join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_vec_pretty(&summary)?)?;
    Ok(summary)
}
