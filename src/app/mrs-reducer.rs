use anyhow::Result;
use clap::Parser;
use mrstream::cmd::stage::Args;
use mrstream::utils::{init_logging, serialize_args};
use mrstream::*;
use std::io::{self, BufWriter};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let engine = workload::named(&args.workload)?;
    let mut reducer = (engine.reducer_fn)(&serialize_args(&args.args)?)?;

    // input must already be grouped by key
    let stdin = io::stdin().lock();
    let mut stdout = BufWriter::new(io::stdout().lock());
    let stats = stream::run_reduce(reducer.as_mut(), stdin, &mut stdout)?;

    info!(
        workload = engine.name,
        lines = stats.lines,
        results = stats.emitted,
        skipped = stats.skipped,
        "reduce done"
    );
    Ok(())
}
