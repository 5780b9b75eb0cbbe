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
    // bad workload arguments abort here, before any input is read
    let mapper = (engine.mapper_fn)(&serialize_args(&args.args)?)?;

    let stdin = io::stdin().lock();
    let mut stdout = BufWriter::new(io::stdout().lock());
    let stats = stream::run_map(mapper.as_ref(), stdin, &mut stdout)?;

    info!(
        workload = engine.name,
        lines = stats.lines,
        pairs = stats.emitted,
        skipped = stats.skipped,
        "map done"
    );
    Ok(())
}
