use anyhow::Result;
use clap::Parser;
use mrstream::standalone::{engine::run_job, Args, Job};
use mrstream::utils::init_logging;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let job = Job::from(args.command);
    let summary = run_job(&job)?;

    for partition in &summary.reduce {
        println!("{}", partition.output);
    }
    Ok(())
}
