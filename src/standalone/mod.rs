use clap::{Parser, Subcommand};

pub mod engine;

#[derive(Parser, Debug)]
#[command(version, about = "Run a whole map/sort/reduce job in one process", long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job over local files
    Submit {
        /// Glob spec for the input files
        #[arg(short, long)]
        input: String,

        /// Name of the workload
        #[arg(short, long)]
        workload: String,

        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Number of reduce partitions
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        n_reduce: u32,

        /// Do not pre-aggregate map output, even if the workload allows it
        #[arg(long)]
        no_combine: bool,

        /// Auxiliary arguments to pass to the MapReduce application.
        #[clap(value_parser, last = true)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Job {
    pub input: String,
    pub workload: String,
    pub output: String,
    pub args: Vec<String>,
    pub n_reduce: u32,
    pub combine: bool,
}

impl From<Commands> for Job {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Submit {
                input,
                workload,
                output,
                n_reduce,
                no_combine,
                args,
            } => Job {
                input,
                workload,
                output,
                args,
                n_reduce,
                combine: !no_combine,
            },
        }
    }
}
