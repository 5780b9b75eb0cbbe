use clap::Parser;

/// Arguments shared by `mrs-mapper` and `mrs-reducer`.
///
/// Both read stdin and write stdout, so either can be handed to a streaming
/// framework as-is, e.g. `-mapper "mrs-mapper mm -- --rows-a 2 --cols-b 2"`.
#[derive(Parser, Debug)]
#[command(version, about = "Run one stage of a streaming job over stdin and stdout", long_about = None)]
pub struct Args {
    /// Name of the workload (wc, mm)
    pub workload: String,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Auxiliary arguments to pass to the MapReduce application.
    #[clap(value_parser, last = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_args_follow_double_dash() {
        let args = Args::try_parse_from([
            "mrs-mapper", "-vv", "mm", "--", "--rows-a", "2", "--cols-b", "3",
        ])
        .unwrap();
        assert_eq!(args.workload, "mm");
        assert_eq!(args.verbose, 2);
        assert_eq!(args.args, vec!["--rows-a", "2", "--cols-b", "3"]);
    }

    #[test]
    fn workload_is_required() {
        assert!(Args::try_parse_from(["mrs-reducer"]).is_err());
    }
}
