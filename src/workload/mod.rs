//! Converts MapReduce application names to actual application code.
//!
//! # Example
//!
//! To get the word count application:
//! ```
//! # use anyhow::Result;
//! use mrstream::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc")?;
//! assert!(wc.combinable);
//! # Ok(())
//! # }
//! ```

use crate::Workload;
use anyhow::{bail, Result};
use bytes::Bytes;
use clap::Parser;

pub mod matrix_mult;
pub mod wc;

/// Names of every registered workload.
pub const NAMES: &[&str] = &["wc", "mm"];

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            name: "wc",
            mapper_fn: wc::mapper,
            reducer_fn: wc::reducer,
            combinable: true,
        }),
        "mm" | "matrix-mult" => Some(Workload {
            name: "mm",
            mapper_fn: matrix_mult::mapper,
            reducer_fn: matrix_mult::reducer,
            combinable: false,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found. Known apps: {}", name, NAMES.join(", ")),
    }
}

/// Parses a workload's auxiliary arguments.
///
/// `aux` holds the JSON-encoded argument list produced by
/// [`crate::utils::serialize_args`]; empty bytes mean no arguments.
pub fn parse_aux<A: Parser>(aux: &Bytes) -> Result<A> {
    let args: Vec<String> = if aux.is_empty() {
        Vec::new()
    } else {
        serde_json::from_slice(aux)?
    };
    Ok(A::try_parse_from(args)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(named("wc").unwrap().name, "wc");
        assert_eq!(named("matrix-mult").unwrap().name, "mm");
        assert!(!named("mm").unwrap().combinable);
        assert!(try_named("grep").is_none());

        let err = named("pagerank").err().unwrap();
        assert!(err.to_string().contains("pagerank"));
    }
}
