//! Utility functions shared by the binaries and the engine.
//!

use anyhow::Result;
use bytes::Bytes;
use tracing_subscriber::EnvFilter;

/// Encodes auxiliary workload arguments for [`crate::workload::parse_aux`].
pub fn serialize_args(args: &[String]) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_string(args)?))
}

/// Read an entire [`Bytes`] slice into a [`String`].
///
/// Returns an error if the slice contains invalid UTF-8.
pub fn string_from_bytes(buf: Bytes) -> Result<String> {
    Ok(String::from_utf8(buf.as_ref().into())?)
}

/// Maps `-v` occurrences to a default filter directive.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing for a stage binary.
///
/// Logs go to stderr: stdout carries the data stream. `RUST_LOG` takes
/// precedence over the verbosity flag.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_are_encoded_as_json() {
        let aux = serialize_args(&["--rows-a".into(), "2".into()]).unwrap();
        assert_eq!(string_from_bytes(aux).unwrap(), r#"["--rows-a","2"]"#);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(7), "trace");
    }
}
