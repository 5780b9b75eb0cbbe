//! Streaming re-keyers and grouped reducers (MapReduce, streaming flavour).
//!
//! A job is a pair of line-oriented stages. The mapper reads raw records and
//! re-keys them into `key\tvalue` lines; the reducer reads those lines back,
//! grouped by key, and folds every contiguous run of one key into a single
//! result. The shuffle/sort in between is someone else's job (Hadoop
//! Streaming, `sort(1)`, or the [`standalone`] engine of this crate).

use bytes::Bytes;
use std::hash::Hasher;

pub mod cmd;
pub mod codec;
pub mod error;
pub mod reduce;
pub mod standalone;
pub mod stream;
pub mod utils;
pub mod workload;

pub use error::RecordError;
pub use reduce::{GroupedReduce, LineReducer};

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// The output of a mapper for one input line.
///
/// The outer [`Result`] rejects a malformed record as a whole; the driver
/// skips it. The iterator is lazy, so a wide fan-out is never materialized.
pub type MapOutput = Result<Box<dyn Iterator<Item = KeyValue>>, RecordError>;

/// Re-keys raw input lines into intermediate key-value pairs.
///
/// Mappers are stateless across lines; any configuration is fixed when the
/// mapper is built.
pub trait Mapper {
    fn map(&self, line: &str) -> MapOutput;
}

/// A per-key fold over a key-contiguous stream of intermediate pairs.
///
/// A reducer only describes the fold. Key boundaries, flushing and resetting
/// are handled by [`GroupedReduce`].
pub trait Reducer {
    /// Decoded grouping key. Two pairs belong to the same run iff their keys
    /// compare equal.
    type Key: PartialEq;
    /// Decoded payload of one pair.
    type Value;
    /// Running state for the current key. `Default` is the empty state.
    type Acc: Default;

    /// Decodes one intermediate pair.
    fn decode(&self, kv: &KeyValue) -> Result<(Self::Key, Self::Value), RecordError>;

    /// Folds `value` into the accumulator of the current key.
    ///
    /// On error the accumulator must be left as it was; the value is dropped.
    fn fold(&self, acc: &mut Self::Acc, value: Self::Value) -> Result<(), RecordError>;

    /// Renders the result for a finished key, or `None` to suppress it.
    fn finish(&self, key: Self::Key, acc: Self::Acc) -> Option<String>;
}

/// Builds a mapper from the workload's auxiliary arguments.
pub type MapperFn = fn(aux: &Bytes) -> anyhow::Result<Box<dyn Mapper>>;

/// Builds a boxed grouped reducer from the workload's auxiliary arguments.
pub type ReducerFn = fn(aux: &Bytes) -> anyhow::Result<Box<dyn LineReducer>>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub name: &'static str,
    pub mapper_fn: MapperFn,
    pub reducer_fn: ReducerFn,
    /// Whether the reducer output can be fed back into the reducer, so it
    /// may run as a combiner on partial mapper output.
    pub combinable: bool,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyValue {
    /// The key.
    pub key: Bytes,
    /// The value.
    pub value: Bytes,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the key of this key-value pair.
    ///
    /// This method is cheap, since [`Bytes`] are cheaply cloneable.
    #[inline]
    pub fn key(&self) -> Bytes {
        self.key.clone()
    }

    /// Get the value of this key-value pair.
    ///
    /// This method is cheap, since [`Bytes`] are cheaply cloneable.
    #[inline]
    pub fn value(&self) -> Bytes {
        self.value.clone()
    }

    /// The key as UTF-8 text.
    pub fn key_str(&self) -> Result<&str, RecordError> {
        std::str::from_utf8(&self.key).map_err(|_| RecordError::Utf8)
    }

    /// The value as UTF-8 text.
    pub fn value_str(&self) -> Result<&str, RecordError> {
        std::str::from_utf8(&self.value).map_err(|_| RecordError::Utf8)
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    // masked to 31 bits, always fits
    (hasher.finish() & 0x7fff_ffff) as u32
}
