//! The key-boundary state machine shared by every grouped reducer.
//!
//! [`GroupedReduce`] is either idle or accumulating one key. Feeding it a pair
//! with a different key flushes the previous key first; [`GroupedReduce::finish`]
//! flushes whatever is left at end of stream. Input must be contiguous by key.
//! A key that shows up again after its run ended is treated as a new run.

use crate::{KeyValue, RecordError, Reducer};

/// A grouped reducer as seen by the stream drivers.
pub trait LineReducer {
    /// Feeds one intermediate pair. Returns the rendered result of the
    /// previous key when this pair starts a new run.
    ///
    /// A rejected pair, undecodable or refused by the fold, leaves the state
    /// untouched.
    fn push(&mut self, kv: &KeyValue) -> Result<Option<String>, RecordError>;

    /// Flushes the current key, if any, and returns to idle.
    fn finish(&mut self) -> Option<String>;
}

pub struct GroupedReduce<R: Reducer> {
    reducer: R,
    current: Option<(R::Key, R::Acc)>,
}

impl<R: Reducer> GroupedReduce<R> {
    pub fn new(reducer: R) -> Self {
        Self {
            reducer,
            current: None,
        }
    }

    /// `true` when no key is being accumulated.
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn push(&mut self, kv: &KeyValue) -> Result<Option<String>, RecordError> {
        let (key, value) = self.reducer.decode(kv)?;

        if let Some((current, acc)) = self.current.as_mut() {
            if *current == key {
                self.reducer.fold(acc, value)?;
                return Ok(None);
            }
        }

        // fold before flushing, so a rejected value leaves the previous run open
        let mut acc = R::Acc::default();
        self.reducer.fold(&mut acc, value)?;
        let flushed = self.flush();
        self.current = Some((key, acc));
        Ok(flushed)
    }

    /// Finalizes the current key and discards its state.
    pub fn flush(&mut self) -> Option<String> {
        let (key, acc) = self.current.take()?;
        self.reducer.finish(key, acc)
    }
}

impl<R: Reducer> LineReducer for GroupedReduce<R> {
    fn push(&mut self, kv: &KeyValue) -> Result<Option<String>, RecordError> {
        GroupedReduce::push(self, kv)
    }

    fn finish(&mut self) -> Option<String> {
        self.flush()
    }
}
