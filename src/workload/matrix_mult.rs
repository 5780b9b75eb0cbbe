//! Sparse matrix multiplication `C = A × B` in a single MapReduce round.
//!
//! Input records are `name,row,col,value` with `name` one of `A`/`B`. The
//! mapper replicates every entry to each output cell that needs it: `A[i][j]`
//! goes to `(i, k)` for every column `k` of `B`, and `B[j][k]` goes to
//! `(i, k)` for every row `i` of `A`. The reducer for `(i, k)` then joins the
//! two sides on `j` and emits `i k C[i][k]` when it is nonzero.
//!
//! The fan-out bounds come from the job configuration (`--rows-a`/`--cols-b`,
//! or `MAX_I`/`MAX_K` in the environment). Contributions that fall outside the
//! configured bounds are dropped without a diagnostic.

use crate::codec::{format_float, parse_index, parse_number};
use crate::workload::parse_aux;
use crate::*;
use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Parser, Debug, Clone, Copy, Serialize, Deserialize)]
#[clap(no_binary_name = true)]
pub struct Args {
    /// Number of rows of A
    #[clap(long, env = "MAX_I", value_parser)]
    pub rows_a: u64,

    /// Number of columns of B
    #[clap(long, env = "MAX_K", value_parser)]
    pub cols_b: u64,
}

/// Which operand an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matrix {
    A,
    B,
}

impl FromStr for Matrix {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, RecordError> {
        match s.trim() {
            "A" | "a" => Ok(Matrix::A),
            "B" | "b" => Ok(Matrix::B),
            other => Err(RecordError::Tag(other.to_owned())),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matrix::A => f.write_str("A"),
            Matrix::B => f.write_str("B"),
        }
    }
}

pub struct MatrixMultMapper {
    rows_a: u64,
    cols_b: u64,
}

impl MatrixMultMapper {
    pub fn new(args: Args) -> Self {
        Self {
            rows_a: args.rows_a,
            cols_b: args.cols_b,
        }
    }
}

impl Mapper for MatrixMultMapper {
    fn map(&self, line: &str) -> MapOutput {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Err(RecordError::Ignored);
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 4 {
            return Err(RecordError::FieldCount {
                expected: 4,
                found: parts.len(),
            });
        }
        let matrix: Matrix = parts[0].parse()?;
        let row = parse_index(parts[1])?;
        let col = parse_index(parts[2])?;
        let value = format_float(parse_number(parts[3])?);

        // one shared payload per entry, cloned cheaply into every fan-out pair
        match matrix {
            Matrix::A => {
                let tag = Bytes::from(format!("A,{col},{value}"));
                Ok(Box::new((0..self.cols_b).map(move |k| KeyValue {
                    key: Bytes::from(format!("{row},{k}")),
                    value: tag.clone(),
                })))
            }
            Matrix::B => {
                let tag = Bytes::from(format!("B,{row},{value}"));
                Ok(Box::new((0..self.rows_a).map(move |i| KeyValue {
                    key: Bytes::from(format!("{i},{col}")),
                    value: tag.clone(),
                })))
            }
        }
    }
}

/// Per-cell join state: inner index `j` to the summed entries of each side.
#[derive(Debug, Default)]
pub struct DotProduct {
    a: BTreeMap<u64, f64>,
    b: BTreeMap<u64, f64>,
}

impl DotProduct {
    pub fn add(&mut self, matrix: Matrix, j: u64, value: f64) {
        let side = match matrix {
            Matrix::A => &mut self.a,
            Matrix::B => &mut self.b,
        };
        *side.entry(j).or_insert(0.0) += value;
    }

    /// Sum of `A[j] * B[j]` over the indices present on both sides.
    pub fn total(&self) -> f64 {
        self.a
            .iter()
            .filter_map(|(j, a)| self.b.get(j).map(|b| a * b))
            .fold(0.0, |total, product| total + product)
    }
}

pub struct MatrixMultReducer;

impl Reducer for MatrixMultReducer {
    type Key = (u64, u64);
    type Value = (Matrix, u64, f64);
    type Acc = DotProduct;

    fn decode(&self, kv: &KeyValue) -> Result<(Self::Key, Self::Value), RecordError> {
        let (i, k) = kv
            .key_str()?
            .split_once(',')
            .ok_or(RecordError::FieldCount {
                expected: 2,
                found: 1,
            })?;
        let key = (parse_index(i)?, parse_index(k)?);

        let parts: Vec<&str> = kv.value_str()?.splitn(3, ',').collect();
        if parts.len() != 3 {
            return Err(RecordError::FieldCount {
                expected: 3,
                found: parts.len(),
            });
        }
        let matrix: Matrix = parts[0].parse()?;
        let j = parse_index(parts[1])?;
        let value = parse_number(parts[2])?;

        Ok((key, (matrix, j, value)))
    }

    fn fold(
        &self,
        acc: &mut DotProduct,
        (matrix, j, value): (Matrix, u64, f64),
    ) -> Result<(), RecordError> {
        acc.add(matrix, j, value);
        Ok(())
    }

    fn finish(&self, (i, k): (u64, u64), acc: DotProduct) -> Option<String> {
        let total = acc.total();
        (total != 0.0).then(|| format!("{i} {k} {}", format_float(total)))
    }
}

pub fn mapper(aux: &Bytes) -> Result<Box<dyn Mapper>> {
    let args: Args = parse_aux(aux)?;
    Ok(Box::new(MatrixMultMapper::new(args)))
}

pub fn reducer(_aux: &Bytes) -> Result<Box<dyn LineReducer>> {
    Ok(Box::new(GroupedReduce::new(MatrixMultReducer)))
}
