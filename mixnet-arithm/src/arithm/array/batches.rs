//! Batch-wise reading and writing of arrays.
//!
//! Every array operation is written once against these two types. A memory
//! array is read as a single borrowed batch, while a file array is read in
//! owned batches of the store's batch size, which bounds the memory used by
//! any operation.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use crate::arithm::LargeInteger;
use crate::eio::ByteTreeStreamReader;
use crate::errors::ArithmError;

use super::file::FileArrayWriter;
use super::{Backing, LargeIntegerArray};

pub(crate) enum Batches<'a> {
    Memory {
        values: &'a [LargeInteger],
        batch_size: usize,
    },
    File {
        stream: ByteTreeStreamReader<BufReader<File>>,
        batch_size: usize,
    },
}

impl<'a> Batches<'a> {
    fn read_file_batch(
        stream: &mut ByteTreeStreamReader<BufReader<File>>,
        n: usize,
    ) -> Result<Vec<LargeInteger>, ArithmError> {
        let mut batch = Vec::with_capacity(n);
        for _ in 0..n {
            batch.push(LargeInteger::from_byte_array(&stream.next_leaf()?)?);
        }
        Ok(batch)
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = Result<Cow<'a, [LargeInteger]>, ArithmError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Batches::Memory { values, batch_size } => {
                if values.is_empty() {
                    return None;
                }
                let all: &'a [LargeInteger] = *values;
                let (head, tail) = all.split_at((*batch_size).min(all.len()));
                *values = tail;
                Some(Ok(Cow::Borrowed(head)))
            }
            Batches::File { stream, batch_size } => {
                let n = (*batch_size).min(stream.remaining());
                if n == 0 {
                    return None;
                }
                Some(Self::read_file_batch(stream, n).map(Cow::Owned))
            }
        }
    }
}

/// Collects the output of an operation in the requested backing.
pub(crate) enum ArrayBuilder {
    Memory(Vec<LargeInteger>),
    File(FileArrayWriter),
}

impl ArrayBuilder {
    pub(crate) fn new(backing: &Backing, size: usize) -> Result<Self, ArithmError> {
        Ok(match backing {
            Backing::Memory => ArrayBuilder::Memory(Vec::with_capacity(size)),
            Backing::File(store) => ArrayBuilder::File(FileArrayWriter::new(Arc::clone(store), size)?),
        })
    }

    pub(crate) fn push(&mut self, value: LargeInteger) -> Result<(), ArithmError> {
        match self {
            ArrayBuilder::Memory(values) => values.push(value),
            ArrayBuilder::File(writer) => writer.push(&value)?,
        }
        Ok(())
    }

    pub(crate) fn extend(&mut self, batch: Vec<LargeInteger>) -> Result<(), ArithmError> {
        match self {
            ArrayBuilder::Memory(values) => {
                if values.is_empty() {
                    *values = batch;
                } else {
                    values.extend(batch);
                }
            }
            ArrayBuilder::File(writer) => {
                for value in &batch {
                    writer.push(value)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn extend_from_slice(&mut self, batch: &[LargeInteger]) -> Result<(), ArithmError> {
        match self {
            ArrayBuilder::Memory(values) => values.extend_from_slice(batch),
            ArrayBuilder::File(writer) => {
                for value in batch {
                    writer.push(value)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<LargeIntegerArray, ArithmError> {
        Ok(match self {
            ArrayBuilder::Memory(values) => LargeIntegerArray::Memory(Arc::new(values)),
            ArrayBuilder::File(writer) => LargeIntegerArray::File(writer.finish()?),
        })
    }
}
