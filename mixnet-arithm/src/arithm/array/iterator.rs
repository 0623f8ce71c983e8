//! Forward-only iteration over an array.

use std::fs::File;
use std::io::BufReader;
use std::slice;

use crate::arithm::LargeInteger;
use crate::eio::ByteTreeStreamReader;
use crate::errors::ArithmError;

/// Single pass over the integers of an array. For a file backing this is the
/// only way to read the whole array without loading it into memory. The
/// underlying file handle is closed on drop.
///
/// After the first error the iterator is exhausted.
#[derive(Debug)]
pub enum LargeIntegerIterator<'a> {
    Memory(slice::Iter<'a, LargeInteger>),
    File {
        stream: ByteTreeStreamReader<BufReader<File>>,
        failed: bool,
    },
}

impl LargeIntegerIterator<'_> {
    fn next_from_file(
        stream: &mut ByteTreeStreamReader<BufReader<File>>,
    ) -> Result<LargeInteger, ArithmError> {
        let bytes = stream.next_leaf()?;
        LargeInteger::from_byte_array(&bytes)
    }
}

impl Iterator for LargeIntegerIterator<'_> {
    type Item = Result<LargeInteger, ArithmError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LargeIntegerIterator::Memory(values) => values.next().cloned().map(Ok),
            LargeIntegerIterator::File { stream, failed } => {
                if *failed || stream.remaining() == 0 {
                    return None;
                }
                let res = Self::next_from_file(stream);
                *failed = res.is_err();
                Some(res)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            LargeIntegerIterator::Memory(values) => values.size_hint(),
            LargeIntegerIterator::File { stream, failed } => {
                let n = if *failed { 0 } else { stream.remaining() };
                (0, Some(n))
            }
        }
    }
}
