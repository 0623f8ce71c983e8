//! Streaming access to byte trees that are too large to hold in memory.
//!
//! Both sides handle a single node whose children are written or read one at
//! a time. The number of children is fixed when the stream is opened.

use std::io::{Read, Write};

use super::byte_tree::{self, ByteTree, LEAF, NODE};
use super::errors::EioError;

/// Writes a node header and then its children one by one.
#[derive(Debug)]
pub struct ByteTreeWriter<W: Write> {
    out: W,
    remaining: usize,
}

impl<W: Write> ByteTreeWriter<W> {
    /// Starts a node with `children` children.
    pub fn new(mut out: W, children: usize) -> Result<Self, EioError> {
        byte_tree::write_header(&mut out, NODE, children)?;
        Ok(ByteTreeWriter {
            out,
            remaining: children,
        })
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn claim(&mut self) -> Result<(), EioError> {
        if self.remaining == 0 {
            return Err(EioError::format("Writing more children than announced!"));
        }
        self.remaining -= 1;
        Ok(())
    }

    pub fn write_leaf(&mut self, data: &[u8]) -> Result<(), EioError> {
        self.claim()?;
        byte_tree::write_header(&mut self.out, LEAF, data.len())?;
        self.out.write_all(data)?;
        Ok(())
    }

    pub fn write(&mut self, tree: &ByteTree) -> Result<(), EioError> {
        self.claim()?;
        tree.write_to(&mut self.out)
    }

    /// Flushes and returns the sink.
    ///
    /// # Errors
    ///
    /// Fails if fewer children were written than announced.
    pub fn finish(mut self) -> Result<W, EioError> {
        if self.remaining != 0 {
            return Err(EioError::format(format!(
                "Missing {} announced children!",
                self.remaining
            )));
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Reads the children of a node from a stream.
#[derive(Debug)]
pub struct ByteTreeStreamReader<R: Read> {
    input: R,
    remaining: usize,
}

impl<R: Read> ByteTreeStreamReader<R> {
    /// Reads the node header.
    pub fn new(mut input: R) -> Result<Self, EioError> {
        let (tag, count) = byte_tree::read_header(&mut input)?;
        if tag != NODE {
            return Err(EioError::format("Expected a node!"));
        }
        Ok(ByteTreeStreamReader {
            input,
            remaining: count,
        })
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn claim(&mut self) -> Result<(), EioError> {
        if self.remaining == 0 {
            return Err(EioError::format("There are no more children!"));
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Reads the next child, which must be a leaf.
    pub fn next_leaf(&mut self) -> Result<Vec<u8>, EioError> {
        self.claim()?;
        match ByteTree::read_from(&mut self.input)? {
            ByteTree::Leaf(data) => Ok(data),
            ByteTree::Node(_) => Err(EioError::format("Expected a leaf!")),
        }
    }

    pub fn next_tree(&mut self) -> Result<ByteTree, EioError> {
        self.claim()?;
        ByteTree::read_from(&mut self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamed_node_matches_tree_encoding() -> Result<(), EioError> {
        let mut writer = ByteTreeWriter::new(Vec::new(), 3)?;
        writer.write_leaf(&[1])?;
        writer.write(&ByteTree::node(vec![]))?;
        writer.write_leaf(&[])?;
        assert!(writer.write_leaf(&[9]).is_err());
        let bytes = writer.finish()?;

        let expected = ByteTree::node(vec![
            ByteTree::leaf(vec![1]),
            ByteTree::node(vec![]),
            ByteTree::leaf(vec![]),
        ]);
        assert_eq!(bytes, expected.to_bytes());

        let mut reader = ByteTreeStreamReader::new(bytes.as_slice())?;
        assert_eq!(reader.remaining(), 3);
        assert_eq!(reader.next_leaf()?, vec![1]);
        assert!(reader.next_leaf().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_children_fail_on_finish() -> Result<(), EioError> {
        let mut writer = ByteTreeWriter::new(Vec::new(), 2)?;
        writer.write_leaf(&[1])?;
        assert!(writer.finish().is_err());
        Ok(())
    }
}
