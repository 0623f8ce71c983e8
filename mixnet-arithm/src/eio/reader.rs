use super::byte_tree::ByteTree;
use super::errors::EioError;

/// Depth-first reader of a [`ByteTree`].
///
/// For a leaf, `remaining` counts unread payload bytes. For a node it counts
/// children that have not been handed out yet. Child readers borrow the same
/// tree, so they are independent of the parent once created.
#[derive(Debug, Clone)]
pub struct ByteTreeReader<'a> {
    tree: &'a ByteTree,
    position: usize,
}

impl<'a> ByteTreeReader<'a> {
    pub fn new(tree: &'a ByteTree) -> Self {
        ByteTreeReader { tree, position: 0 }
    }

    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf()
    }

    pub fn remaining(&self) -> usize {
        self.tree.count() - self.position
    }

    /// The subtree this reader walks.
    pub fn tree(&self) -> &'a ByteTree {
        self.tree
    }

    /// Returns a reader of the next child of a node.
    ///
    /// # Errors
    ///
    /// Fails if this reader walks a leaf or if all children have been read.
    pub fn next_child(&mut self) -> Result<ByteTreeReader<'a>, EioError> {
        match self.tree {
            ByteTree::Leaf(_) => Err(EioError::format("Requesting child from leaf!")),
            ByteTree::Node(children) => {
                let child = children
                    .get(self.position)
                    .ok_or_else(|| EioError::format("There are no more children!"))?;
                self.position += 1;
                Ok(ByteTreeReader::new(child))
            }
        }
    }

    pub fn skip_child(&mut self) -> Result<(), EioError> {
        self.next_child().map(|_| ())
    }

    pub fn skip_children(&mut self, n: usize) -> Result<(), EioError> {
        for _ in 0..n {
            self.skip_child()?;
        }
        Ok(())
    }

    /// Reads `len` bytes from a leaf.
    pub fn read(&mut self, len: usize) -> Result<&'a [u8], EioError> {
        match self.tree {
            ByteTree::Node(_) => Err(EioError::format("Reading bytes from a node!")),
            ByteTree::Leaf(data) => {
                if len > data.len() - self.position {
                    return Err(EioError::format("Requesting too many bytes!"));
                }
                let res = &data[self.position..self.position + len];
                self.position += len;
                Ok(res)
            }
        }
    }

    /// Reads the rest of a leaf.
    pub fn read_all(&mut self) -> Result<&'a [u8], EioError> {
        self.read(self.remaining())
    }

    pub fn read_int(&mut self) -> Result<i32, EioError> {
        let b = self.read(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads `n` consecutive integers from a leaf.
    pub fn read_ints(&mut self, n: usize) -> Result<Vec<i32>, EioError> {
        (0..n).map(|_| self.read_int()).collect()
    }

    pub fn read_short(&mut self) -> Result<i16, EioError> {
        let b = self.read(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_byte(&mut self) -> Result<u8, EioError> {
        Ok(self.read(1)?[0])
    }

    /// Reads a boolean. Only the bytes 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool, EioError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(EioError::format(format!("Invalid boolean byte {}!", b))),
        }
    }

    /// Reads the rest of a leaf as a UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, EioError> {
        let bytes = self.read_all()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| EioError::format(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ByteTree {
        ByteTree::node(vec![
            ByteTree::from_int(42),
            ByteTree::node(vec![ByteTree::from_bool(true), ByteTree::from_string("ok")]),
            ByteTree::leaf(vec![1, 2, 3]),
        ])
    }

    #[test]
    fn test_depth_first_walk() -> Result<(), EioError> {
        let tree = sample();
        let mut reader = tree.reader();
        assert!(!reader.is_leaf());
        assert_eq!(reader.remaining(), 3);

        assert_eq!(reader.next_child()?.read_int()?, 42);

        let mut inner = reader.next_child()?;
        assert!(inner.next_child()?.read_bool()?);
        assert_eq!(inner.next_child()?.read_string()?, "ok");
        assert_eq!(inner.remaining(), 0);

        let mut leaf = reader.next_child()?;
        assert_eq!(leaf.read(2)?, &[1, 2]);
        assert_eq!(leaf.remaining(), 1);
        assert!(leaf.read(2).is_err());
        assert_eq!(leaf.read_all()?, &[3]);
        Ok(())
    }

    #[test]
    fn test_misuse_is_reported() -> Result<(), EioError> {
        let tree = sample();
        let mut reader = tree.reader();
        reader.skip_children(3)?;
        let err = reader.next_child().unwrap_err();
        assert!(err.to_string().contains("There are no more children!"));

        let leaf = ByteTree::leaf(vec![2]);
        let mut leaf_reader = leaf.reader();
        assert!(leaf_reader.next_child().is_err());
        assert!(leaf_reader.read_bool().is_err());
        Ok(())
    }
}
