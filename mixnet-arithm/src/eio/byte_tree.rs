//! The ByteTree encoding.
//!
//! A byte tree is either a leaf holding a byte string or a node holding an
//! ordered list of byte trees. It is encoded as a one byte tag followed by a
//! 4-byte big-endian count (payload length for a leaf, number of children for
//! a node) and then the payload or the encodings of the children.

use std::fmt;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::errors::EioError;
use super::reader::ByteTreeReader;

/// Tag byte of a node.
pub const NODE: u8 = 0;
/// Tag byte of a leaf.
pub const LEAF: u8 = 1;
/// Size of the tag and count prefix.
pub const HEADER_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ByteTree {
    Leaf(Vec<u8>),
    Node(Vec<ByteTree>),
}

impl Default for ByteTree {
    fn default() -> Self {
        ByteTree::Node(Vec::new())
    }
}

impl ByteTree {
    pub fn leaf(bytes: impl Into<Vec<u8>>) -> Self {
        ByteTree::Leaf(bytes.into())
    }

    pub fn node(children: Vec<ByteTree>) -> Self {
        ByteTree::Node(children)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ByteTree::Leaf(_))
    }

    /// Number of payload bytes of a leaf or number of children of a node.
    pub fn count(&self) -> usize {
        match self {
            ByteTree::Leaf(data) => data.len(),
            ByteTree::Node(children) => children.len(),
        }
    }

    /// Number of bytes of the complete encoding.
    ///
    /// # Example
    ///
    /// ```
    /// # use mixnet_arithm::eio::ByteTree;
    /// let tree = ByteTree::node(vec![ByteTree::leaf(vec![1, 2]), ByteTree::leaf(vec![])]);
    /// assert_eq!(tree.total_byte_size(), 5 + (5 + 2) + 5);
    /// assert_eq!(tree.to_bytes().len(), tree.total_byte_size());
    /// ```
    pub fn total_byte_size(&self) -> usize {
        match self {
            ByteTree::Leaf(data) => HEADER_SIZE + data.len(),
            ByteTree::Node(children) => {
                HEADER_SIZE + children.iter().map(ByteTree::total_byte_size).sum::<usize>()
            }
        }
    }

    pub fn reader(&self) -> ByteTreeReader<'_> {
        ByteTreeReader::new(self)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_byte_size());
        self.append_to(&mut out);
        out
    }

    fn append_to(&self, out: &mut Vec<u8>) {
        match self {
            ByteTree::Leaf(data) => {
                out.push(LEAF);
                out.extend_from_slice(&(data.len() as u32).to_be_bytes());
                out.extend_from_slice(data);
            }
            ByteTree::Node(children) => {
                out.push(NODE);
                out.extend_from_slice(&(children.len() as u32).to_be_bytes());
                for child in children {
                    child.append_to(out);
                }
            }
        }
    }

    /// Writes the encoding to `out` without materializing it.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), EioError> {
        match self {
            ByteTree::Leaf(data) => {
                write_header(out, LEAF, data.len())?;
                out.write_all(data)?;
            }
            ByteTree::Node(children) => {
                write_header(out, NODE, children.len())?;
                for child in children {
                    child.write_to(out)?;
                }
            }
        }
        Ok(())
    }

    /// Parses a complete encoding. Trailing bytes are rejected.
    ///
    /// # Errors
    ///
    /// Returns `EioError::Format` if the tag is unknown, a count is negative,
    /// the input ends early or bytes remain after the tree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EioError> {
        let mut offset = 0;
        let tree = Self::parse(bytes, &mut offset)?;
        if offset != bytes.len() {
            return Err(EioError::format(format!(
                "Trailing bytes after byte tree ({} of {} bytes used)",
                offset,
                bytes.len()
            )));
        }
        Ok(tree)
    }

    fn parse(bytes: &[u8], offset: &mut usize) -> Result<Self, EioError> {
        if bytes.len() < *offset + HEADER_SIZE {
            return Err(EioError::format("Truncated byte tree header!"));
        }
        let tag = bytes[*offset];
        let count = parse_count(&bytes[*offset + 1..*offset + HEADER_SIZE])?;
        *offset += HEADER_SIZE;

        match tag {
            LEAF => {
                if bytes.len() - *offset < count {
                    return Err(EioError::format("Truncated leaf!"));
                }
                let data = bytes[*offset..*offset + count].to_vec();
                *offset += count;
                Ok(ByteTree::Leaf(data))
            }
            NODE => {
                // Every child needs at least a header.
                if (bytes.len() - *offset) / HEADER_SIZE < count {
                    return Err(EioError::format("Truncated node!"));
                }
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    children.push(Self::parse(bytes, offset)?);
                }
                Ok(ByteTree::Node(children))
            }
            other => Err(EioError::format(format!("Unknown tag byte {}!", other))),
        }
    }

    /// Reads one complete byte tree from a stream.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self, EioError> {
        let (tag, count) = read_header(input)?;
        match tag {
            LEAF => {
                let mut data = Vec::new();
                input.take(count as u64).read_to_end(&mut data)?;
                if data.len() != count {
                    return Err(EioError::format("Truncated leaf!"));
                }
                Ok(ByteTree::Leaf(data))
            }
            NODE => {
                let mut children = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    children.push(Self::read_from(input)?);
                }
                Ok(ByteTree::Node(children))
            }
            other => Err(EioError::format(format!("Unknown tag byte {}!", other))),
        }
    }

    /// Hexadecimal rendering of the complete encoding.
    pub fn to_hex(&self) -> String {
        self.to_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_int(value: i32) -> Self {
        ByteTree::Leaf(value.to_be_bytes().to_vec())
    }

    pub fn from_short(value: i16) -> Self {
        ByteTree::Leaf(value.to_be_bytes().to_vec())
    }

    pub fn from_bool(value: bool) -> Self {
        ByteTree::Leaf(vec![u8::from(value)])
    }

    pub fn from_string(value: &str) -> Self {
        ByteTree::Leaf(value.as_bytes().to_vec())
    }

    pub fn from_ints(values: &[i32]) -> Self {
        ByteTree::Node(values.iter().map(|&v| Self::from_int(v)).collect())
    }

    pub fn from_bools(values: &[bool]) -> Self {
        ByteTree::Node(values.iter().map(|&v| Self::from_bool(v)).collect())
    }

    pub fn from_strings<S: AsRef<str>>(values: &[S]) -> Self {
        ByteTree::Node(values.iter().map(|v| Self::from_string(v.as_ref())).collect())
    }

    /// Inverse of [`ByteTree::from_ints`].
    pub fn to_ints(&self) -> Result<Vec<i32>, EioError> {
        let mut reader = self.reader();
        let mut res = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            res.push(reader.next_child()?.read_int()?);
        }
        Ok(res)
    }

    /// Inverse of [`ByteTree::from_bools`].
    pub fn to_bools(&self) -> Result<Vec<bool>, EioError> {
        let mut reader = self.reader();
        let mut res = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            res.push(reader.next_child()?.read_bool()?);
        }
        Ok(res)
    }

    /// Inverse of [`ByteTree::from_strings`].
    pub fn to_strings(&self) -> Result<Vec<String>, EioError> {
        let mut reader = self.reader();
        let mut res = Vec::with_capacity(reader.remaining());
        while reader.remaining() > 0 {
            res.push(reader.next_child()?.read_string()?);
        }
        Ok(res)
    }
}

impl fmt::Display for ByteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub(crate) fn write_header<W: Write + ?Sized>(
    out: &mut W,
    tag: u8,
    count: usize,
) -> Result<(), EioError> {
    if count > i32::MAX as usize {
        return Err(EioError::format(format!("Count {} does not fit a byte tree!", count)));
    }
    out.write_all(&[tag])?;
    out.write_all(&(count as u32).to_be_bytes())?;
    Ok(())
}

pub(crate) fn read_header<R: Read + ?Sized>(input: &mut R) -> Result<(u8, usize), EioError> {
    let mut header = [0u8; HEADER_SIZE];
    input.read_exact(&mut header)?;
    let count = parse_count(&header[1..])?;
    Ok((header[0], count))
}

fn parse_count(bytes: &[u8]) -> Result<usize, EioError> {
    let count = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if count < 0 {
        return Err(EioError::format("Negative count in byte tree!"));
    }
    Ok(count as usize)
}

impl Serialize for ByteTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.to_bytes()))
    }
}

struct ByteTreeVisitor;

impl Visitor<'_> for ByteTreeVisitor {
    type Value = ByteTree;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a base64 encoded byte tree")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ByteTree, E> {
        let bytes = STANDARD.decode(value).map_err(E::custom)?;
        ByteTree::from_bytes(&bytes).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ByteTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ByteTreeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for ByteTree {
        fn arbitrary(g: &mut Gen) -> Self {
            let depth = usize::arbitrary(g) % 3;
            arbitrary_tree(g, depth)
        }
    }

    fn arbitrary_tree(g: &mut Gen, depth: usize) -> ByteTree {
        if depth == 0 || bool::arbitrary(g) {
            ByteTree::Leaf(Vec::<u8>::arbitrary(g))
        } else {
            let width = usize::arbitrary(g) % 4;
            ByteTree::Node((0..width).map(|_| arbitrary_tree(g, depth - 1)).collect())
        }
    }

    #[test]
    fn test_leaf_encoding() {
        let tree = ByteTree::leaf(vec![0xAB, 0xCD]);
        assert_eq!(tree.to_bytes(), vec![LEAF, 0, 0, 0, 2, 0xAB, 0xCD]);
    }

    #[test]
    fn test_node_encoding() {
        let tree = ByteTree::node(vec![ByteTree::leaf(vec![7]), ByteTree::node(vec![])]);
        assert_eq!(
            tree.to_bytes(),
            vec![NODE, 0, 0, 0, 2, LEAF, 0, 0, 0, 1, 7, NODE, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = ByteTree::leaf(vec![1]).to_bytes();
        bytes.push(0);
        assert!(ByteTree::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_rejects_truncated_and_bad_tags() {
        assert!(ByteTree::from_bytes(&[LEAF, 0, 0, 0, 3, 1, 2]).is_err());
        assert!(ByteTree::from_bytes(&[NODE, 0, 0, 0, 1]).is_err());
        assert!(ByteTree::from_bytes(&[7, 0, 0, 0, 0]).is_err());
        assert!(ByteTree::from_bytes(&[LEAF, 0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_int_and_string_helpers() -> Result<(), EioError> {
        let ints = ByteTree::from_ints(&[0, -1, i32::MAX]);
        assert_eq!(ints.to_ints()?, vec![0, -1, i32::MAX]);

        let bools = ByteTree::from_bools(&[true, false, false]);
        assert_eq!(bools.to_bools()?, vec![true, false, false]);

        let strings = ByteTree::from_strings(&["mix", "", "net"]);
        assert_eq!(strings.to_strings()?, vec!["mix", "", "net"]);
        Ok(())
    }

    #[test]
    fn test_serde_uses_base64() -> Result<(), serde_json::Error> {
        let tree = ByteTree::node(vec![ByteTree::from_int(5)]);
        let json = serde_json::to_string(&tree)?;
        assert_eq!(json, format!("\"{}\"", STANDARD.encode(tree.to_bytes())));
        let back: ByteTree = serde_json::from_str(&json)?;
        assert_eq!(back, tree);
        Ok(())
    }

    #[quickcheck]
    fn prop_parse_inverts_encoding(tree: ByteTree) -> bool {
        let bytes = tree.to_bytes();
        bytes.len() == tree.total_byte_size()
            && ByteTree::from_bytes(&bytes).ok() == Some(tree.clone())
            && ByteTree::read_from(&mut bytes.as_slice()).ok() == Some(tree)
    }
}
