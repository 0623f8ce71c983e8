//! # Encoded input/output
//!
//! The [`ByteTree`] format used for every persisted or transmitted value, its
//! readers and writers, and the scoped temporary storage used by file-backed
//! arrays.

pub mod byte_tree;
pub mod errors;
pub mod reader;
pub mod sort;
pub mod storage;
pub mod stream;

pub use byte_tree::ByteTree;
pub use errors::EioError;
pub use reader::ByteTreeReader;
pub use sort::ExternalSorter;
pub use storage::{StorageDir, TempFile};
pub use stream::{ByteTreeStreamReader, ByteTreeWriter};
