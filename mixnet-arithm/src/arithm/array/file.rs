//! File backing of integer arrays.
//!
//! An array is stored as a byte tree node of leaves, one leaf per integer in
//! two's complement, in a [`TempFile`] of the store's [`StorageDir`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Arc;

use tracing::debug;

use crate::arithm::{LargeInteger, Permutation};
use crate::eio::{ByteTreeStreamReader, ByteTreeWriter, ExternalSorter, StorageDir, TempFile};
use crate::errors::ArithmError;

use super::{DEFAULT_BATCH_SIZE, DEFAULT_SORT_THRESHOLD};

/// Storage parameters shared by all arrays of a file backing.
#[derive(Debug)]
pub struct FileStore {
    dir: Arc<StorageDir>,
    batch_size: usize,
    sort_threshold: usize,
}

impl FileStore {
    pub fn new(dir: Arc<StorageDir>, batch_size: usize, sort_threshold: usize) -> Self {
        FileStore {
            dir,
            batch_size: batch_size.max(1),
            sort_threshold: sort_threshold.max(1),
        }
    }

    /// Store with the default batch size and sort threshold.
    pub fn with_dir(dir: Arc<StorageDir>) -> Self {
        Self::new(dir, DEFAULT_BATCH_SIZE, DEFAULT_SORT_THRESHOLD)
    }

    pub fn dir(&self) -> &Arc<StorageDir> {
        &self.dir
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sort_threshold(&self) -> usize {
        self.sort_threshold
    }
}

/// An immutable array on file. Clones share the file, which is removed when
/// the last clone is dropped.
#[derive(Debug, Clone)]
pub struct FileArray {
    store: Arc<FileStore>,
    file: Arc<TempFile>,
    size: usize,
}

impl FileArray {
    pub fn store(&self) -> &Arc<FileStore> {
        &self.store
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn stream(&self) -> Result<ByteTreeStreamReader<BufReader<File>>, ArithmError> {
        let stream = ByteTreeStreamReader::new(self.file.open()?)?;
        if stream.remaining() != self.size {
            return Err(ArithmError::format(format!(
                "Array file holds {} integers, expected {}!",
                stream.remaining(),
                self.size
            )));
        }
        Ok(stream)
    }

    /// Moves the integer at index `i` to index `permutation.map(i)` by an
    /// external sort on the destination index.
    pub(crate) fn permute(&self, permutation: &Permutation) -> Result<FileArray, ArithmError> {
        if permutation.size() != self.size {
            return Err(ArithmError::mismatch("permutation", permutation.size(), self.size));
        }
        let mut stream = self.stream()?;
        let records = (0..self.size).map(|i| {
            stream
                .next_leaf()
                .map(|bytes| (permutation.map(i) as u64, bytes))
        });

        let sorter = ExternalSorter::new(Arc::clone(self.store.dir()), self.store.sort_threshold());
        let sorted = sorter.sort(records)?;

        let mut writer = FileArrayWriter::new(Arc::clone(&self.store), self.size)?;
        for record in sorted {
            let (_, bytes) = record?;
            writer.push_bytes(&bytes)?;
        }
        writer.finish()
    }
}

/// Writes an array of known size to a fresh file.
pub(crate) struct FileArrayWriter {
    store: Arc<FileStore>,
    file: TempFile,
    writer: ByteTreeWriter<BufWriter<File>>,
    size: usize,
}

impl FileArrayWriter {
    pub(crate) fn new(store: Arc<FileStore>, size: usize) -> Result<Self, ArithmError> {
        let file = store.dir().temp_file();
        let writer = ByteTreeWriter::new(file.create()?, size)?;
        debug!(path = %file.path().display(), size, "creating file array");
        Ok(FileArrayWriter {
            store,
            file,
            writer,
            size,
        })
    }

    pub(crate) fn push(&mut self, value: &LargeInteger) -> Result<(), ArithmError> {
        self.push_bytes(&value.to_byte_array())
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), ArithmError> {
        self.writer.write_leaf(bytes)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<FileArray, ArithmError> {
        self.writer.finish()?;
        Ok(FileArray {
            store: self.store,
            file: Arc::new(self.file),
            size: self.size,
        })
    }
}
