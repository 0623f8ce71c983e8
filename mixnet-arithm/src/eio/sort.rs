//! External merge sort of keyed records.
//!
//! Records are collected into runs of at most `run_length` records. Each run
//! is sorted in memory and spilled to a temporary file as a byte tree node of
//! `(key, payload)` pairs. The runs are then merged with a k-way merge. If all
//! records fit in a single run nothing is written to disk.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use tracing::debug;

use super::byte_tree::ByteTree;
use super::errors::EioError;
use super::storage::{StorageDir, TempFile};
use super::stream::{ByteTreeStreamReader, ByteTreeWriter};

pub type Record = (u64, Vec<u8>);

#[derive(Debug, Clone)]
pub struct ExternalSorter {
    dir: Arc<StorageDir>,
    run_length: usize,
}

impl ExternalSorter {
    pub fn new(dir: Arc<StorageDir>, run_length: usize) -> Self {
        ExternalSorter {
            dir,
            run_length: run_length.max(1),
        }
    }

    /// Sorts the records by key. Records with equal keys keep their input order.
    pub fn sort<I>(&self, records: I) -> Result<SortedRecords, EioError>
    where
        I: IntoIterator<Item = Result<Record, EioError>>,
    {
        let mut runs = Vec::new();
        let mut buffer = Vec::with_capacity(self.run_length.min(1 << 16));

        for record in records {
            buffer.push(record?);
            if buffer.len() == self.run_length {
                runs.push(self.spill(&mut buffer)?);
            }
        }

        if runs.is_empty() {
            buffer.sort_by_key(|r| r.0);
            return Ok(SortedRecords::Memory(buffer.into_iter()));
        }
        if !buffer.is_empty() {
            runs.push(self.spill(&mut buffer)?);
        }
        debug!(runs = runs.len(), "merging sorted runs");
        MergedRuns::open(runs).map(SortedRecords::Merged)
    }

    fn spill(&self, buffer: &mut Vec<Record>) -> Result<TempFile, EioError> {
        buffer.sort_by_key(|r| r.0);
        let file = self.dir.temp_file();
        let mut writer = ByteTreeWriter::new(file.create()?, buffer.len())?;
        for (key, payload) in buffer.drain(..) {
            writer.write(&ByteTree::node(vec![
                ByteTree::leaf(key.to_be_bytes().to_vec()),
                ByteTree::Leaf(payload),
            ]))?;
        }
        writer.finish()?;
        Ok(file)
    }
}

/// Records in ascending key order.
#[derive(Debug)]
pub enum SortedRecords {
    Memory(std::vec::IntoIter<Record>),
    Merged(MergedRuns),
}

impl Iterator for SortedRecords {
    type Item = Result<Record, EioError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SortedRecords::Memory(records) => records.next().map(Ok),
            SortedRecords::Merged(merged) => merged.next(),
        }
    }
}

#[derive(Debug)]
struct Run {
    _file: TempFile,
    reader: ByteTreeStreamReader<BufReader<File>>,
}

impl Run {
    fn next_record(&mut self) -> Result<Option<Record>, EioError> {
        if self.reader.remaining() == 0 {
            return Ok(None);
        }
        let tree = self.reader.next_tree()?;
        let mut pair = tree.reader();
        let key_bytes = pair.next_child()?.read(8)?;
        let mut key = [0u8; 8];
        key.copy_from_slice(key_bytes);
        let payload = pair.next_child()?.read_all()?.to_vec();
        Ok(Some((u64::from_be_bytes(key), payload)))
    }
}

/// K-way merge over spilled runs.
#[derive(Debug)]
pub struct MergedRuns {
    runs: Vec<Run>,
    heads: Vec<Option<Vec<u8>>>,
    heap: BinaryHeap<Reverse<(u64, usize)>>,
}

impl MergedRuns {
    fn open(files: Vec<TempFile>) -> Result<Self, EioError> {
        let mut runs = Vec::with_capacity(files.len());
        for file in files {
            let reader = ByteTreeStreamReader::new(file.open()?)?;
            runs.push(Run {
                _file: file,
                reader,
            });
        }
        let mut merged = MergedRuns {
            heads: vec![None; runs.len()],
            heap: BinaryHeap::with_capacity(runs.len()),
            runs,
        };
        for index in 0..merged.runs.len() {
            merged.advance(index)?;
        }
        Ok(merged)
    }

    fn advance(&mut self, index: usize) -> Result<(), EioError> {
        if let Some((key, payload)) = self.runs[index].next_record()? {
            self.heads[index] = Some(payload);
            self.heap.push(Reverse((key, index)));
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<Record>, EioError> {
        let Some(Reverse((key, index))) = self.heap.pop() else {
            return Ok(None);
        };
        let payload = self.heads[index]
            .take()
            .ok_or_else(|| EioError::format("Merge head is missing!"))?;
        self.advance(index)?;
        Ok(Some((key, payload)))
    }
}

impl Iterator for MergedRuns {
    type Item = Result<Record, EioError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sorted_keys(run_length: usize, n: u64) -> Result<Vec<Record>, EioError> {
        let dir = StorageDir::create_in(std::env::temp_dir())?;
        let mut keys: Vec<u64> = (0..n).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(7));

        let sorter = ExternalSorter::new(dir, run_length);
        let records = keys.into_iter().map(|k| Ok((k, k.to_le_bytes().to_vec())));
        sorter.sort(records)?.collect()
    }

    #[test]
    fn test_in_memory_run() -> Result<(), EioError> {
        let sorted = sorted_keys(1000, 100)?;
        assert!(sorted.iter().enumerate().all(|(i, r)| r.0 == i as u64));
        Ok(())
    }

    #[test]
    fn test_spilled_runs_merge_in_order() -> Result<(), EioError> {
        let sorted = sorted_keys(7, 100)?;
        assert_eq!(sorted.len(), 100);
        for (i, (key, payload)) in sorted.iter().enumerate() {
            assert_eq!(*key, i as u64);
            assert_eq!(payload, &key.to_le_bytes().to_vec());
        }
        Ok(())
    }
}
