use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::encoder::CsrBuilder;
use crate::error::ExtractError;
use crate::npy::{write_csr_npz, write_f64_array, write_i64_array, write_npy_file};
use crate::sampler::TrainingExample;

pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Three row-aligned columns of examples. Every push touches all three, so
/// their lengths never diverge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    encodings: CsrBuilder,
    to_move: Vec<u8>,
    outcomes: Vec<f64>,
}

impl Batch {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            encodings: CsrBuilder::with_capacity(rows),
            to_move: Vec::with_capacity(rows),
            outcomes: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, example: &TrainingExample) {
        self.encodings.push_row(&example.features);
        self.to_move.push(example.to_move);
        self.outcomes.push(example.outcome);
    }

    pub fn len(&self) -> usize {
        self.to_move.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_move.is_empty()
    }

    pub fn encodings(&self) -> &CsrBuilder {
        &self.encodings
    }

    pub fn to_move(&self) -> &[u8] {
        &self.to_move
    }

    pub fn outcomes(&self) -> &[f64] {
        &self.outcomes
    }

    fn clear(&mut self) {
        self.encodings.clear();
        self.to_move.clear();
        self.outcomes.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchRecord {
    pub index: usize,
    pub rows: usize,
}

/// Persists one numbered batch. Writes of the three artifacts are not
/// atomic as a group.
pub trait BatchSink {
    fn write_batch(&mut self, index: usize, batch: &Batch) -> Result<(), ExtractError>;
}

/// Accumulates examples and hands them to the sink in groups of exactly
/// `batch_size`, numbering batches 0, 1, 2, ... with no gaps.
pub struct BatchWriter<S: BatchSink> {
    sink: S,
    batch_size: usize,
    pending: Batch,
    next_index: usize,
    written: Vec<BatchRecord>,
}

impl<S: BatchSink> BatchWriter<S> {
    pub fn new(sink: S, batch_size: usize) -> Result<Self, ExtractError> {
        if batch_size == 0 {
            return Err(ExtractError::Argument(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sink,
            batch_size,
            pending: Batch::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE)),
            next_index: 0,
            written: Vec::new(),
        })
    }

    /// Adds one example, flushing if that fills the batch.
    pub fn append(&mut self, example: &TrainingExample) -> Result<(), ExtractError> {
        self.pending.push(example);
        self.flush_if_full()?;
        Ok(())
    }

    /// Flushes when exactly `batch_size` rows are pending. Returns the
    /// flushed batch, if any.
    pub fn flush_if_full(&mut self) -> Result<Option<BatchRecord>, ExtractError> {
        if self.pending.len() >= self.batch_size {
            self.flush().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Flushes whatever is pending, whatever its size. Does nothing when
    /// nothing is pending.
    pub fn flush_remainder(&mut self) -> Result<Option<BatchRecord>, ExtractError> {
        if self.pending.is_empty() {
            Ok(None)
        } else {
            self.flush().map(Some)
        }
    }

    fn flush(&mut self) -> Result<BatchRecord, ExtractError> {
        let record = BatchRecord {
            index: self.next_index,
            rows: self.pending.len(),
        };
        self.sink.write_batch(record.index, &self.pending)?;
        log::info!("Saved batch {} ({} rows)", record.index, record.rows);

        self.next_index += 1;
        self.pending.clear();
        self.written.push(record);
        Ok(record)
    }

    pub fn pending_rows(&self) -> usize {
        self.pending.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batches(&self) -> &[BatchRecord] {
        &self.written
    }

    /// Flushes the remainder and returns the sink with the batch list.
    pub fn finish(mut self) -> Result<(S, Vec<BatchRecord>), ExtractError> {
        self.flush_remainder()?;
        Ok((self.sink, self.written))
    }
}

/// Writes `encoding_<k>.npz`, `to_move_<k>.npy` and `outcomes_<k>.npy`
/// into one directory.
pub struct NpyBatchStore {
    output_dir: PathBuf,
}

impl NpyBatchStore {
    pub fn new(output_dir: &Path) -> Result<Self, ExtractError> {
        fs::create_dir_all(output_dir).map_err(|e| ExtractError::write(output_dir, e))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn artifact_paths(&self, index: usize) -> [PathBuf; 3] {
        artifact_filenames(index).map(|name| self.output_dir.join(name))
    }
}

pub fn artifact_filenames(index: usize) -> [String; 3] {
    [
        format!("encoding_{index}.npz"),
        format!("to_move_{index}.npy"),
        format!("outcomes_{index}.npy"),
    ]
}

impl BatchSink for NpyBatchStore {
    fn write_batch(&mut self, index: usize, batch: &Batch) -> Result<(), ExtractError> {
        let [encoding_path, to_move_path, outcomes_path] = self.artifact_paths(index);

        write_csr_npz(&encoding_path, batch.encodings())?;
        write_npy_file(&to_move_path, |w| {
            write_i64_array(w, batch.len(), batch.to_move().iter().map(|&v| i64::from(v)))
        })?;
        write_npy_file(&outcomes_path, |w| write_f64_array(w, batch.outcomes()))
    }
}

/// Keeps flushed batches in memory.
#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    pub batches: Vec<(usize, Batch)>,
}

impl BatchSink for MemoryBatchStore {
    fn write_batch(&mut self, index: usize, batch: &Batch) -> Result<(), ExtractError> {
        self.batches.push((index, batch.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureRow;
    use tempfile::tempdir;

    fn example(to_move: u8, outcome: f64) -> TrainingExample {
        TrainingExample {
            features: FeatureRow::default(),
            to_move,
            outcome,
        }
    }

    struct FailingSink;

    impl BatchSink for FailingSink {
        fn write_batch(&mut self, index: usize, _batch: &Batch) -> Result<(), ExtractError> {
            Err(ExtractError::write(
                format!("encoding_{index}.npz"),
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(BatchWriter::new(MemoryBatchStore::default(), 0).is_err());
    }

    #[test]
    fn test_flushes_at_exact_size() {
        let mut writer = BatchWriter::new(MemoryBatchStore::default(), 3).expect("writer");
        writer.append(&example(1, 1.0)).expect("append");
        writer.append(&example(0, 1.0)).expect("append");
        assert_eq!(writer.pending_rows(), 2);
        assert!(writer.batches().is_empty());

        writer.append(&example(1, 1.0)).expect("append");
        assert_eq!(writer.pending_rows(), 0);
        assert_eq!(writer.batches(), &[BatchRecord { index: 0, rows: 3 }]);
    }

    #[test]
    fn test_remainder_flushed_under_next_index() {
        let mut writer = BatchWriter::new(MemoryBatchStore::default(), 4).expect("writer");
        for i in 0..10 {
            writer.append(&example((i % 2) as u8, 0.5)).expect("append");
        }
        let (store, records) = writer.finish().expect("finish");

        let rows: Vec<usize> = records.iter().map(|r| r.rows).collect();
        let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
        assert_eq!(rows, vec![4, 4, 2]);
        assert_eq!(indices, vec![0, 1, 2]);

        for (index, batch) in &store.batches {
            assert_eq!(batch.encodings().rows(), batch.len(), "batch {index}");
            assert_eq!(batch.to_move().len(), batch.len(), "batch {index}");
            assert_eq!(batch.outcomes().len(), batch.len(), "batch {index}");
        }
    }

    #[test]
    fn test_empty_remainder_not_flushed() {
        let mut writer = BatchWriter::new(MemoryBatchStore::default(), 2).expect("writer");
        writer.append(&example(1, 0.0)).expect("append");
        writer.append(&example(0, 0.0)).expect("append");
        let (store, records) = writer.finish().expect("finish");
        assert_eq!(records.len(), 1);
        assert_eq!(store.batches.len(), 1);
    }

    #[test]
    fn test_no_examples_no_batches() {
        let writer = BatchWriter::new(MemoryBatchStore::default(), 2).expect("writer");
        let (store, records) = writer.finish().expect("finish");
        assert!(records.is_empty());
        assert!(store.batches.is_empty());
    }

    #[test]
    fn test_two_games_of_sixty_thousand() {
        let mut writer =
            BatchWriter::new(MemoryBatchStore::default(), DEFAULT_BATCH_SIZE).expect("writer");
        for game in 0..2 {
            for _ in 0..60_000 {
                writer.append(&example(game, 1.0)).expect("append");
            }
        }
        let (store, records) = writer.finish().expect("finish");

        assert_eq!(
            records,
            vec![
                BatchRecord { index: 0, rows: 100_000 },
                BatchRecord { index: 1, rows: 20_000 },
            ]
        );
        assert_eq!(store.batches[0].1.len(), 100_000);
        assert_eq!(store.batches[1].1.len(), 20_000);
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut writer = BatchWriter::new(FailingSink, 1).expect("writer");
        let err = writer.append(&example(1, 1.0)).expect_err("flush fails");
        assert!(matches!(err, ExtractError::Write { .. }));
        assert!(writer.batches().is_empty());
    }

    #[test]
    fn test_npy_store_writes_three_artifacts() {
        let dir = tempdir().expect("create tempdir");
        let store = NpyBatchStore::new(&dir.path().join("out")).expect("store");
        let mut writer = BatchWriter::new(store, 2).expect("writer");

        for i in 0..3 {
            writer.append(&example(i % 2, 0.5)).expect("append");
        }
        let (store, records) = writer.finish().expect("finish");
        assert_eq!(records.len(), 2);

        for index in 0..2 {
            for path in store.artifact_paths(index) {
                assert!(path.exists(), "{} missing", path.display());
            }
        }
        assert!(!store.output_dir().join("encoding_2.npz").exists());

        let outcomes = fs::read(store.output_dir().join("outcomes_1.npy")).expect("read");
        assert_eq!(outcomes.len() % 64, 8);
    }

    #[test]
    fn test_artifact_filenames() {
        assert_eq!(
            artifact_filenames(7),
            ["encoding_7.npz", "to_move_7.npy", "outcomes_7.npy"]
        );
    }
}
