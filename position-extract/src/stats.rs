use serde::Serialize;

use crate::batch_writer::BatchRecord;
use crate::config::ExtractConfig;

/// What happened to one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// At least one ply validated and was sampled.
    Used,
    /// No move token or no result marker.
    Malformed,
    /// The first move token was already illegal.
    NoValidMoves,
    /// The file could not be read.
    Unreadable,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub files_used: u64,
    pub files_malformed: u64,
    pub files_no_valid_moves: u64,
    pub files_unreadable: u64,
    pub moves_tokenized: u64,
    pub moves_validated: u64,
    pub samples_drawn: u64,
    pub samples_near_capture: u64,
    pub examples_emitted: u64,
}

#[derive(Serialize)]
pub struct FileCounts {
    pub total: u64,
    pub used: u64,
    pub malformed: u64,
    pub no_valid_moves: u64,
    pub unreadable: u64,
}

#[derive(Serialize)]
pub struct SampleCounts {
    pub moves_tokenized: u64,
    pub moves_validated: u64,
    pub drawn: u64,
    pub near_capture: u64,
    pub emitted: u64,
}

#[derive(Serialize)]
pub struct RunSummary<'a> {
    pub config: &'a ExtractConfig,
    pub seed: u64,
    pub files: FileCounts,
    pub samples: SampleCounts,
    pub batches: &'a [BatchRecord],
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_status(&mut self, status: GameStatus) {
        let counter = match status {
            GameStatus::Used => &mut self.files_used,
            GameStatus::Malformed => &mut self.files_malformed,
            GameStatus::NoValidMoves => &mut self.files_no_valid_moves,
            GameStatus::Unreadable => &mut self.files_unreadable,
        };
        *counter += 1;
    }

    pub fn files_seen(&self) -> u64 {
        self.files_used + self.files_malformed + self.files_no_valid_moves + self.files_unreadable
    }

    pub fn merge(&mut self, other: &Statistics) {
        self.files_used += other.files_used;
        self.files_malformed += other.files_malformed;
        self.files_no_valid_moves += other.files_no_valid_moves;
        self.files_unreadable += other.files_unreadable;
        self.moves_tokenized += other.moves_tokenized;
        self.moves_validated += other.moves_validated;
        self.samples_drawn += other.samples_drawn;
        self.samples_near_capture += other.samples_near_capture;
        self.examples_emitted += other.examples_emitted;
    }

    pub fn to_output<'a>(
        &self,
        config: &'a ExtractConfig,
        seed: u64,
        batches: &'a [BatchRecord],
    ) -> RunSummary<'a> {
        RunSummary {
            config,
            seed,
            files: FileCounts {
                total: self.files_seen(),
                used: self.files_used,
                malformed: self.files_malformed,
                no_valid_moves: self.files_no_valid_moves,
                unreadable: self.files_unreadable,
            },
            samples: SampleCounts {
                moves_tokenized: self.moves_tokenized,
                moves_validated: self.moves_validated,
                drawn: self.samples_drawn,
                near_capture: self.samples_near_capture,
                emitted: self.examples_emitted,
            },
            batches,
        }
    }
}
