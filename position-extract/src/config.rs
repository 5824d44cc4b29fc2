use std::path::PathBuf;

use serde::Serialize;

use crate::batch_writer::DEFAULT_BATCH_SIZE;
use crate::error::ExtractError;

pub const DEFAULT_EXTENSION: &str = "pgn";
pub const DEFAULT_OUTPUT_DIR: &str = "./training-batches/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractConfig {
    /// Corpus root: a directory searched recursively, or a single file.
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    /// Fixed base seed. `None` draws one per run.
    pub seed: Option<u64>,
    /// File extension, without the dot, that marks a game record.
    pub extension: String,
    /// Worker threads; `None` uses every core.
    pub jobs: Option<usize>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
            extension: DEFAULT_EXTENSION.to_string(),
            jobs: None,
        }
    }
}

impl ExtractConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.batch_size == 0 {
            return Err(ExtractError::Argument(
                "batch size must be at least 1".to_string(),
            ));
        }
        let extension = self.normalized_extension();
        if extension.is_empty() || extension.contains(['/', '*']) {
            return Err(ExtractError::Argument(format!(
                "invalid file extension '{}'",
                self.extension
            )));
        }
        if self.jobs == Some(0) {
            return Err(ExtractError::Argument(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Extension with any leading dot removed.
    pub fn normalized_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}
