use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error reading '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error writing '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive error writing '{path}': {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("No .{extension} files found under {root}")]
    NoInputFiles { root: PathBuf, extension: String },

    #[error("Summary error: {0}")]
    Summary(String),
}

impl ExtractError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error. An empty corpus is reported apart
    /// from genuine failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoInputFiles { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_input_files_has_distinct_exit_code() {
        let err = ExtractError::NoInputFiles {
            root: PathBuf::from("/data/games"),
            extension: "pgn".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "No .pgn files found under /data/games");
    }

    #[test]
    fn test_write_failure_exit_code() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExtractError::write("/out/to_move_0.npy", source);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("to_move_0.npy"));
    }
}
