use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be loaded. Always recoverable: the caller falls
/// back to an empty dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file configured (pass --data, set JGP_DATA_PATH, or set data_path in the config file)")]
    NotConfigured,

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0} (expected xlsx, csv, json or parquet)")]
    UnsupportedFormat(String),

    #[error("malformed file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("the sheet has no header row")]
    NoHeader,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl LoadError {
    pub(crate) fn malformed(path: &std::path::Path, reason: impl ToString) -> Self {
        LoadError::Malformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
