use std::path::PathBuf;

use crate::containers::SvType;

/// Fatal conditions raised while calling structural variants.
///
/// Candidates dropped by the cluster filter are not errors, see
/// [`crate::cluster_filter::DropReason`].
#[derive(Debug, thiserror::Error)]
pub enum CallerError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("signature input is not sorted: {0}")]
    InputOrdering(String),

    #[error("malformed signature input: {0}")]
    MalformedInput(String),

    #[error("failed to read {path}: {source}")]
    InputRead {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("alignment file error: {0}")]
    Alignment(String),

    #[error("failed to process partition {chrom} {sv_type}: {reason}")]
    PartitionFailure {
        chrom: String,
        sv_type: SvType,
        reason: String,
    },

    #[error("failed to write {path}: {source}")]
    OutputWrite {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl CallerError {
    pub fn input_read(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::InputRead {
            source,
            path: path.into(),
        }
    }

    pub fn output_write(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::OutputWrite {
            source,
            path: path.into(),
        }
    }

    /// Process exit code reported by the binary for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CallerError::Configuration(_) => exitcode::CONFIG,
            CallerError::InputOrdering(_) | CallerError::MalformedInput(_) => exitcode::DATAERR,
            CallerError::InputRead { .. } | CallerError::Alignment(_) => exitcode::NOINPUT,
            CallerError::PartitionFailure { .. } => exitcode::SOFTWARE,
            CallerError::OutputWrite { .. } => exitcode::IOERR,
        }
    }
}
