use std::io;
use thiserror::Error;

/// Everything that can stop a scan run.
///
/// `NotFound` is user-correctable (a typo'd app id), the rest are genuine
/// failures. None of these are retried; a failed transfer ends the run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not find app `{0}` in the index")]
    NotFound(String),

    #[error("download failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("cache I/O failed: {0}")]
    Filesystem(#[from] io::Error),

    #[error("malformed index document: {0}")]
    Parse(String),

    #[error("analyzer failed: {stderr}")]
    Analyzer { code: Option<i32>, stderr: String },
}

impl ScanError {
    /// Process exit code to surface for this failure.
    ///
    /// When the external analyzer itself failed, its own exit code is
    /// propagated so calling scripts can tell "no trackers found" (exit 0)
    /// apart from "analysis could not run".
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Analyzer { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
