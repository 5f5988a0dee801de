//! Filesystem boundary: input checking, workbook ingestion and result
//! rendering. The optimisation core itself never touches a file.

pub mod files;
pub mod report;
pub mod workbook;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("input file not found: {0}")]
    InputFileMissing(PathBuf),

    #[error("invalid file type for {path}: expected {expected}")]
    InvalidFileType { path: PathBuf, expected: &'static str },

    #[error("cannot prepare output path {path}: {reason}")]
    OutputPath { path: PathBuf, reason: String },

    #[error("workbook format error in {path}: {reason}")]
    WorkbookFormat { path: PathBuf, reason: String },

    #[error("failed to write report {path}: {reason}")]
    Report { path: PathBuf, reason: String },
}
