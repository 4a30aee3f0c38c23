//! Fatal errors of a check/repair run.
//!
//! Per-node reduction problems are not here: they are
//! [`ReductionSkip`](crate::reducer::ReductionSkip)s, collected and reported
//! without stopping the run.
use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load {}: {source}", path.display())]
    Load { path: PathBuf, source: CodecError },

    #[error("failed to back up {}: {source}", path.display())]
    Backup { path: PathBuf, source: std::io::Error },

    #[error(
        "failed to save {}: {source}; the original is preserved at {}",
        path.display(),
        backup.display()
    )]
    Write { path: PathBuf, backup: PathBuf, source: CodecError },
}

pub type Result<T> = std::result::Result<T, Error>;
