//! Backup → reduce → save, in that order.
use std::path::{Path, PathBuf};

use log::info;

use crate::backup::create_backup;
use crate::codec::{NbtFile, write_tree};
use crate::error::{Error, Result};
use crate::reducer::{ReductionOutcome, apply_reductions};
use crate::walker::Analysis;

#[derive(Debug)]
pub struct RepairOutcome {
    pub backup: PathBuf,
    pub reduction: ReductionOutcome,
    /// False when no splice succeeded and the file was left untouched.
    pub written: bool,
}

/// Reduce the nodes flagged by `analysis` (taken on `file` as loaded) and
/// save over `path`. The backup completes before the first splice; the save
/// is the last step and only happens if at least one splice succeeded.
pub fn repair(path: &Path, file: &mut NbtFile, analysis: &Analysis) -> Result<RepairOutcome> {
    let backup = create_backup(path).map_err(|source| Error::Backup { path: path.to_owned(), source })?;

    let reduction = apply_reductions(&mut file.root, &analysis.problematic);
    info!(
        "reduced {} of {} flagged structures",
        reduction.applied,
        analysis.problematic.len()
    );
    if reduction.applied == 0 {
        return Ok(RepairOutcome { backup, reduction, written: false });
    }

    write_tree(file, path).map_err(|source| Error::Write {
        path: path.to_owned(),
        backup: backup.clone(),
        source,
    })?;
    Ok(RepairOutcome { backup, reduction, written: true })
}
