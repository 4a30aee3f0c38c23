//! Timestamped copies taken before any destructive write.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// `<file>.backup_<YYYYMMDDHHMMSS>` next to the original.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".backup_{}", now.format(TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

pub fn create_backup(path: &Path) -> std::io::Result<PathBuf> {
    let target = backup_path(path, Local::now());
    fs::copy(path, &target)?;
    info!("backed up {} to {}", path.display(), target.display());
    Ok(target)
}
