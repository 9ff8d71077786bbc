use crate::commands::{BundlePaths, CachedArchive, CmdMessage, CmdResult};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fs;

pub fn list(paths: &BundlePaths) -> Result<CmdResult> {
    let downloads = paths.downloads_dir();
    let mut cached = Vec::new();

    if downloads.is_dir() {
        for entry in fs::read_dir(&downloads)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = metadata.modified()?.into();
            cached.push(CachedArchive {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified,
            });
        }
    }
    cached.sort_by(|a, b| a.name.cmp(&b.name));

    let mut result = CmdResult::default();
    if cached.is_empty() {
        result.add_message(CmdMessage::info("No cached archives."));
    }
    Ok(result.with_cached(cached))
}

/// Removes downloaded archives, partial downloads and leftover work directories.
pub fn clean(paths: &BundlePaths) -> Result<CmdResult> {
    let mut removed = 0;
    let downloads = paths.downloads_dir();
    if downloads.is_dir() {
        for entry in fs::read_dir(&downloads)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            removed += 1;
        }
    }

    let work = paths.work_dir();
    let mut work_dirs = 0;
    if work.is_dir() {
        work_dirs = fs::read_dir(&work)?.count();
        fs::remove_dir_all(&work)?;
    }

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Removed {} cached archive(s) and {} work director{}.",
        removed,
        work_dirs,
        if work_dirs == 1 { "y" } else { "ies" }
    )));
    Ok(result)
}
