//! # AppDir Assembly
//!
//! After the RPM payloads are extracted, the AppDir holds a plain install tree:
//!
//! ```text
//! AppDir/
//! ├── opt/libreoffice24.8/program/soffice
//! ├── opt/libreoffice24.8/share/xdg/startcenter.desktop
//! └── usr/share/icons/hicolor/<N>x<N>/apps/libreoffice24.8-startcenter.png
//! ```
//!
//! appimagetool additionally wants, at the AppDir root, a desktop file, the icon
//! it names, a `.DirIcon` and an executable `AppRun`. [`assemble`] adds them.

use crate::archive::walk_files;
use crate::desktop;
use crate::error::{BundleError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DESKTOP_FILE: &str = "startcenter.desktop";
const ICON_SUFFIX: &str = "startcenter.png";
const LAUNCHER: &str = "program/soffice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirLayout {
    /// Install root relative to the AppDir, e.g. `opt/libreoffice24.8`.
    pub install_root: PathBuf,
    pub desktop_file: PathBuf,
    pub icon: PathBuf,
}

pub fn find_install_root(appdir: &Path) -> Result<PathBuf> {
    let opt = appdir.join("opt");
    let missing = || {
        BundleError::Validation(format!(
            "No installation with {} found under {}",
            LAUNCHER,
            opt.display()
        ))
    };
    if !opt.is_dir() {
        return Err(missing());
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(&opt)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.join(LAUNCHER).is_file())
        .collect();
    candidates.sort();

    let root = candidates.into_iter().next().ok_or_else(missing)?;
    root.strip_prefix(appdir)
        .map(Path::to_path_buf)
        .map_err(|_| missing())
}

/// The start center desktop file, preferring the copy under `share/xdg/`.
pub fn find_desktop_file(appdir: &Path) -> Result<PathBuf> {
    let found: Vec<PathBuf> = walk_files(appdir)?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n == DESKTOP_FILE))
        .filter(|p| p.parent() != Some(appdir))
        .collect();

    found
        .iter()
        .find(|p| p.to_string_lossy().contains("share/xdg/"))
        .or_else(|| found.first())
        .cloned()
        .ok_or_else(|| {
            BundleError::Validation(format!("No {} found in {}", DESKTOP_FILE, appdir.display()))
        })
}

/// Pixel size of an icon stored under `hicolor/<N>x<N>/apps/`.
fn icon_size(path: &Path) -> Option<u32> {
    let size_dir = path.parent()?.parent()?.file_name()?.to_str()?;
    let (w, h) = size_dir.split_once('x')?;
    let w: u32 = w.parse().ok()?;
    let h: u32 = h.parse().ok()?;
    (w == h).then_some(w)
}

/// The largest start center icon in the tree.
pub fn find_icon(appdir: &Path) -> Result<PathBuf> {
    let found: Vec<PathBuf> = walk_files(appdir)?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(ICON_SUFFIX))
        })
        .filter(|p| p.parent() != Some(appdir))
        .collect();

    let sized = found
        .iter()
        .filter_map(|p| icon_size(p).map(|size| (size, p)))
        .max_by_key(|(size, _)| *size)
        .map(|(_, p)| p);

    sized
        .or_else(|| found.first())
        .cloned()
        .ok_or_else(|| {
            BundleError::Validation(format!("No *{} found in {}", ICON_SUFFIX, appdir.display()))
        })
}

pub fn apprun_script(install_root: &Path) -> String {
    format!(
        "#!/bin/sh\nHERE=\"$(dirname \"$(readlink -f \"$0\")\")\"\nexec \"$HERE/{}/{}\" \"$@\"\n",
        install_root.display(),
        LAUNCHER
    )
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Adds the root-level files appimagetool requires.
pub fn assemble(appdir: &Path, version: &str) -> Result<AppDirLayout> {
    let install_root = find_install_root(appdir)?;
    let desktop_source = find_desktop_file(appdir)?;
    let icon_source = find_icon(appdir)?;
    debug!(
        install_root = %install_root.display(),
        desktop = %desktop_source.display(),
        icon = %icon_source.display(),
        "assembling AppDir"
    );

    let icon_name = icon_source
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| BundleError::Validation("Icon has no file name".to_string()))?;
    let icon_stem = icon_source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let icon = appdir.join(&icon_name);
    fs::copy(&icon_source, &icon)?;
    fs::copy(&icon_source, appdir.join(".DirIcon"))?;

    let entry = fs::read_to_string(&desktop_source)?;
    let desktop_file = appdir.join(DESKTOP_FILE);
    fs::write(&desktop_file, desktop::rewrite(&entry, &icon_stem, version)?)?;

    let apprun = appdir.join("AppRun");
    fs::write(&apprun, apprun_script(&install_root))?;
    make_executable(&apprun)?;

    Ok(AppDirLayout {
        install_root,
        desktop_file,
        icon,
    })
}
