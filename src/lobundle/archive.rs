use crate::error::{BundleError, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Unpacks a `.tar.gz` vendor archive into `dest`, returning the number of entries.
///
/// Entries with absolute paths or `..` components are rejected.
pub fn unpack_tarball(path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(path)?;
    unpack_reader(file, dest).map_err(|e| match e {
        BundleError::Io(io) => BundleError::Io(std::io::Error::new(
            io.kind(),
            format!("{}: {}", path.display(), io),
        )),
        other => other,
    })
}

pub fn unpack_reader<R: Read>(reader: R, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive.set_preserve_permissions(true);

    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        if !is_contained(&entry_path) {
            return Err(BundleError::Validation(format!(
                "Archive entry escapes destination: {}",
                entry_path.display()
            )));
        }
        entry.unpack_in(dest)?;
        count += 1;
    }

    debug!(dest = %dest.display(), entries = count, "unpacked archive");
    Ok(count)
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Every regular file below `dir`, sorted by path. Symlinks are not followed.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                found.push(entry.path());
            }
        }
    }

    found.sort();
    Ok(found)
}

/// All `*.rpm` files below `dir`, sorted by path.
pub fn collect_packages(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(walk_files(dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "rpm"))
        .collect())
}

pub fn is_excluded(file_name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && file_name.contains(p.as_str()))
}

/// Splits packages into (install, skipped) by the exclusion patterns.
pub fn filter_packages(
    packages: Vec<PathBuf>,
    patterns: &[String],
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    packages.into_iter().partition(|p| {
        let name = p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        !is_excluded(&name, patterns)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tarball;

    #[test]
    fn unpacks_vendor_layout() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("LibreOffice_24.8.2_Linux_x86-64_rpm.tar.gz");
        fs::write(
            &archive,
            tarball(&[
                ("LibreOffice_24.8.2.1_Linux_x86-64_rpm/RPMS/libreoffice24.8-24.8.2.1-1.x86_64.rpm", "core"),
                ("LibreOffice_24.8.2.1_Linux_x86-64_rpm/RPMS/libobasis24.8-writer-24.8.2.1-1.x86_64.rpm", "writer"),
                ("LibreOffice_24.8.2.1_Linux_x86-64_rpm/readmes/README_en-US", "read me"),
            ]),
        )
        .unwrap();

        let dest = dir.path().join("unpacked");
        assert_eq!(unpack_tarball(&archive, &dest).unwrap(), 3);

        let packages = collect_packages(&dest).unwrap();
        let names: Vec<String> = packages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "libobasis24.8-writer-24.8.2.1-1.x86_64.rpm",
                "libreoffice24.8-24.8.2.1-1.x86_64.rpm",
            ]
        );
    }

    #[test]
    fn rejects_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, b"this is not gzip").unwrap();
        assert!(unpack_tarball(&archive, &dir.path().join("out")).is_err());
    }

    #[test]
    fn contained_paths() {
        assert!(is_contained(Path::new("a/b/c.rpm")));
        assert!(is_contained(Path::new("./a")));
        assert!(!is_contained(Path::new("../etc/passwd")));
        assert!(!is_contained(Path::new("/etc/passwd")));
        assert!(!is_contained(Path::new("a/../../b")));
    }

    #[test]
    fn excludes_integration_packages() {
        let patterns = vec!["-kde-integration".to_string(), "-onlineupdate".to_string()];
        assert!(is_excluded(
            "libreoffice24.8-kde-integration-24.8.2.1-1.x86_64.rpm",
            &patterns
        ));
        assert!(!is_excluded("libreoffice24.8-24.8.2.1-1.x86_64.rpm", &patterns));
        assert!(!is_excluded("anything.rpm", &[String::new()]));
    }

    #[test]
    fn filter_partitions_packages() {
        let patterns = vec!["-gnome-integration".to_string()];
        let (keep, skip) = filter_packages(
            vec![
                PathBuf::from("RPMS/libreoffice24.8-gnome-integration.rpm"),
                PathBuf::from("RPMS/libobasis24.8-core.rpm"),
            ],
            &patterns,
        );
        assert_eq!(keep, vec![PathBuf::from("RPMS/libobasis24.8-core.rpm")]);
        assert_eq!(skip.len(), 1);
    }
}
