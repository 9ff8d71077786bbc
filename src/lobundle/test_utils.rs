use crate::commands::BundlePaths;
use crate::config::BundleConfig;
use crate::remote::memory::{listing_html, MemoryRemote};
use crate::resolve::Mirrors;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const STABLE: &str = "https://stable.test/libreoffice/stable/";
pub const ARCHIVE: &str = "https://archive.test/libreoffice/old/";
pub const DAILY: &str = "https://daily.test/daily/master/";

pub const FRESH_VERSION: &str = "24.8.2";

pub fn mirrors() -> Mirrors {
    Mirrors {
        stable: STABLE.to_string(),
        archive: ARCHIVE.to_string(),
        daily: DAILY.to_string(),
    }
}

/// A gzip-compressed tarball holding `(path, content)` entries.
pub fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(enc);

    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, path, content.as_bytes())
            .expect("append tar entry");
    }

    tar.into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Mirror with one stable release (`24.8.2`, plus `24.2.7` as still) that
/// publishes a German language pack and German + English help packs.
///
/// The main archive holds two regular packages and one desktop integration
/// package, which the default configuration excludes.
pub fn stable_fixture() -> MemoryRemote {
    let dir = format!("{}{}/rpm/x86_64/", STABLE, FRESH_VERSION);
    let stem = format!("LibreOffice_{}_Linux_x86-64_rpm", FRESH_VERSION);
    let inner = format!("LibreOffice_{}.1_Linux_x86-64_rpm", FRESH_VERSION);

    let main = format!("{}.tar.gz", stem);
    let langpack = format!("{}_langpack_de.tar.gz", stem);
    let help_de = format!("{}_helppack_de.tar.gz", stem);
    let help_en = format!("{}_helppack_en-US.tar.gz", stem);

    let rpm = |name: &str| format!("{}/RPMS/{}-24.8.2.1-1.x86_64.rpm", inner, name);

    MemoryRemote::new()
        .with_page(STABLE, listing_html(&["24.2.7/", "24.8.2/"]))
        .with_page(
            dir.clone(),
            listing_html(&[
                main.as_str(),
                langpack.as_str(),
                help_de.as_str(),
                help_en.as_str(),
            ]),
        )
        .with_file(
            format!("{}{}", dir, main),
            tarball(&[
                (rpm("libreoffice24.8").as_str(), "core"),
                (rpm("libobasis24.8-writer").as_str(), "writer"),
                (rpm("libreoffice24.8-kde-integration").as_str(), "kde"),
            ]),
        )
        .with_file(
            format!("{}{}", dir, langpack),
            tarball(&[(rpm("libobasis24.8-langpack-de").as_str(), "de")]),
        )
        .with_file(
            format!("{}{}", dir, help_de),
            tarball(&[(rpm("libobasis24.8-help-de").as_str(), "help de")]),
        )
        .with_file(
            format!("{}{}", dir, help_en),
            tarball(&[(rpm("libobasis24.8-help-en-US").as_str(), "help en")]),
        )
}

/// Temporary config, cache and output directories wired to the test mirrors.
pub struct TestEnv {
    // Held so the directory lives as long as the test
    pub _temp_dir: TempDir,
    pub config: BundleConfig,
    pub paths: BundlePaths,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        let config = BundleConfig {
            stable_url: STABLE.to_string(),
            archive_url: ARCHIVE.to_string(),
            daily_url: DAILY.to_string(),
            output_dir: root.join("out"),
            ..BundleConfig::default()
        };
        let paths = BundlePaths {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
        };

        Self {
            _temp_dir: temp_dir,
            config,
            paths,
        }
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir.clone()
    }
}
