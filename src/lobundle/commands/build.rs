use crate::appdir;
use crate::archive::{collect_packages, filter_packages, unpack_tarball};
use crate::checksum::write_sha256;
use crate::commands::{BuildReport, BundlePaths, CmdMessage, CmdResult};
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::model::BuildOptions;
use crate::remote::Remote;
use crate::resolve::{resolve, Mirrors, ResolvedBuild};
use crate::tools::{PackageOptions, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub fn run<R: Remote, T: Toolchain>(
    remote: &R,
    tools: &T,
    config: &BundleConfig,
    paths: &BundlePaths,
    options: &BuildOptions,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    // 1. Resolve the release and the packs to merge
    let resolved = resolve(
        remote,
        &Mirrors::from_config(config),
        &options.query,
        options.arch,
        &options.languages,
        options.help,
    )?;
    for warning in &resolved.warnings {
        result.add_message(CmdMessage::warning(warning));
    }

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let output = output_dir.join(resolved.output_name());

    if output.exists() && !options.force {
        result.add_message(CmdMessage::info(format!(
            "{} already exists, skipping (use --force to rebuild)",
            output.display()
        )));
        result.builds.push(BuildReport {
            release: resolved.release,
            output,
            sha256: None,
            skipped: true,
            downloaded_bytes: 0,
            skipped_packages: 0,
        });
        return Ok(result);
    }

    // 2. Download (or reuse) the archives
    let (archives, downloaded_bytes) = fetch_archives(
        remote,
        &resolved,
        &paths.downloads_dir(),
        options.refresh,
        &mut result,
    )?;

    // 3. Unpack, install and package in a private work directory
    let work = paths.work_dir().join(format!("build-{}", Uuid::new_v4()));
    let outcome = build_in(&work, tools, config, &resolved, &archives, &output, options);

    if options.keep_workdir {
        result.add_message(CmdMessage::info(format!(
            "Work directory kept at {}",
            work.display()
        )));
    } else if let Err(e) = fs::remove_dir_all(&work) {
        if work.exists() {
            warn!(work = %work.display(), error = %e, "could not remove work directory");
        }
    }
    let skipped_packages = outcome?;

    // 4. Checksum
    let sha256 = write_sha256(&output)?;
    info!(output = %output.display(), "bundle written");

    result.add_message(CmdMessage::success(format!("Built {}", output.display())));
    result.builds.push(BuildReport {
        release: resolved.release,
        output,
        sha256: Some(sha256),
        skipped: false,
        downloaded_bytes,
        skipped_packages,
    });
    Ok(result)
}

fn fetch_archives<R: Remote>(
    remote: &R,
    resolved: &ResolvedBuild,
    downloads: &Path,
    refresh: bool,
    result: &mut CmdResult,
) -> Result<(Vec<PathBuf>, u64)> {
    fs::create_dir_all(downloads)?;

    let mut paths = Vec::new();
    let mut total = 0;
    for archive in resolved.archives() {
        let dest = downloads.join(&archive.file_name);
        let cached = fs::metadata(&dest)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);

        if cached && !refresh {
            result.add_message(CmdMessage::info(format!(
                "Using cached {}",
                archive.file_name
            )));
        } else {
            info!(url = %archive.url, "downloading");
            let bytes = remote.download(&archive.url, &dest)?;
            total += bytes;
            result.add_message(CmdMessage::info(format!(
                "Downloaded {} ({} MiB)",
                archive.file_name,
                bytes / (1024 * 1024)
            )));
        }
        paths.push(dest);
    }
    Ok((paths, total))
}

/// Returns the number of packages left out of the bundle.
fn build_in<T: Toolchain>(
    work: &Path,
    tools: &T,
    config: &BundleConfig,
    resolved: &ResolvedBuild,
    archives: &[PathBuf],
    output: &Path,
    options: &BuildOptions,
) -> Result<usize> {
    let unpacked = work.join("unpacked");
    let appdir = work.join("AppDir");
    fs::create_dir_all(&appdir)?;

    for (i, archive) in archives.iter().enumerate() {
        unpack_tarball(archive, &unpacked.join(i.to_string()))?;
    }

    let packages = collect_packages(&unpacked)?;
    if packages.is_empty() {
        return Err(BundleError::Validation(
            "No RPM packages found in the downloaded archives".to_string(),
        ));
    }
    let (install, skipped) = filter_packages(packages, &config.exclude_packages);
    info!(
        install = install.len(),
        skipped = skipped.len(),
        "extracting packages"
    );

    for rpm in &install {
        tools.extract_rpm(rpm, &appdir)?;
    }

    appdir::assemble(&appdir, &resolved.release.version)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    if output.exists() {
        fs::remove_file(output)?;
    }

    let package_options = PackageOptions {
        arch: resolved.release.arch,
        sign: options.sign,
        sign_key: options.sign_key.clone().or_else(|| config.sign_key.clone()),
        update_info: options.update_info.clone(),
    };
    tools.package(&appdir, output, &package_options)?;

    if !output.is_file() {
        return Err(BundleError::tool(
            &config.appimagetool,
            format!("did not produce {}", output.display()),
        ));
    }
    Ok(skipped.len())
}
