use super::{PackageOptions, Toolchain};
use crate::error::{BundleError, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

pub const FAKE_INSTALL_DIR: &str = "opt/libreoffice24.8";

const FAKE_DESKTOP: &str = "[Desktop Entry]
Version=1.0
Icon=libreoffice24.8-startcenter
Type=Application
Exec=libreoffice24.8 %U
TryExec=libreoffice24.8
Name=LibreOffice 24.8
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ExtractRpm { rpm: PathBuf, dest: PathBuf },
    Package {
        appdir: PathBuf,
        output: PathBuf,
        options: PackageOptions,
    },
}

/// Records tool invocations and fabricates a small installation tree.
///
/// Every extracted package contributes the same tree: a launcher, the start
/// center desktop file and two icon sizes, which is what the AppDir assembly
/// looks for.
#[derive(Default)]
pub struct RecordingToolchain {
    calls: RefCell<Vec<ToolCall>>,
    skip_launcher: bool,
    fail_package: bool,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracted packages never contain `program/soffice`.
    pub fn without_launcher(mut self) -> Self {
        self.skip_launcher = true;
        self
    }

    pub fn failing_package(mut self) -> Self {
        self.fail_package = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.borrow().clone()
    }

    pub fn extracted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ToolCall::ExtractRpm { rpm, .. } => rpm
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    fn fabricate(&self, dest: &Path) -> Result<()> {
        let install = dest.join(FAKE_INSTALL_DIR);
        if !self.skip_launcher {
            fs::create_dir_all(install.join("program"))?;
            fs::write(install.join("program/soffice"), "#!/bin/sh\n")?;
        }
        fs::create_dir_all(install.join("share/xdg"))?;
        fs::write(install.join("share/xdg/startcenter.desktop"), FAKE_DESKTOP)?;

        for size in ["32x32", "128x128"] {
            let apps = dest.join(format!("usr/share/icons/hicolor/{}/apps", size));
            fs::create_dir_all(&apps)?;
            fs::write(apps.join("libreoffice24.8-startcenter.png"), size)?;
        }
        Ok(())
    }
}

impl Toolchain for RecordingToolchain {
    fn extract_rpm(&self, rpm: &Path, dest: &Path) -> Result<()> {
        self.calls.borrow_mut().push(ToolCall::ExtractRpm {
            rpm: rpm.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        self.fabricate(dest)
    }

    fn package(&self, appdir: &Path, output: &Path, options: &PackageOptions) -> Result<()> {
        self.calls.borrow_mut().push(ToolCall::Package {
            appdir: appdir.to_path_buf(),
            output: output.to_path_buf(),
            options: options.clone(),
        });
        if self.fail_package {
            return Err(BundleError::tool("appimagetool", "exited with exit status: 1"));
        }
        fs::write(output, format!("AppImage of {}", appdir.display()))?;
        Ok(())
    }
}
