//! # External Tools
//!
//! Two steps of a build are delegated to programs outside lobundle: unpacking
//! RPM payloads (`rpm2cpio | cpio`) and wrapping the AppDir (`appimagetool`).
//! Both sit behind the [`Toolchain`] trait.
//!
//! - [`system::SystemToolchain`]: runs the real programs
//! - [`recording::RecordingToolchain`]: records calls and fabricates their
//!   effects, for tests

use crate::error::Result;
use crate::model::Arch;
use std::path::Path;

#[cfg(any(test, feature = "test_utils"))]
pub mod recording;
pub mod system;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageOptions {
    pub arch: Arch,
    pub sign: bool,
    pub sign_key: Option<String>,
    /// Embedded update information, e.g. `zsync|https://…/LibreOffice-fresh.basic-x86_64.AppImage.zsync`
    pub update_info: Option<String>,
}

pub trait Toolchain {
    /// Extract the payload of one RPM package into `dest`.
    fn extract_rpm(&self, rpm: &Path, dest: &Path) -> Result<()>;

    /// Turn `appdir` into the bundle at `output`.
    fn package(&self, appdir: &Path, output: &Path, options: &PackageOptions) -> Result<()>;
}
