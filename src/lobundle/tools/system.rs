use super::{PackageOptions, Toolchain};
use crate::error::{BundleError, Result};
use crate::model::Arch;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use tracing::debug;

pub struct SystemToolchain {
    appimagetool: String,
    rpm2cpio: String,
    cpio: String,
}

impl SystemToolchain {
    pub fn new(appimagetool: impl Into<String>) -> Self {
        Self {
            appimagetool: appimagetool.into(),
            rpm2cpio: "rpm2cpio".to_string(),
            cpio: "cpio".to_string(),
        }
    }

    #[cfg(test)]
    fn with_extractors(mut self, rpm2cpio: impl Into<String>, cpio: impl Into<String>) -> Self {
        self.rpm2cpio = rpm2cpio.into();
        self.cpio = cpio.into();
        self
    }
}

/// Stops a child whose partner process could not be started.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_error(tool: &str, err: std::io::Error) -> BundleError {
    if err.kind() == ErrorKind::NotFound {
        BundleError::tool(tool, "not found on PATH")
    } else {
        BundleError::tool(tool, err.to_string())
    }
}

fn check(tool: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    let message = if detail.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, detail)
    };
    Err(BundleError::tool(tool, message))
}

/// The `ARCH` value appimagetool expects for the runtime it embeds.
fn runtime_arch(arch: Arch) -> &'static str {
    match arch {
        Arch::X86_64 => "x86_64",
        Arch::X86 => "i686",
    }
}

pub(crate) fn appimagetool_args(
    appdir: &Path,
    output: &Path,
    options: &PackageOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-n".into()];
    if options.sign {
        args.push("-s".into());
        if let Some(key) = &options.sign_key {
            args.push("--sign-key".into());
            args.push(key.into());
        }
    }
    if let Some(info) = &options.update_info {
        args.push("-u".into());
        args.push(info.into());
    }
    args.push(appdir.into());
    args.push(output.into());
    args
}

impl Toolchain for SystemToolchain {
    fn extract_rpm(&self, rpm: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest)?;
        debug!(rpm = %rpm.display(), "extracting package");

        let mut rpm2cpio = Command::new(&self.rpm2cpio)
            .arg(rpm)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.rpm2cpio, e))?;
        let Some(payload) = rpm2cpio.stdout.take() else {
            reap(&mut rpm2cpio);
            return Err(BundleError::tool(&self.rpm2cpio, "no output stream"));
        };
        // Drained concurrently so a chatty rpm2cpio never blocks on a full pipe.
        let diagnostics = rpm2cpio.stderr.take().map(|mut stream| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stream.read_to_end(&mut buf);
                buf
            })
        });

        let cpio = Command::new(&self.cpio)
            .args(["-idm", "--quiet"])
            .current_dir(dest)
            .stdin(Stdio::from(payload))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(|child| child.wait_with_output());
        let cpio = match cpio {
            Ok(output) => output,
            Err(e) => {
                reap(&mut rpm2cpio);
                return Err(spawn_error(&self.cpio, e));
            }
        };

        let status = rpm2cpio
            .wait()
            .map_err(|e| spawn_error(&self.rpm2cpio, e))?;
        let stderr = diagnostics
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        let converted = Output {
            status,
            stdout: Vec::new(),
            stderr,
        };

        check(&self.rpm2cpio, &converted)?;
        check(&self.cpio, &cpio)
    }

    fn package(&self, appdir: &Path, output: &Path, options: &PackageOptions) -> Result<()> {
        let args = appimagetool_args(appdir, output, options);
        debug!(tool = %self.appimagetool, ?args, "packaging");

        let result = Command::new(&self.appimagetool)
            .args(&args)
            .env("ARCH", runtime_arch(options.arch))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&self.appimagetool, e))?;
        check(&self.appimagetool, &result)
    }
}
