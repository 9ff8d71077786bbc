//! Desktop entry rewriting.
//!
//! The vendor `startcenter.desktop` launches a versioned wrapper script
//! (`libreoffice24.8 %U`) that only exists in system installs. Inside the
//! bundle the launcher is `soffice`, the icon sits next to the desktop file,
//! and appimagetool reads the version from `X-AppImage-Version`.

use crate::error::{BundleError, Result};

const MAIN_GROUP: &str = "[Desktop Entry]";
const VERSION_KEY: &str = "X-AppImage-Version";
const LAUNCHER: &str = "soffice";

fn key_of(line: &str) -> Option<&str> {
    let (key, _) = line.split_once('=')?;
    Some(key.trim())
}

/// Byte offset of the quote that closes a quoted `Exec` argument, honoring
/// backslash escapes.
fn closing_quote(quoted: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in quoted.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Replaces the program of an `Exec` value, which may be quoted, keeping its
/// arguments.
fn rewrite_exec(value: &str) -> String {
    let value = value.trim();
    let args = match value.strip_prefix('"') {
        Some(rest) => closing_quote(rest).map(|end| &rest[end + 1..]),
        None => value.split_once(char::is_whitespace).map(|(_, args)| args),
    };
    match args.map(str::trim_start).filter(|args| !args.is_empty()) {
        Some(args) => format!("{} {}", LAUNCHER, args),
        None => LAUNCHER.to_string(),
    }
}

/// Rewrites a desktop entry for use inside the bundle.
///
/// Every `Exec=` runs `soffice` with the original arguments, every `Icon=`
/// points at `icon`, `TryExec=` is dropped, and `X-AppImage-Version` is set in
/// the main group.
pub fn rewrite(content: &str, icon: &str, version: &str) -> Result<String> {
    let mut out: Vec<String> = Vec::new();
    let mut in_main = false;
    let mut main_end: Option<usize> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_main = trimmed == MAIN_GROUP;
            out.push(line.to_string());
            if in_main {
                main_end = Some(out.len());
            }
            continue;
        }

        let rewritten = match key_of(trimmed) {
            Some("TryExec") | Some(VERSION_KEY) => None,
            Some("Exec") => {
                let value = trimmed.split_once('=').map(|(_, v)| v).unwrap_or("");
                Some(format!("Exec={}", rewrite_exec(value)))
            }
            Some("Icon") => Some(format!("Icon={}", icon)),
            _ => Some(line.to_string()),
        };

        if let Some(rewritten) = rewritten {
            let blank = rewritten.trim().is_empty();
            out.push(rewritten);
            if in_main && !blank {
                main_end = Some(out.len());
            }
        }
    }

    let at = main_end.ok_or_else(|| {
        BundleError::Validation("Desktop file has no [Desktop Entry] group".to_string())
    })?;
    out.insert(at, format!("{}={}", VERSION_KEY, version));

    let mut result = out.join("\n");
    result.push('\n');
    Ok(result)
}
