//! # Versions and Directory Listings
//!
//! The download mirrors publish releases as plain HTML directory listings. This
//! module holds the pieces needed to turn such a listing into a concrete release:
//!
//! - [`Version`]: a numeric, dot-separated release number with numeric ordering
//! - [`listing_entries`]: scrapes the `href` targets of a listing page
//! - [`fresh_and_still`]: picks the two stable series out of the stable listing
//! - [`newest_nightly`]: picks the most recent timestamped nightly directory
//!
//! Nothing here touches the network; callers hand in the page text.

use crate::error::{BundleError, Result};
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// Directory name format used by the daily build tinderboxes.
pub const NIGHTLY_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

const MAX_COMPONENTS: usize = 4;

/// A release number such as `7.6`, `24.2.5` or `7.6.4.1`.
///
/// Ordering is numeric per component. A version that is a prefix of another
/// orders before it (`7.6` < `7.6.0`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    parts: Vec<u32>,
}

impl Version {
    pub fn components(&self) -> &[u32] {
        &self.parts
    }

    /// True when the version names a single build (`major.minor.micro.build`).
    pub fn is_exact(&self) -> bool {
        self.parts.len() == MAX_COMPONENTS
    }

    /// The `major.minor` series the version belongs to.
    pub fn series(&self) -> (u32, u32) {
        let major = self.parts.first().copied().unwrap_or(0);
        let minor = self.parts.get(1).copied().unwrap_or(0);
        (major, minor)
    }

    pub fn matches_prefix(&self, prefix: &Version) -> bool {
        self.parts.starts_with(&prefix.parts)
    }
}

impl FromStr for Version {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BundleError::Validation(format!("Invalid version: {}", s));

        let parts = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u32>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>>>()?;

        if parts.len() > MAX_COMPONENTS {
            return Err(invalid());
        }
        Ok(Self { parts })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", joined.join("."))
    }
}

/// Extracts the relative link targets of an HTML directory listing.
///
/// Sorting links, parent links, absolute paths and external URLs are ignored.
/// Trailing slashes are stripped so directories and files look alike, and
/// duplicates are dropped while keeping the page order.
pub fn listing_entries(html: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut rest = html;

    while let Some(pos) = rest.find("href=") {
        rest = &rest[pos + "href=".len()..];
        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => continue,
        };
        rest = &rest[1..];
        let Some(end) = rest.find(quote) else {
            break;
        };
        let target = &rest[..end];
        rest = &rest[end + 1..];

        if let Some(entry) = normalize_href(target) {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }

    entries
}

fn normalize_href(target: &str) -> Option<String> {
    if target.is_empty()
        || target.starts_with('?')
        || target.starts_with('#')
        || target.starts_with('/')
        || target.starts_with("..")
        || target.starts_with("mailto:")
        || target.contains("://")
    {
        return None;
    }

    let path = target.split(['?', '#']).next().unwrap_or(target);
    let decoded = path.replace("%2B", "+").replace("%2b", "+");
    let trimmed = decoded.trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// All entries that parse as versions, ascending.
pub fn versions_in(entries: &[String]) -> Vec<Version> {
    let mut versions: Vec<Version> = entries.iter().filter_map(|e| e.parse().ok()).collect();
    versions.sort();
    versions.dedup();
    versions
}

pub fn newest_version(entries: &[String]) -> Option<Version> {
    versions_in(entries).pop()
}

/// Newest listed version that starts with `prefix`.
pub fn newest_matching(entries: &[String], prefix: &Version) -> Option<Version> {
    versions_in(entries)
        .into_iter()
        .rev()
        .find(|v| v.matches_prefix(prefix))
}

/// Splits the stable listing into the fresh and still releases.
///
/// Fresh is the newest version overall; still is the newest version of any
/// other `major.minor` series.
pub fn fresh_and_still(entries: &[String]) -> Result<(Version, Version)> {
    let versions = versions_in(entries);
    let fresh = versions
        .last()
        .cloned()
        .ok_or_else(|| BundleError::Resolve("No stable releases listed".to_string()))?;
    let still = versions
        .iter()
        .rev()
        .find(|v| v.series() != fresh.series())
        .cloned()
        .ok_or_else(|| {
            BundleError::Resolve(format!(
                "No previous stable series listed besides {}",
                fresh
            ))
        })?;
    Ok((fresh, still))
}

pub fn parse_nightly(entry: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(entry, NIGHTLY_FORMAT).ok()
}

/// Picks the most recent nightly build directory.
///
/// Entries that are not timestamps (`current`, stray files) are skipped.
pub fn newest_nightly(entries: &[String]) -> Option<String> {
    entries
        .iter()
        .filter_map(|e| parse_nightly(e).map(|ts| (ts, e)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, e)| e.clone())
}
