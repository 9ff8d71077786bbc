//! # Remote Access
//!
//! Everything lobundle fetches from the mirrors goes through the [`Remote`]
//! trait, the same way every bundle step that touches the outside world sits
//! behind a trait.
//!
//! ## Implementations
//!
//! - [`http::HttpRemote`]: production client over blocking `reqwest`
//!   - Directory listings fetched as text
//!   - Archives streamed to `<dest>.part`, renamed into place when complete
//!
//! - [`memory::MemoryRemote`]: canned pages and files for testing
//!   - No network
//!   - Records every URL it was asked for

use crate::error::Result;
use std::path::Path;

pub mod http;
#[cfg(any(test, feature = "test_utils"))]
pub mod memory;

pub trait Remote {
    /// Fetch a page (directory listings) as text.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// `dest` must only exist afterwards if the download completed.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Joins a directory URL and a child entry, keeping exactly one slash between them.
pub fn join_url(base: &str, child: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        child.trim_start_matches('/')
    )
}

/// Like [`join_url`] but for directories: the result ends with `/`.
pub fn join_dir(base: &str, child: &str) -> String {
    let mut url = join_url(base, child.trim_end_matches('/'));
    url.push('/');
    url
}
