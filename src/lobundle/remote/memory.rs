use super::Remote;
use crate::error::{BundleError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Serves canned listing pages and files. Used by tests in place of the mirrors.
#[derive(Default)]
pub struct MemoryRemote {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_file(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(url.into(), bytes);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| self.files.contains_key(url))
            .collect()
    }

    fn not_found(url: &str) -> BundleError {
        BundleError::Resolve(format!("GET {} returned 404 Not Found", url))
    }
}

impl Remote for MemoryRemote {
    fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.requests.borrow_mut().push(url.to_string());
        let bytes = self.files.get(url).ok_or_else(|| Self::not_found(url))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Renders entries the way an Apache directory index does.
pub fn listing_html(entries: &[&str]) -> String {
    let rows: Vec<String> = entries
        .iter()
        .map(|e| format!("<tr><td><a href=\"{}\">{}</a></td></tr>", e, e))
        .collect();
    format!(
        "<html><body><table>\n<tr><td><a href=\"?C=N;O=D\">Name</a></td></tr>\n<tr><td><a href=\"../\">Parent Directory</a></td></tr>\n{}\n</table></body></html>",
        rows.join("\n")
    )
}
