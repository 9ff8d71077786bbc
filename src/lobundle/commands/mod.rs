use crate::config::BundleConfig;
use crate::model::Release;
use crate::resolve::ResolvedBuild;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub mod batch;
pub mod build;
pub mod cache;
pub mod config;
pub mod resolve;

/// Directories lobundle owns outside the output directory.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl BundlePaths {
    /// Downloaded vendor archives, kept between builds.
    pub fn downloads_dir(&self) -> PathBuf {
        self.cache_dir.join("downloads")
    }

    /// Scratch space for unpacking and AppDir assembly.
    pub fn work_dir(&self) -> PathBuf {
        self.cache_dir.join("work")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub release: Release,
    pub output: PathBuf,
    /// `None` when the build was skipped.
    pub sha256: Option<String>,
    pub skipped: bool,
    pub downloaded_bytes: u64,
    pub skipped_packages: usize,
}

#[derive(Debug, Clone)]
pub struct CachedArchive {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub builds: Vec<BuildReport>,
    pub resolved: Option<ResolvedBuild>,
    pub cached: Vec<CachedArchive>,
    pub config: Option<BundleConfig>,
    /// Batch entries that did not produce a bundle.
    pub failures: usize,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_resolved(mut self, resolved: ResolvedBuild) -> Self {
        self.resolved = Some(resolved);
        self
    }

    pub fn with_cached(mut self, cached: Vec<CachedArchive>) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_config(mut self, config: BundleConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Folds another result's builds and messages into this one.
    pub fn absorb(&mut self, other: CmdResult) {
        self.builds.extend(other.builds);
        self.failures += other.failures;
        self.messages.extend(other.messages);
    }
}
