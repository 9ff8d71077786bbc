//! # API Facade
//!
//! The API layer is a thin facade over the command layer and the single entry
//! point for every lobundle operation, whatever client drives it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Owns the collaborators** a command needs (remote, toolchain, config, paths)
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no business logic, no terminal output and no formatting.
//!
//! ## Generic Over Remote and Toolchain
//!
//! `BundleApi<R: Remote, T: Toolchain>`:
//! - Production: `BundleApi<HttpRemote, SystemToolchain>`
//! - Testing: `BundleApi<MemoryRemote, RecordingToolchain>`
//!
//! so a whole build runs in tests without network access or external tools.

use crate::commands;
use crate::config::BundleConfig;
use crate::error::Result;
use crate::model::{Arch, BuildOptions, LanguageSet, Query};
use crate::remote::Remote;
use crate::tools::Toolchain;
use std::path::Path;

pub use crate::commands::batch::Recipe;
pub use crate::commands::config::ConfigAction;
pub use crate::commands::{BundlePaths, CmdMessage, CmdResult, MessageLevel};

/// The main API facade for lobundle operations.
pub struct BundleApi<R: Remote, T: Toolchain> {
    remote: R,
    tools: T,
    config: BundleConfig,
    paths: BundlePaths,
}

impl<R: Remote, T: Toolchain> BundleApi<R, T> {
    pub fn new(remote: R, tools: T, config: BundleConfig, paths: BundlePaths) -> Self {
        Self {
            remote,
            tools,
            config,
            paths,
        }
    }

    pub fn config_ref(&self) -> &BundleConfig {
        &self.config
    }

    pub fn build(&self, options: &BuildOptions) -> Result<CmdResult> {
        commands::build::run(
            &self.remote,
            &self.tools,
            &self.config,
            &self.paths,
            options,
        )
    }

    pub fn resolve(
        &self,
        query: &Query,
        arch: Arch,
        languages: &LanguageSet,
        help: bool,
    ) -> Result<CmdResult> {
        commands::resolve::run(&self.remote, &self.config, query, arch, languages, help)
    }

    pub fn batch(&self, recipe: &Recipe) -> Result<CmdResult> {
        commands::batch::run(&self.remote, &self.tools, &self.config, &self.paths, recipe)
    }

    pub fn batch_file(&self, path: &Path) -> Result<CmdResult> {
        let recipe = commands::batch::load_recipe(path)?;
        self.batch(&recipe)
    }

    pub fn cache_list(&self) -> Result<CmdResult> {
        commands::cache::list(&self.paths)
    }

    pub fn cache_clean(&self) -> Result<CmdResult> {
        commands::cache::clean(&self.paths)
    }

    /// Shows or changes the stored configuration. A successful change is
    /// picked up by later calls on this instance.
    pub fn config(&mut self, action: ConfigAction) -> Result<CmdResult> {
        let result = commands::config::run(&self.paths.config_dir, action)?;
        if let Some(config) = &result.config {
            self.config = config.clone();
        }
        Ok(result)
    }
}
