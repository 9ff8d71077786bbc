//! Batch builds from a JSON recipe.
//!
//! ```json
//! {
//!   "output_dir": "/srv/appimages",
//!   "builds": [
//!     { "query": "fresh", "languages": "full", "help": true },
//!     { "query": "still", "sign": true },
//!     { "query": "7.6", "arch": "x86" }
//!   ]
//! }
//! ```
//!
//! Omitted fields fall back to the configuration. Entries run one after the
//! other; a failing entry is reported and the batch moves on.

use crate::commands::{build, BundlePaths, CmdMessage, CmdResult};
use crate::config::BundleConfig;
use crate::error::Result;
use crate::model::{Arch, BuildOptions, LanguageSet, Query};
use crate::remote::Remote;
use crate::tools::Toolchain;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Rebuild bundles that already exist.
    #[serde(default)]
    pub force: bool,
    pub builds: Vec<RecipeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeEntry {
    pub query: String,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub languages: Option<String>,
    #[serde(default)]
    pub help: bool,
    #[serde(default)]
    pub sign: bool,
    #[serde(default)]
    pub update_info: Option<String>,
}

impl RecipeEntry {
    pub fn to_options(&self, recipe: &Recipe, config: &BundleConfig) -> Result<BuildOptions> {
        let mut options = BuildOptions::new(self.query.parse::<Query>()?);
        if let Some(arch) = &self.arch {
            options.arch = arch.parse::<Arch>()?;
        }
        options.languages = match &self.languages {
            Some(langs) => langs.parse::<LanguageSet>()?,
            None => config.default_language_set()?,
        };
        options.help = self.help;
        options.sign = self.sign;
        options.update_info = self.update_info.clone();
        options.output_dir = recipe.output_dir.clone();
        options.force = recipe.force;
        Ok(options)
    }
}

pub fn load_recipe(path: &Path) -> Result<Recipe> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn run<R: Remote, T: Toolchain>(
    remote: &R,
    tools: &T,
    config: &BundleConfig,
    paths: &BundlePaths,
    recipe: &Recipe,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let total = recipe.builds.len();

    for (i, entry) in recipe.builds.iter().enumerate() {
        info!(entry = i + 1, total, query = %entry.query, "batch build");
        let outcome = entry
            .to_options(recipe, config)
            .and_then(|options| build::run(remote, tools, config, paths, &options));

        match outcome {
            Ok(built) => result.absorb(built),
            Err(e) => {
                result.failures += 1;
                result.add_message(CmdMessage::error(format!(
                    "[{}/{}] {}: {}",
                    i + 1,
                    total,
                    entry.query,
                    e
                )));
            }
        }
    }

    let succeeded = total - result.failures;
    let summary = format!("{} of {} build(s) succeeded.", succeeded, total);
    if result.failures == 0 {
        result.add_message(CmdMessage::success(summary));
    } else {
        result.add_message(CmdMessage::warning(summary));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::test_utils::{stable_fixture, TestEnv};
    use crate::tools::recording::RecordingToolchain;

    fn recipe(json: &str) -> Recipe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_minimal_recipe() {
        let r = recipe(r#"{ "builds": [ { "query": "fresh" } ] }"#);
        assert_eq!(r.builds.len(), 1);
        assert!(!r.force);
        assert!(r.output_dir.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed: std::result::Result<Recipe, _> =
            serde_json::from_str(r#"{ "builds": [ { "query": "fresh", "langs": "de" } ] }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn entry_defaults_come_from_config() {
        let mut config = BundleConfig::default();
        config.languages = "standard".into();
        let r = recipe(r#"{ "builds": [ { "query": "still", "arch": "i686" } ] }"#);

        let options = r.builds[0].to_options(&r, &config).unwrap();
        assert_eq!(options.languages, LanguageSet::Standard);
        assert_eq!(options.arch, Arch::X86);
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let env = TestEnv::new();
        let remote = stable_fixture();
        let tools = RecordingToolchain::new();
        let r = recipe(
            r#"{ "builds": [
                { "query": "nightly" },
                { "query": "fresh" },
                { "query": "fresh", "languages": "fr" }
            ] }"#,
        );

        let result = run(&remote, &tools, &env.config, &env.paths, &r).unwrap();

        assert_eq!(result.failures, 2);
        assert_eq!(result.builds.len(), 1);
        let errors: Vec<_> = result
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].content.starts_with("[1/3] nightly:"));
        assert_eq!(
            result.messages.last().unwrap().content,
            "1 of 3 build(s) succeeded."
        );
    }

    #[test]
    fn recipe_output_dir_applies_to_all_entries() {
        let env = TestEnv::new();
        let remote = stable_fixture();
        let tools = RecordingToolchain::new();
        let out = env.root().join("batch-out");
        let r = Recipe {
            output_dir: Some(out.clone()),
            force: false,
            builds: vec![
                RecipeEntry {
                    query: "fresh".into(),
                    arch: None,
                    languages: None,
                    help: false,
                    sign: false,
                    update_info: None,
                },
                RecipeEntry {
                    query: "fresh".into(),
                    arch: None,
                    languages: Some("de".into()),
                    help: true,
                    sign: false,
                    update_info: None,
                },
            ],
        };

        let result = run(&remote, &tools, &env.config, &env.paths, &r).unwrap();
        assert_eq!(result.failures, 0);
        assert_eq!(result.builds.len(), 2);
        assert!(result.builds.iter().all(|b| b.output.starts_with(&out)));
    }

    #[test]
    fn loads_recipe_from_file() {
        let env = TestEnv::new();
        let path = env.root().join("recipe.json");
        fs::write(&path, r#"{ "force": true, "builds": [ { "query": "7.6.4.1" } ] }"#).unwrap();
        let r = load_recipe(&path).unwrap();
        assert!(r.force);
        assert_eq!(r.builds[0].query, "7.6.4.1");
    }
}
