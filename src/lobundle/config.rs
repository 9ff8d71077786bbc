use crate::error::{BundleError, Result};
use crate::model::LanguageSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_STABLE_URL: &str = "https://download.documentfoundation.org/libreoffice/stable/";
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://downloadarchive.documentfoundation.org/libreoffice/old/";
pub const DEFAULT_DAILY_URL: &str = "https://dev-builds.libreoffice.org/daily/master/";

/// Keys accepted by `config <key> <value>`.
pub const CONFIG_KEYS: &[&str] = &[
    "output-dir",
    "cache-dir",
    "appimagetool",
    "sign-key",
    "languages",
];

/// Configuration for lobundle, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleConfig {
    #[serde(default = "default_stable_url")]
    pub stable_url: String,

    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    #[serde(default = "default_daily_url")]
    pub daily_url: String,

    /// Path or command name of appimagetool
    #[serde(default = "default_appimagetool")]
    pub appimagetool: String,

    /// Where finished bundles are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Download cache; `None` means the platform cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub sign_key: Option<String>,

    /// Language set used when a build does not name one
    #[serde(default = "default_languages")]
    pub languages: String,

    /// Substrings of RPM file names that are never installed into the bundle
    #[serde(default = "default_exclude_packages")]
    pub exclude_packages: Vec<String>,
}

fn default_stable_url() -> String {
    DEFAULT_STABLE_URL.to_string()
}

fn default_archive_url() -> String {
    DEFAULT_ARCHIVE_URL.to_string()
}

fn default_daily_url() -> String {
    DEFAULT_DAILY_URL.to_string()
}

fn default_appimagetool() -> String {
    "appimagetool".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_languages() -> String {
    "basic".to_string()
}

fn default_exclude_packages() -> Vec<String> {
    vec![
        "-kde-integration".to_string(),
        "-gnome-integration".to_string(),
        "-onlineupdate".to_string(),
    ]
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            stable_url: default_stable_url(),
            archive_url: default_archive_url(),
            daily_url: default_daily_url(),
            appimagetool: default_appimagetool(),
            output_dir: default_output_dir(),
            cache_dir: None,
            sign_key: None,
            languages: default_languages(),
            exclude_packages: default_exclude_packages(),
        }
    }
}

impl BundleConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: BundleConfig = serde_json::from_str(&content)?;
        config.default_language_set()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn default_language_set(&self) -> Result<LanguageSet> {
        self.languages
            .parse()
            .map_err(|e| BundleError::Config(format!("languages: {}", e)))
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "output-dir" => self.output_dir.display().to_string(),
            "cache-dir" => self
                .cache_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "appimagetool" => self.appimagetool.clone(),
            "sign-key" => self.sign_key.clone().unwrap_or_default(),
            "languages" => self.languages.clone(),
            other => return Err(unknown_key(other)),
        };
        Ok(value)
    }

    /// Set a key; an empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "output-dir" => {
                if value.is_empty() {
                    return Err(BundleError::Config("output-dir cannot be empty".into()));
                }
                self.output_dir = PathBuf::from(value);
            }
            "cache-dir" => {
                self.cache_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "appimagetool" => {
                if value.is_empty() {
                    return Err(BundleError::Config("appimagetool cannot be empty".into()));
                }
                self.appimagetool = value.to_string();
            }
            "sign-key" => {
                self.sign_key = (!value.is_empty()).then(|| value.to_string());
            }
            "languages" => {
                let set: LanguageSet = value.parse()?;
                self.languages = set.to_string();
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .map(|key| (*key, self.get(key).unwrap_or_default()))
            .collect()
    }
}

fn unknown_key(key: &str) -> BundleError {
    BundleError::Config(format!(
        "Unknown config key: {} (known keys: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}
