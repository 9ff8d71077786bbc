use crate::error::{BundleError, Result};
use crate::version::Version;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Language shipped inside the main archive; it never needs a language pack.
pub const BASE_LANGUAGE: &str = "en-US";

pub const STANDARD_LANGUAGES: &[&str] = &[
    "en-GB", "de", "es", "fr", "it", "ja", "nl", "pl", "pt", "pt-BR", "ru", "zh-CN", "zh-TW",
];

pub const STABLE_PRODUCT: &str = "LibreOffice";
pub const DAILY_PRODUCT: &str = "LibreOfficeDev";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Fresh,
    Still,
    Daily,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Fresh => "fresh",
            Channel::Still => "still",
            Channel::Daily => "daily",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for: a release channel or a (possibly partial) version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Channel(Channel),
    Version(Version),
}

impl FromStr for Query {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "fresh" => Ok(Query::Channel(Channel::Fresh)),
            "still" => Ok(Query::Channel(Channel::Still)),
            "daily" => Ok(Query::Channel(Channel::Daily)),
            _ => trimmed.parse::<Version>().map(Query::Version).map_err(|_| {
                BundleError::Validation(format!(
                    "Unknown channel or version: {} (expected fresh, still, daily or a version like 7.6.4)",
                    s
                ))
            }),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Channel(c) => write!(f, "{}", c),
            Query::Version(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arch {
    #[default]
    X86_64,
    X86,
}

impl Arch {
    /// Directory name used on the mirrors (`rpm/x86_64/`).
    pub fn dir_token(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "x86",
        }
    }

    /// Token used inside archive file names (`Linux_x86-64_rpm`).
    pub fn file_token(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86-64",
            Arch::X86 => "x86",
        }
    }
}

impl FromStr for Arch {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "x86-64" | "amd64" => Ok(Arch::X86_64),
            "x86" | "i386" | "i686" => Ok(Arch::X86),
            other => Err(BundleError::Validation(format!(
                "Unsupported architecture: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageSet {
    /// Only the language bundled in the main archive.
    #[default]
    Basic,
    Standard,
    /// Every language pack published for the release.
    Full,
    Custom(Vec<String>),
}

impl LanguageSet {
    /// Short tag used in output file names.
    pub fn tag(&self) -> String {
        match self {
            LanguageSet::Basic => "basic".to_string(),
            LanguageSet::Standard => "standard".to_string(),
            LanguageSet::Full => "full".to_string(),
            LanguageSet::Custom(langs) => langs.join("_"),
        }
    }
}

impl FromStr for LanguageSet {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => return Ok(LanguageSet::Basic),
            "standard" => return Ok(LanguageSet::Standard),
            "full" => return Ok(LanguageSet::Full),
            _ => {}
        }

        let mut langs: Vec<String> = Vec::new();
        for lang in s.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            if !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(BundleError::Validation(format!(
                    "Invalid language tag: {}",
                    lang
                )));
            }
            if !langs.iter().any(|l| l == lang) {
                langs.push(lang.to_string());
            }
        }

        if langs.is_empty() {
            return Err(BundleError::Validation(
                "Language list cannot be empty".to_string(),
            ));
        }
        Ok(LanguageSet::Custom(langs))
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageSet::Custom(langs) => f.write_str(&langs.join(",")),
            other => f.write_str(&other.tag()),
        }
    }
}

/// Everything a single build needs besides configuration.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub query: Query,
    pub arch: Arch,
    pub languages: LanguageSet,
    pub help: bool,
    pub sign: bool,
    pub sign_key: Option<String>,
    pub update_info: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Rebuild even if the output bundle already exists.
    pub force: bool,
    /// Download archives again even if cached.
    pub refresh: bool,
    pub keep_workdir: bool,
}

impl BuildOptions {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            arch: Arch::default(),
            languages: LanguageSet::default(),
            help: false,
            sign: false,
            sign_key: None,
            update_info: None,
            output_dir: None,
            force: false,
            refresh: false,
            keep_workdir: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageKind {
    Main,
    LangPack(String),
    HelpPack(String),
}

/// A concrete release directory on a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub product: String,
    pub version: String,
    pub arch: Arch,
    /// Directory URL, always ending with `/`.
    pub base_url: String,
    /// Channel name or version, used to name the bundle.
    pub label: String,
}

impl Release {
    fn archive_stem(&self) -> String {
        format!(
            "{}_{}_Linux_{}_rpm",
            self.product,
            self.version,
            self.arch.file_token()
        )
    }

    pub fn archive_name(&self, kind: &PackageKind) -> String {
        let stem = self.archive_stem();
        match kind {
            PackageKind::Main => format!("{}.tar.gz", stem),
            PackageKind::LangPack(lang) => format!("{}_langpack_{}.tar.gz", stem, lang),
            PackageKind::HelpPack(lang) => format!("{}_helppack_{}.tar.gz", stem, lang),
        }
    }

    /// Recognizes the archives of this release in a directory listing.
    pub fn classify(&self, file_name: &str) -> Option<PackageKind> {
        let stem = self.archive_stem();
        let rest = file_name.strip_prefix(&stem)?;
        if rest == ".tar.gz" {
            return Some(PackageKind::Main);
        }
        let rest = rest.strip_suffix(".tar.gz")?;
        if let Some(lang) = rest.strip_prefix("_langpack_") {
            return Some(PackageKind::LangPack(lang.to_string()));
        }
        if let Some(lang) = rest.strip_prefix("_helppack_") {
            return Some(PackageKind::HelpPack(lang.to_string()));
        }
        None
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}{}", self.base_url, file_name)
    }

    pub fn output_name(&self, languages: &LanguageSet, help: bool) -> String {
        let help_tag = if help { ".help" } else { "" };
        format!(
            "{}-{}.{}{}-{}.AppImage",
            self.product,
            self.label,
            languages.tag(),
            help_tag,
            self.arch.dir_token()
        )
    }
}
