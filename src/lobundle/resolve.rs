//! # Release Resolution
//!
//! Turns a [`Query`] into a [`ResolvedBuild`]: the release directory on the
//! right mirror, the main archive, and the language and help packs to merge.
//!
//! Three mirrors are involved:
//!
//! ```text
//! stable   <stable>/<version>/rpm/<arch>/                 fresh, still, partial versions
//! archive  <archive>/<version>/rpm/<arch>/                exact and older versions
//! daily    <daily>/<tinderbox>/<timestamp>/               nightly builds
//! ```
//!
//! Each step reads one directory listing through the [`Remote`] trait, so the
//! whole module can be exercised against canned pages.

use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::model::{
    Arch, Channel, LanguageSet, PackageKind, Query, Release, BASE_LANGUAGE, DAILY_PRODUCT,
    STABLE_PRODUCT, STANDARD_LANGUAGES,
};
use crate::remote::{join_dir, Remote};
use crate::version::{
    fresh_and_still, listing_entries, newest_matching, newest_nightly, newest_version, Version,
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirrors {
    pub stable: String,
    pub archive: String,
    pub daily: String,
}

impl Mirrors {
    pub fn from_config(config: &BundleConfig) -> Self {
        Self {
            stable: config.stable_url.clone(),
            archive: config.archive_url.clone(),
            daily: config.daily_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub kind: PackageKind,
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedBuild {
    pub release: Release,
    pub languages: LanguageSet,
    pub help: bool,
    pub lang_packs: Vec<String>,
    pub help_packs: Vec<String>,
    /// Requested packs that the release does not publish.
    pub warnings: Vec<String>,
}

impl ResolvedBuild {
    /// Main archive first, then language packs, then help packs.
    pub fn archives(&self) -> Vec<Archive> {
        let kinds = std::iter::once(PackageKind::Main)
            .chain(self.lang_packs.iter().cloned().map(PackageKind::LangPack))
            .chain(self.help_packs.iter().cloned().map(PackageKind::HelpPack));

        kinds
            .map(|kind| {
                let file_name = self.release.archive_name(&kind);
                let url = self.release.url_for(&file_name);
                Archive {
                    kind,
                    file_name,
                    url,
                }
            })
            .collect()
    }

    pub fn output_name(&self) -> String {
        self.release.output_name(&self.languages, self.help)
    }
}

pub fn resolve<R: Remote>(
    remote: &R,
    mirrors: &Mirrors,
    query: &Query,
    arch: Arch,
    languages: &LanguageSet,
    help: bool,
) -> Result<ResolvedBuild> {
    let (release, listing) = match query {
        Query::Channel(Channel::Daily) => locate_daily(remote, mirrors, arch)?,
        Query::Channel(channel) => (locate_stable(remote, mirrors, *channel, arch)?, None),
        Query::Version(version) => (locate_version(remote, mirrors, version, arch)?, None),
    };
    info!(product = %release.product, version = %release.version, "resolved release");

    let listing = match listing {
        Some(listing) => listing,
        None => fetch_listing(remote, &release.base_url)?,
    };
    select_packages(release, &listing, languages, help)
}

fn fetch_listing<R: Remote>(remote: &R, url: &str) -> Result<Vec<String>> {
    let entries = listing_entries(&remote.fetch_text(url)?);
    debug!(url, entries = entries.len(), "read listing");
    Ok(entries)
}

fn rpm_dir(base: &str, version: &Version, arch: Arch) -> String {
    join_dir(
        &join_dir(base, &version.to_string()),
        &format!("rpm/{}", arch.dir_token()),
    )
}

fn stable_release(base_url: String, version: &Version, arch: Arch, label: String) -> Release {
    Release {
        product: STABLE_PRODUCT.to_string(),
        version: version.to_string(),
        arch,
        base_url,
        label,
    }
}

fn locate_stable<R: Remote>(
    remote: &R,
    mirrors: &Mirrors,
    channel: Channel,
    arch: Arch,
) -> Result<Release> {
    let entries = fetch_listing(remote, &mirrors.stable)?;
    let version = match channel {
        Channel::Fresh => newest_version(&entries)
            .ok_or_else(|| BundleError::Resolve("No stable releases listed".to_string()))?,
        _ => fresh_and_still(&entries)?.1,
    };
    Ok(stable_release(
        rpm_dir(&mirrors.stable, &version, arch),
        &version,
        arch,
        channel.to_string(),
    ))
}

fn locate_version<R: Remote>(
    remote: &R,
    mirrors: &Mirrors,
    version: &Version,
    arch: Arch,
) -> Result<Release> {
    if version.is_exact() {
        return Ok(stable_release(
            rpm_dir(&mirrors.archive, version, arch),
            version,
            arch,
            version.to_string(),
        ));
    }

    let stable = fetch_listing(remote, &mirrors.stable)?;
    if let Some(found) = newest_matching(&stable, version) {
        return Ok(stable_release(
            rpm_dir(&mirrors.stable, &found, arch),
            &found,
            arch,
            found.to_string(),
        ));
    }

    let archived = fetch_listing(remote, &mirrors.archive)?;
    let found = newest_matching(&archived, version)
        .ok_or_else(|| BundleError::Resolve(format!("No release matches {}", version)))?;
    Ok(stable_release(
        rpm_dir(&mirrors.archive, &found, arch),
        &found,
        arch,
        found.to_string(),
    ))
}

/// Walks daily listing → tinderbox → newest nightly and reads the version off
/// the archive name, which is the only place the daily version appears.
fn locate_daily<R: Remote>(
    remote: &R,
    mirrors: &Mirrors,
    arch: Arch,
) -> Result<(Release, Option<Vec<String>>)> {
    if arch != Arch::X86_64 {
        return Err(BundleError::Validation(format!(
            "Daily builds are only published for {}",
            Arch::X86_64
        )));
    }

    let tinderbox_prefix = format!("Linux-rpm_deb-{}@", arch.dir_token());
    let tinderboxes = fetch_listing(remote, &mirrors.daily)?;
    let tinderbox = tinderboxes
        .iter()
        .find(|e| e.starts_with(&tinderbox_prefix))
        .ok_or_else(|| {
            BundleError::Resolve(format!("No daily tinderbox for {} found", arch))
        })?;
    let tinderbox_url = join_dir(&mirrors.daily, tinderbox);

    let builds = fetch_listing(remote, &tinderbox_url)?;
    let nightly = newest_nightly(&builds).ok_or_else(|| {
        BundleError::Resolve(format!("No nightly builds listed in {}", tinderbox_url))
    })?;
    let build_url = join_dir(&tinderbox_url, &nightly);
    debug!(nightly = %nightly, "selected nightly build");

    let listing = fetch_listing(remote, &build_url)?;
    let product_prefix = format!("{}_", DAILY_PRODUCT);
    let suffix = format!("_Linux_{}_rpm.tar.gz", arch.file_token());
    let version = listing
        .iter()
        .find_map(|e| e.strip_prefix(&product_prefix)?.strip_suffix(&suffix))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            BundleError::Resolve(format!("No daily archive found in {}", build_url))
        })?;

    let release = Release {
        product: DAILY_PRODUCT.to_string(),
        version,
        arch,
        base_url: build_url,
        label: Channel::Daily.to_string(),
    };
    Ok((release, Some(listing)))
}

fn select_packages(
    release: Release,
    listing: &[String],
    languages: &LanguageSet,
    help: bool,
) -> Result<ResolvedBuild> {
    let mut has_main = false;
    let mut lang_available: Vec<String> = Vec::new();
    let mut help_available: Vec<String> = Vec::new();
    for entry in listing {
        match release.classify(entry) {
            Some(PackageKind::Main) => has_main = true,
            Some(PackageKind::LangPack(lang)) => lang_available.push(lang),
            Some(PackageKind::HelpPack(lang)) => help_available.push(lang),
            None => {}
        }
    }

    if !has_main {
        return Err(BundleError::Resolve(format!(
            "{} not found in {}",
            release.archive_name(&PackageKind::Main),
            release.base_url
        )));
    }

    let mut warnings = Vec::new();
    let lang_packs: Vec<String> = match languages {
        LanguageSet::Basic => Vec::new(),
        LanguageSet::Full => lang_available
            .iter()
            .filter(|l| l.as_str() != BASE_LANGUAGE)
            .cloned()
            .collect(),
        LanguageSet::Standard => {
            let mut packs = Vec::new();
            for lang in STANDARD_LANGUAGES {
                if lang_available.iter().any(|l| l == lang) {
                    packs.push(lang.to_string());
                } else {
                    warnings.push(format!(
                        "No language pack for {} in {} {}",
                        lang, release.product, release.version
                    ));
                }
            }
            packs
        }
        LanguageSet::Custom(requested) => {
            let wanted: Vec<&String> = requested
                .iter()
                .filter(|l| l.as_str() != BASE_LANGUAGE)
                .collect();
            let missing: Vec<&str> = wanted
                .iter()
                .filter(|l| !lang_available.contains(*l))
                .map(|l| l.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(BundleError::Resolve(format!(
                    "Language packs not published for {} {}: {}",
                    release.product,
                    release.version,
                    missing.join(", ")
                )));
            }
            wanted.into_iter().cloned().collect()
        }
    };

    let mut help_packs = Vec::new();
    if help {
        let wanted = std::iter::once(BASE_LANGUAGE.to_string()).chain(lang_packs.iter().cloned());
        for lang in wanted {
            if help_packs.contains(&lang) {
                continue;
            }
            if help_available.contains(&lang) {
                help_packs.push(lang);
            } else {
                warnings.push(format!("No help pack for {}", lang));
            }
        }
    }

    Ok(ResolvedBuild {
        release,
        languages: languages.clone(),
        help,
        lang_packs,
        help_packs,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::{listing_html, MemoryRemote};
    use crate::test_utils::{mirrors, ARCHIVE, DAILY, STABLE};

    fn release_listing(version: &str, langs: &[&str], helps: &[&str]) -> String {
        let stem = format!("LibreOffice_{}_Linux_x86-64_rpm", version);
        let mut entries = vec![format!("{}.tar.gz", stem), format!("{}.tar.gz.asc", stem)];
        entries.extend(langs.iter().map(|l| format!("{}_langpack_{}.tar.gz", stem, l)));
        entries.extend(helps.iter().map(|l| format!("{}_helppack_{}.tar.gz", stem, l)));
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        listing_html(&refs)
    }

    fn stable_remote() -> MemoryRemote {
        MemoryRemote::new()
            .with_page(
                STABLE,
                listing_html(&["24.2.6/", "24.2.7/", "24.8.1/", "24.8.2/"]),
            )
            .with_page(
                format!("{}24.8.2/rpm/x86_64/", STABLE),
                release_listing("24.8.2", &["de", "en-US", "it"], &["de", "en-US"]),
            )
            .with_page(
                format!("{}24.2.7/rpm/x86_64/", STABLE),
                release_listing("24.2.7", &["de"], &["en-US"]),
            )
    }

    #[test]
    fn resolves_fresh() {
        let remote = stable_remote();
        let query = Query::Channel(Channel::Fresh);
        let build = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap();

        assert_eq!(build.release.version, "24.8.2");
        assert_eq!(build.release.label, "fresh");
        assert_eq!(build.archives().len(), 1);
        assert_eq!(
            build.archives()[0].url,
            "https://stable.test/libreoffice/stable/24.8.2/rpm/x86_64/LibreOffice_24.8.2_Linux_x86-64_rpm.tar.gz"
        );
    }

    #[test]
    fn resolves_still_to_previous_series() {
        let remote = stable_remote();
        let query = Query::Channel(Channel::Still);
        let build = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap();
        assert_eq!(build.release.version, "24.2.7");
        assert_eq!(build.output_name(), "LibreOffice-still.basic-x86_64.AppImage");
    }

    #[test]
    fn partial_version_prefers_stable_mirror() {
        let remote = stable_remote();
        let query: Query = "24.2".parse().unwrap();
        let build = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap();
        assert_eq!(build.release.version, "24.2.7");
        assert!(build.release.base_url.starts_with(STABLE));
        assert_eq!(build.release.label, "24.2.7");
    }

    #[test]
    fn partial_version_falls_back_to_archive() {
        let remote = stable_remote()
            .with_page(ARCHIVE, listing_html(&["latest/", "7.5.9.2/", "7.6.3.2/", "7.6.4.1/"]))
            .with_page(
                format!("{}7.6.4.1/rpm/x86_64/", ARCHIVE),
                release_listing("7.6.4.1", &[], &[]),
            );
        let query: Query = "7.6".parse().unwrap();
        let build = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap();
        assert_eq!(build.release.version, "7.6.4.1");
        assert!(build.release.base_url.starts_with(ARCHIVE));
    }

    #[test]
    fn exact_version_goes_straight_to_archive() {
        let remote = MemoryRemote::new().with_page(
            format!("{}7.6.4.1/rpm/x86_64/", ARCHIVE),
            release_listing("7.6.4.1", &[], &[]),
        );
        let query: Query = "7.6.4.1".parse().unwrap();
        let build = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap();
        assert_eq!(build.release.version, "7.6.4.1");
        assert_eq!(remote.requests().len(), 1);
    }

    #[test]
    fn unknown_version_is_an_error() {
        let remote = stable_remote().with_page(ARCHIVE, listing_html(&["7.6.4.1/"]));
        let query: Query = "6.1".parse().unwrap();
        let err = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap_err();
        assert!(err.to_string().contains("No release matches 6.1"));
    }

    #[test]
    fn missing_main_archive_is_an_error() {
        let remote = MemoryRemote::new()
            .with_page(STABLE, listing_html(&["24.8.2/"]))
            .with_page(
                format!("{}24.8.2/rpm/x86_64/", STABLE),
                listing_html(&["README"]),
            );
        let query = Query::Channel(Channel::Fresh);
        let err = resolve(&remote, &mirrors(), &query, Arch::X86_64, &LanguageSet::Basic, false)
            .unwrap_err();
        assert!(matches!(err, BundleError::Resolve(_)));
    }

    #[test]
    fn resolves_daily_from_newest_nightly() {
        let tinderbox = format!("{}Linux-rpm_deb-x86_64@tb87-TDF/", DAILY);
        let nightly = format!("{}2024-06-14_04.53.12/", tinderbox);
        let remote = MemoryRemote::new()
            .with_page(
                DAILY,
                listing_html(&["Linux-deb-aarch64@tb99/", "Linux-rpm_deb-x86_64@tb87-TDF/"]),
            )
            .with_page(
                tinderbox.clone(),
                listing_html(&["2024-06-13_22.11.05/", "2024-06-14_04.53.12/", "current/"]),
            )
            .with_page(
                nightly.clone(),
                listing_html(&[
                    "LibreOfficeDev_24.8.0.0.alpha1%2B_Linux_x86-64_rpm.tar.gz",
                    "LibreOfficeDev_24.8.0.0.alpha1%2B_Linux_x86-64_rpm_langpack_it.tar.gz",
                ]),
            );

        let langs = LanguageSet::Custom(vec!["it".into()]);
        let build = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Daily),
            Arch::X86_64,
            &langs,
            false,
        )
        .unwrap();

        assert_eq!(build.release.product, "LibreOfficeDev");
        assert_eq!(build.release.version, "24.8.0.0.alpha1+");
        assert_eq!(build.release.base_url, nightly);
        assert_eq!(build.lang_packs, vec!["it".to_string()]);
        // The nightly listing is read once.
        assert_eq!(remote.requests().iter().filter(|u| **u == nightly).count(), 1);
    }

    #[test]
    fn daily_rejects_x86() {
        let remote = MemoryRemote::new();
        let err = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Daily),
            Arch::X86,
            &LanguageSet::Basic,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::Validation(_)));
        assert!(remote.requests().is_empty());
    }

    #[test]
    fn standard_set_warns_about_missing_packs() {
        let remote = stable_remote();
        let build = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Fresh),
            Arch::X86_64,
            &LanguageSet::Standard,
            false,
        )
        .unwrap();
        assert_eq!(build.lang_packs, vec!["de".to_string(), "it".to_string()]);
        assert_eq!(build.warnings.len(), STANDARD_LANGUAGES.len() - 2);
    }

    #[test]
    fn custom_set_requires_every_pack() {
        let remote = stable_remote();
        let langs: LanguageSet = "de,fr".parse().unwrap();
        let err = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Fresh),
            Arch::X86_64,
            &langs,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("fr"));
    }

    #[test]
    fn full_set_takes_all_but_base_language() {
        let remote = stable_remote();
        let build = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Fresh),
            Arch::X86_64,
            &LanguageSet::Full,
            false,
        )
        .unwrap();
        assert_eq!(build.lang_packs, vec!["de".to_string(), "it".to_string()]);
    }

    #[test]
    fn help_packs_cover_base_and_selected_languages() {
        let remote = stable_remote();
        let langs: LanguageSet = "en-US,de,it".parse().unwrap();
        let build = resolve(
            &remote,
            &mirrors(),
            &Query::Channel(Channel::Fresh),
            Arch::X86_64,
            &langs,
            true,
        )
        .unwrap();

        assert_eq!(build.lang_packs, vec!["de".to_string(), "it".to_string()]);
        assert_eq!(build.help_packs, vec!["en-US".to_string(), "de".to_string()]);
        assert_eq!(build.warnings, vec!["No help pack for it".to_string()]);

        let kinds: Vec<PackageKind> = build.archives().into_iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PackageKind::Main,
                PackageKind::LangPack("de".into()),
                PackageKind::LangPack("it".into()),
                PackageKind::HelpPack("en-US".into()),
                PackageKind::HelpPack("de".into()),
            ]
        );
        assert_eq!(
            build.output_name(),
            "LibreOffice-fresh.en-US_de_it.help-x86_64.AppImage"
        );
    }
}
