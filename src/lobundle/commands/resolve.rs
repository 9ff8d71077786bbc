use crate::commands::{CmdMessage, CmdResult};
use crate::config::BundleConfig;
use crate::error::Result;
use crate::model::{Arch, LanguageSet, Query};
use crate::remote::Remote;
use crate::resolve::{resolve, Mirrors};

/// Resolves a query without downloading anything.
pub fn run<R: Remote>(
    remote: &R,
    config: &BundleConfig,
    query: &Query,
    arch: Arch,
    languages: &LanguageSet,
    help: bool,
) -> Result<CmdResult> {
    let resolved = resolve(
        remote,
        &Mirrors::from_config(config),
        query,
        arch,
        languages,
        help,
    )?;

    let mut result = CmdResult::default();
    for warning in &resolved.warnings {
        result.add_message(CmdMessage::warning(warning));
    }
    Ok(result.with_resolved(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{stable_fixture, TestEnv, FRESH_VERSION};

    #[test]
    fn resolves_without_downloading() {
        let env = TestEnv::new();
        let remote = stable_fixture();

        let result = run(
            &remote,
            &env.config,
            &"24.8".parse().unwrap(),
            Arch::X86_64,
            &LanguageSet::Basic,
            true,
        )
        .unwrap();

        let resolved = result.resolved.unwrap();
        assert_eq!(resolved.release.version, FRESH_VERSION);
        assert_eq!(resolved.help_packs, vec!["en-US".to_string()]);
        assert!(remote.downloads().is_empty());
    }

    #[test]
    fn surfaces_warnings_as_messages() {
        let env = TestEnv::new();
        let remote = stable_fixture();

        let result = run(
            &remote,
            &env.config,
            &"fresh".parse().unwrap(),
            Arch::X86_64,
            &LanguageSet::Standard,
            false,
        )
        .unwrap();

        assert!(!result.messages.is_empty());
        assert!(result.messages[0].content.starts_with("No language pack for"));
    }
}
