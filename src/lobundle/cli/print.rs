use chrono::{DateTime, Utc};
use colored::*;
use lobundle::api::{CmdMessage, MessageLevel};
use lobundle::commands::{BuildReport, CachedArchive};
use lobundle::model::PackageKind;
use lobundle::resolve::ResolvedBuild;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const NAME_WIDTH: usize = 64;
const SIZE_WIDTH: usize = 10;
const TIME_WIDTH: usize = 16;

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

pub fn print_resolved(resolved: &ResolvedBuild) {
    let release = &resolved.release;
    println!(
        "{} {} {}",
        release.product.bold(),
        release.version.bold(),
        format!("({}, {})", release.label, release.arch).dimmed()
    );
    println!("  {:<10}{}", "output", resolved.output_name());
    println!("  {:<10}{}", "languages", resolved.languages);
    for archive in resolved.archives() {
        println!("  {:<10}{}", kind_label(&archive.kind), archive.url);
    }
}

fn kind_label(kind: &PackageKind) -> String {
    match kind {
        PackageKind::Main => "main".to_string(),
        PackageKind::LangPack(lang) => format!("lang {}", lang),
        PackageKind::HelpPack(lang) => format!("help {}", lang),
    }
}

pub fn print_builds(builds: &[BuildReport]) {
    for report in builds.iter().filter(|b| !b.skipped) {
        println!("{}", report.output.display().to_string().bold());
        if let Some(digest) = &report.sha256 {
            println!("  {:<10}{}", "sha256", digest.dimmed());
        }
        if report.downloaded_bytes > 0 {
            println!("  {:<10}{}", "fetched", format_size(report.downloaded_bytes));
        }
        if report.skipped_packages > 0 {
            println!(
                "  {:<10}{} package(s) excluded",
                "skipped", report.skipped_packages
            );
        }
    }
}

pub fn print_cached(cached: &[CachedArchive]) {
    let now = Utc::now();
    for archive in cached {
        let (name, padding) = fit_to_width(&archive.name, NAME_WIDTH);
        println!(
            "{}{}{:>size$}{}",
            name,
            " ".repeat(padding),
            format_size(archive.size),
            format_time_ago(archive.modified, now).dimmed(),
            size = SIZE_WIDTH
        );
    }
}

pub fn print_config(entries: &[(&'static str, String)]) {
    for (key, value) in entries {
        if value.is_empty() {
            println!("{} = {}", key, "(unset)".dimmed());
        } else {
            println!("{} = {}", key, value);
        }
    }
}

fn format_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes < 1024 * 1024 {
        format!("{} KiB", bytes.div_ceil(1024))
    } else {
        format!("{:.1} MiB", bytes as f64 / MIB)
    }
}

/// Truncates `s` to `width` columns and returns it with the padding needed
/// to fill the column.
fn fit_to_width(s: &str, width: usize) -> (String, usize) {
    if s.width() <= width {
        return (s.to_string(), width - s.width());
    }

    let mut result = String::new();
    let mut current = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if current + w > width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current += w;
    }
    result.push('…');
    let used = result.width();
    (result, width.saturating_sub(used))
}

fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 KiB");
        assert_eq!(format_size(1), "1 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MiB");
    }

    #[test]
    fn short_names_are_padded() {
        let (name, padding) = fit_to_width("abc.tar.gz", 20);
        assert_eq!(name, "abc.tar.gz");
        assert_eq!(padding, 10);
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "LibreOffice_24.8.2_Linux_x86-64_rpm_helppack_en-US.tar.gz";
        let (name, padding) = fit_to_width(long, 20);
        assert!(name.ends_with('…'));
        assert_eq!(name.width() + padding, 20);
    }

    #[test]
    fn time_ago_is_right_aligned() {
        let now = Utc::now();
        let s = format_time_ago(now - Duration::hours(3), now);
        assert_eq!(s.len(), TIME_WIDTH);
        assert_eq!(s.trim(), "3 hours ago");
    }
}
