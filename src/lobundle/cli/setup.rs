use clap::{Args, CommandFactory, Parser, Subcommand};
use lobundle::model::{Arch, LanguageSet, Query};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lobundle",
    bin_name = "lobundle",
    version,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Build LibreOffice AppImages from the official RPM releases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration directory (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Build,
    Maintenance,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Build => "Build Commands:",
            CommandGroup::Maintenance => "Maintenance:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "build" | "resolve" | "batch" => Some(CommandGroup::Build),
            "cache" | "config" => Some(CommandGroup::Maintenance),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[CommandGroup::Build, CommandGroup::Maintenance]
    }
}

pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");
    let mut output = String::new();

    output.push_str(&format!("lobundle {version}\n"));
    output.push_str("Build LibreOffice AppImages from the official RPM releases\n");
    output.push('\n');
    output.push_str("Usage: lobundle [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| CommandGroup::for_command(sc.get_name()) == Some(*group))
            .collect();
        if group_cmds.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(&format!("{}\n", group.heading()));
        for sc in group_cmds {
            let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
            output.push_str(&format!("  {:<12} {}\n", sc.get_name(), about));
        }
    }

    output.push('\n');
    output.push_str("Queries:\n");
    output.push_str("  fresh, still, daily, or a version such as 24.8 or 24.8.2.1\n");
    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --config <DIR>  Configuration directory\n");
    output.push_str("  -v, --verbose       Verbose output\n");
    output.push_str("  -h, --help          Print help\n");
    output.push_str("  -V, --version       Print version\n");
    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints clap's help for the given subcommand, or the grouped help.
pub fn print_subcommand_help(command: &Option<Commands>) {
    let name = match command {
        Some(Commands::Build { .. }) => "build",
        Some(Commands::Resolve { .. }) => "resolve",
        Some(Commands::Batch { .. }) => "batch",
        Some(Commands::Cache { .. }) => "cache",
        Some(Commands::Config { .. }) => "config",
        None => {
            print_grouped_help();
            return;
        }
    };

    print_command_help(name);
}

pub fn print_command_help(name: &str) {
    let mut cmd = Cli::command();
    if let Some(subcmd) = cmd.find_subcommand_mut(name) {
        print!("{}", subcmd.render_help());
    }
}

/// What to fetch: shared by `build` and `resolve`.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// fresh, still, daily, or a version (24.8, 24.8.2, 24.8.2.1)
    #[arg(default_value = "fresh")]
    pub query: Query,

    /// Target architecture (x86_64, x86)
    #[arg(long, default_value = "x86_64")]
    pub arch: Arch,

    /// basic, standard, full, or a comma separated list such as de,fr
    #[arg(short, long = "lang", value_name = "LANGUAGES")]
    pub languages: Option<LanguageSet>,

    /// Include the offline help packs
    #[arg(long)]
    pub help_pack: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an AppImage
    #[command(alias = "b", display_order = 1)]
    Build {
        #[command(flatten)]
        target: TargetArgs,

        /// Sign the AppImage with gpg
        #[arg(long)]
        sign: bool,

        /// gpg key to sign with (implies --sign)
        #[arg(long, value_name = "KEY")]
        sign_key: Option<String>,

        /// Update information to embed, e.g. zsync|https://…/name.AppImage.zsync
        #[arg(long, value_name = "INFO")]
        update_info: Option<String>,

        /// Output directory (overrides the configured one)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Rebuild even if the AppImage already exists
        #[arg(short, long)]
        force: bool,

        /// Download archives again even if they are cached
        #[arg(long)]
        refresh: bool,

        /// Keep the work directory for inspection
        #[arg(long)]
        keep_workdir: bool,
    },

    /// Show what a build would download, without building
    #[command(display_order = 2)]
    Resolve {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run the builds listed in a JSON recipe
    #[command(display_order = 3)]
    Batch {
        /// Recipe file
        recipe: Option<PathBuf>,
    },

    /// Inspect or clear the download cache
    #[command(display_order = 10)]
    Cache {
        #[command(subcommand)]
        action: Option<CacheCommands>,
    },

    /// Get or set configuration
    #[command(display_order = 11)]
    Config {
        /// Configuration key (output-dir, cache-dir, appimagetool, sign-key, languages)
        key: Option<String>,

        /// Value to set
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheCommands {
    /// List cached archives
    #[command(alias = "ls")]
    List,

    /// Remove cached archives and leftover work directories
    Clean,
}
