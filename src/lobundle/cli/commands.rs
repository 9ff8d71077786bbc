//! # CLI Layer
//!
//! Per-command handlers. Each one:
//!
//! 1. Converts parsed arguments into library types
//! 2. Calls the matching `BundleApi` method
//! 3. Prints the returned `CmdResult`
//!
//! Nothing in here decides how a bundle is built.

use super::print::{print_builds, print_cached, print_config, print_messages, print_resolved};
use super::setup::{
    print_command_help, print_grouped_help, print_subcommand_help, CacheCommands, Cli, Commands,
    TargetArgs,
};
use clap::Parser;
use directories::ProjectDirs;
use lobundle::api::{BundleApi, BundlePaths, ConfigAction};
use lobundle::config::BundleConfig;
use lobundle::error::{BundleError, Result};
use lobundle::model::BuildOptions;
use lobundle::remote::http::HttpRemote;
use lobundle::tools::system::SystemToolchain;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

struct AppContext {
    api: BundleApi<HttpRemote, SystemToolchain>,
}

struct BuildFlags {
    sign: bool,
    sign_key: Option<String>,
    update_info: Option<String>,
    output_dir: Option<PathBuf>,
    force: bool,
    refresh: bool,
    keep_workdir: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.help {
        print_subcommand_help(&cli.command);
        return Ok(());
    }
    let Some(command) = cli.command else {
        print_grouped_help();
        return Ok(());
    };

    init_tracing(cli.verbose);
    let mut ctx = init_context(cli.config.as_deref())?;

    match command {
        Commands::Build {
            target,
            sign,
            sign_key,
            update_info,
            output_dir,
            force,
            refresh,
            keep_workdir,
        } => handle_build(
            &ctx,
            target,
            BuildFlags {
                sign,
                sign_key,
                update_info,
                output_dir,
                force,
                refresh,
                keep_workdir,
            },
        ),
        Commands::Resolve { target } => handle_resolve(&ctx, target),
        Commands::Batch { recipe } => match recipe {
            Some(recipe) => handle_batch(&ctx, &recipe),
            None => Err(BundleError::Validation(
                "batch needs a recipe file: lobundle batch <RECIPE>".to_string(),
            )),
        },
        Commands::Cache { action } => handle_cache(&ctx, action),
        Commands::Config { key, value } => handle_config(&mut ctx, key, value),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();
}

fn init_context(config_override: Option<&Path>) -> Result<AppContext> {
    let proj_dirs = ProjectDirs::from("org", "lobundle", "lobundle");

    let config_dir = match (config_override, &proj_dirs) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dirs)) => dirs.config_dir().to_path_buf(),
        (None, None) => {
            return Err(BundleError::Config(
                "Could not determine config directory, pass --config".to_string(),
            ))
        }
    };
    let config = BundleConfig::load(&config_dir)?;

    let cache_dir = match (&config.cache_dir, &proj_dirs) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dirs)) => dirs.cache_dir().to_path_buf(),
        (None, None) => {
            return Err(BundleError::Config(
                "Could not determine cache directory, set cache-dir".to_string(),
            ))
        }
    };
    debug!(config = %config_dir.display(), cache = %cache_dir.display(), "directories");

    let tools = SystemToolchain::new(config.appimagetool.clone());
    let paths = BundlePaths {
        config_dir,
        cache_dir,
    };
    let api = BundleApi::new(HttpRemote::new()?, tools, config, paths);

    Ok(AppContext { api })
}

fn handle_build(ctx: &AppContext, target: TargetArgs, flags: BuildFlags) -> Result<()> {
    let mut options = BuildOptions::new(target.query);
    options.arch = target.arch;
    options.languages = match target.languages {
        Some(languages) => languages,
        None => ctx.api.config_ref().default_language_set()?,
    };
    options.help = target.help_pack;
    options.sign = flags.sign || flags.sign_key.is_some();
    options.sign_key = flags.sign_key;
    options.update_info = flags.update_info;
    options.output_dir = flags.output_dir;
    options.force = flags.force;
    options.refresh = flags.refresh;
    options.keep_workdir = flags.keep_workdir;

    let result = ctx.api.build(&options)?;
    print_messages(&result.messages);
    print_builds(&result.builds);
    Ok(())
}

fn handle_resolve(ctx: &AppContext, target: TargetArgs) -> Result<()> {
    let languages = match target.languages {
        Some(languages) => languages,
        None => ctx.api.config_ref().default_language_set()?,
    };
    let result = ctx
        .api
        .resolve(&target.query, target.arch, &languages, target.help_pack)?;
    if let Some(resolved) = &result.resolved {
        print_resolved(resolved);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_batch(ctx: &AppContext, recipe: &Path) -> Result<()> {
    let result = ctx.api.batch_file(recipe)?;
    print_builds(&result.builds);
    print_messages(&result.messages);

    if result.failures > 0 {
        return Err(BundleError::Validation(format!(
            "{} batch build(s) failed",
            result.failures
        )));
    }
    Ok(())
}

fn handle_cache(ctx: &AppContext, action: Option<CacheCommands>) -> Result<()> {
    let result = match action {
        Some(CacheCommands::List) => ctx.api.cache_list()?,
        Some(CacheCommands::Clean) => ctx.api.cache_clean()?,
        None => {
            print_command_help("cache");
            return Ok(());
        }
    };
    print_cached(&result.cached);
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(&config.entries());
        }
    }
    print_messages(&result.messages);
    Ok(())
}
