//! # lobundle Architecture
//!
//! lobundle turns the RPM tarballs The Document Foundation publishes into a
//! single LibreOffice AppImage. The core is a library; the `lobundle` binary is
//! one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Owns remote, toolchain, config and paths                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - build, resolve, batch, cache, config                     │
//! │  - Returns Result<CmdResult>, never prints                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Outside World (remote/, tools/)                            │
//! │  - Remote: HttpRemote (production), MemoryRemote (tests)    │
//! │  - Toolchain: SystemToolchain, RecordingToolchain (tests)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## A Build, Step by Step
//!
//! 1. [`resolve`] turns a query (`fresh`, `still`, `daily`, `7.6`,
//!    `7.6.4.1`) into a [`model::Release`] by reading mirror listings, then
//!    picks the language and help packs that exist for it.
//! 2. `commands::build` downloads the archives into the cache.
//! 3. [`archive`] unpacks them and filters the RPMs.
//! 4. The [`tools::Toolchain`] extracts each RPM into an AppDir.
//! 5. [`appdir`] adds `AppRun`, the icon and a rewritten [`desktop`] entry.
//! 6. The toolchain runs appimagetool; [`checksum`] writes the `.sha256`.
//!
//! ## Testing Strategy
//!
//! Commands carry most of the tests. They run against `MemoryRemote` and
//! `RecordingToolchain`, so a full build is exercised with no network and no
//! external programs. The CLI is tested through the binary in `tests/`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`resolve`]: Query → release → archive URLs
//! - [`version`]: Version numbers and listing scraping
//! - [`model`]: Channels, architectures, language sets, releases
//! - [`remote`]: Mirror access
//! - [`archive`]: Tarball unpacking and package filtering
//! - [`tools`]: rpm2cpio/cpio and appimagetool
//! - [`appdir`]: AppDir layout and assembly
//! - [`desktop`]: Desktop entry rewriting
//! - [`checksum`]: SHA-256 sidecar files
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
pub mod appdir;
pub mod archive;
pub mod checksum;
pub mod commands;
pub mod config;
pub mod desktop;
pub mod error;
pub mod model;
pub mod remote;
pub mod resolve;
pub mod tools;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;
