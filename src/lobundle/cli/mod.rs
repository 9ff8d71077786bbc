//! # CLI Behavior
//!
//! One client of the lobundle library. The CLI is the only place that knows
//! about terminal I/O, exit codes and output formatting.
//!
//! For the overall architecture, see the crate-level documentation of `lobundle`.
//!
//! ## Naked Execution (`lobundle`)
//!
//! Running `lobundle` with no command prints the grouped help.
//!
//! ## Output Streams
//!
//! Command results and progress messages go to stdout. Error messages and
//! `tracing` diagnostics go to stderr; `-v` lowers the diagnostic level from
//! `WARN` to `DEBUG`.
//!
//! ## Exit Codes
//!
//! - `0`: success
//! - `1`: the command failed, or at least one batch entry failed
//! - `2`: the arguments did not parse
//!
//! ## Module Structure
//!
//! - `commands`: Per-command handlers that call the API and print results
//! - `print`: Output formatting (colors, tables, messages)
//! - `setup`: Argument parsing via clap, help text

mod commands;
mod print;
pub mod setup;

pub use commands::run;
