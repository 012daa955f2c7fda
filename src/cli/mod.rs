//! CLI module for aerogrid
//!
//! Provides command-line interface for:
//! - scan: print the visible cells of a window
//! - chunks: print the chunk positions a window touches

mod args;
mod commands;
mod errors;
mod io;

pub use args::{parse_bound_list, parse_flag_list, Cli, Command, WindowArgs};
pub use commands::{chunks, init_logging, load_config, run, run_command, scan, window_from_args};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json_line;
