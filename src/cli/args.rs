//! CLI argument definitions using clap
//!
//! Commands:
//! - aerogrid scan --array <file> [--low 5,5] [--high 25,25] [--boundary 1,0] [--predicate <file>]
//! - aerogrid chunks --array <file> [...same options] [--attribute <id>]
//!
//! `--config <file>` is accepted by every command.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::array::Coordinate;

use super::errors::{CliError, CliResult};

/// aerogrid - range-filtered iteration over chunked arrays
#[derive(Parser, Debug)]
#[command(name = "aerogrid")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every visible cell as one JSON object per line
    Scan(WindowArgs),

    /// Print the chunk positions the filtered array yields
    Chunks {
        #[command(flatten)]
        window: WindowArgs,

        /// Attribute to iterate (defaults to the existence attribute)
        #[arg(long)]
        attribute: Option<usize>,
    },
}

/// Input array and window shared by every command
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Path to the array JSON file
    #[arg(long)]
    pub array: PathBuf,

    /// Comma-separated low bounds; an empty entry leaves that dimension open
    #[arg(long)]
    pub low: Option<String>,

    /// Comma-separated high bounds; an empty entry leaves that dimension open
    #[arg(long)]
    pub high: Option<String>,

    /// Comma-separated boundary flags (1/0 or true/false)
    #[arg(long)]
    pub boundary: Option<String>,

    /// Path to a predicate JSON file
    #[arg(long)]
    pub predicate: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parses `5,,7` into `[Some(5), None, Some(7)]`
pub fn parse_bound_list(text: &str) -> CliResult<Vec<Option<Coordinate>>> {
    text.split(',')
        .map(|item| {
            let item = item.trim();
            if item.is_empty() {
                return Ok(None);
            }
            item.parse::<Coordinate>().map(Some).map_err(|_| {
                CliError::invalid_argument(format!("Invalid coordinate '{}' in '{}'", item, text))
            })
        })
        .collect()
}

/// Parses `1,0,true,false` into flags
pub fn parse_flag_list(text: &str) -> CliResult<Vec<bool>> {
    text.split(',')
        .map(|item| match item.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(CliError::invalid_argument(format!(
                "Invalid boundary flag '{}' in '{}'",
                other, text
            ))),
        })
        .collect()
}
