//! CLI command implementations
//!
//! Each command loads the array and optional predicate, builds the
//! filtered array from the window and writes JSON lines. Commands run
//! inside an `ObservationScope`, so logs show `SCAN_BEGIN` /
//! `SCAN_COMPLETE` (or `_FAILED`) around every run.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::array::{Array, ArrayDesc};
use crate::between::BetweenArray;
use crate::config::GridConfig;
use crate::expr::Predicate;
use crate::observability::{log_event, Event, Logger, ObservationScope};
use crate::operator::{chunk_positions, scan_cells, BetweenOperator, BetweenWindow};
use crate::storage::load_array;

use super::args::{parse_bound_list, parse_flag_list, Cli, Command, WindowArgs};
use super::errors::{CliError, CliResult};
use super::io::write_json_line;

/// Main CLI entry point
///
/// Parses arguments, installs the configuration and dispatches. This is
/// the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    init_logging();
    let cli = Cli::parse_args();
    let config = load_config(cli.config.as_deref())?;
    GridConfig::install(config.clone())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli.command, &config, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Keeps stdout for JSON result lines; every log line goes to stderr
pub fn init_logging() {
    Logger::route_all_to_stderr(true);
}

/// Reads the configuration file, or returns the defaults
pub fn load_config(path: Option<&Path>) -> CliResult<GridConfig> {
    match path {
        Some(path) => Ok(GridConfig::load(path)?),
        None => Ok(GridConfig::default()),
    }
}

/// Run one command, writing results to `out`
pub fn run_command(cmd: Command, config: &GridConfig, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        Command::Scan(args) => scan(&args, config, out),
        Command::Chunks { window, attribute } => chunks(&window, attribute, config, out),
    }
}

/// Print every visible cell
pub fn scan(args: &WindowArgs, config: &GridConfig, out: &mut dyn Write) -> CliResult<()> {
    let array_path = args.array.display().to_string();
    let scope = ObservationScope::with_fields("SCAN", &[("array", array_path.as_str())]);

    let result = open(args, config).and_then(|between| {
        let rows = scan_cells(&between)?;
        for row in &rows {
            write_json_line(&mut *out, row)?;
        }
        Ok((rows.len(), between))
    });

    match result {
        Ok((count, between)) => {
            scope.complete_with_fields(&[
                ("query_id", between.query_id().to_string().as_str()),
                ("rows", count.to_string().as_str()),
            ]);
            Ok(())
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

/// Print the chunk positions the grid cursor yields
pub fn chunks(
    args: &WindowArgs,
    attribute: Option<usize>,
    config: &GridConfig,
    out: &mut dyn Write,
) -> CliResult<()> {
    let array_path = args.array.display().to_string();
    let scope = ObservationScope::with_fields("CHUNKS", &[("array", array_path.as_str())]);

    let result = open(args, config).and_then(|between| {
        let attribute = attribute.unwrap_or_else(|| existence_attribute(between.desc()));
        let positions = chunk_positions(&between, attribute)?;
        for position in &positions {
            write_json_line(&mut *out, &json!({ "chunk": position }))?;
        }
        Ok((positions.len(), between))
    });

    match result {
        Ok((count, between)) => {
            let metrics = between.metrics().to_json();
            scope.complete_with_fields(&[
                ("chunks", count.to_string().as_str()),
                ("metrics", metrics.as_str()),
                ("query_id", between.query_id().to_string().as_str()),
            ]);
            Ok(())
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

/// Loads the inputs and applies the window
fn open(args: &WindowArgs, config: &GridConfig) -> CliResult<BetweenArray> {
    let array = load_array(&args.array)?;
    let array_path = args.array.display().to_string();
    log_event(
        Event::ArrayLoaded,
        &[
            ("array", array_path.as_str()),
            ("cells", array.cell_count().to_string().as_str()),
            ("chunks", array.chunk_positions().len().to_string().as_str()),
        ],
    );
    let input: Arc<dyn Array> = Arc::new(array);

    let window = window_from_args(args, input.desc())?;
    let predicate = match &args.predicate {
        Some(path) => Some(Predicate::load(path)?),
        None => None,
    };
    Ok(BetweenOperator::execute_with_config(
        input, predicate, &window, config,
    )?)
}

/// Builds the window; absent `--low`/`--high` leave every dimension open
pub fn window_from_args(args: &WindowArgs, desc: &ArrayDesc) -> CliResult<BetweenWindow> {
    let open_bounds = || vec![None; desc.num_dims()];
    let low = match &args.low {
        Some(text) => parse_bound_list(text)?,
        None => open_bounds(),
    };
    let high = match &args.high {
        Some(text) => parse_bound_list(text)?,
        None => open_bounds(),
    };
    let boundary = match &args.boundary {
        Some(text) => parse_flag_list(text)?,
        None => Vec::new(),
    };
    if low.len() != desc.num_dims() || high.len() != desc.num_dims() {
        return Err(CliError::invalid_argument(format!(
            "Array '{}' has {} dimensions; --low has {} and --high has {} entries",
            desc.name,
            desc.num_dims(),
            low.len(),
            high.len()
        )));
    }
    Ok(BetweenWindow::new(low, high).with_boundary(boundary))
}

fn existence_attribute(desc: &ArrayDesc) -> usize {
    desc.empty_bitmap_attribute().map_or(0, |a| a.id)
}
