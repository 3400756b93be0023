//! # Command-Line Interface
//!
//! The user-facing surface of stepsort.
//!
//! ```bash
//! stepsort model.step                 # writes model_sorted.step
//! stepsort model.step out.step        # explicit output file
//! stepsort --in-place model.step      # overwrite the source
//! stepsort parts/ --out-dir sorted/   # batch, mirrors sub-folders
//! stepsort model.step --group none    # pure dependency order
//! stepsort model.step --no-renum      # keep original identifiers
//! ```
//!
//! A failing file is reported and skipped; the batch continues and
//! the process exits nonzero if anything failed. Cycle warnings go to
//! stderr and do not fail the file.
//!
//! Every run supports `--format json` for machine-readable per-file
//! reports and `--verbose` for debug tracing.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute.

mod app;
mod output;
mod process;

pub use app::{run, Cli};
pub use output::{Output, OutputFormat};
pub use process::{discover, is_step_file, process_file, Destination, FileReport, Options};
