//! # Command-Line Interface
//!
//! Single-command surface: `notepack <archive.zip>` converts one exported
//! note archive and writes `<stem>_converted.zip` beside it.
//!
//! ## Output Formats
//!
//! The `--format` flag selects between:
//! - `text` (default) - line-per-action progress messages
//! - `json` - one machine-parseable summary object
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! notepack --verbose export.zip
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the conversion.

mod app;
mod convert_cmd;
mod output;

pub use app::{run, Cli};
pub use output::{Output, OutputFormat};
