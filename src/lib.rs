//! Notepack - normalize exported note archives
//!
//! Notepack takes a zip export of markdown notes with attached media and
//! produces a canonical layout: every attachment moved into its own
//! uniquely-named folder under `uploads/`, and every markdown image
//! reference rewritten to point at the relocated file.

pub mod archive;
pub mod cli;
pub mod convert;

pub use convert::{Relocation, RewriteReport};
