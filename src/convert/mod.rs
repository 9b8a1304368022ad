//! # Bundle Conversion
//!
//! Core pipeline for normalizing an extracted note bundle.
//!
//! | Step | Purpose |
//! |------|---------|
//! | [`sanitize_filename`] | Transliterate attachment names to a filesystem-safe form |
//! | [`relocate_attachments`] | Move attachments into `uploads/<run>/<id>/` folders |
//! | [`rewrite_links`] | Point markdown references at the relocated files |
//!
//! Relocation runs to completion before any rewriting starts; the
//! [`Relocation`] mapping it builds is the only state shared between the
//! two steps.

mod relocate;
mod rewrite;
mod sanitize;

pub use relocate::{relocate_attachments, AttachmentRef, Move, RelocateError, Relocation, UPLOADS_DIR};
pub use rewrite::{rewrite_links, Rewrite, RewriteReport, UnresolvedReference};
pub use sanitize::{sanitize, sanitize_filename};
