//! Markdown link rewriting
//!
//! Scans every markdown file in the bundle for attachment references of
//! the form `![alt](target)`, optionally trailed by a `{...}` attribute
//! block, and points each resolved reference at the attachment's relocated
//! path. References that cannot be resolved are left byte-for-byte
//! unchanged and reported back to the caller.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;
use walkdir::WalkDir;

use super::relocate::{AttachmentRef, Relocation};
use super::sanitize::{sanitize, sanitize_filename};

const MARKDOWN_EXT: &str = "md";

/// Extensions rendered as bracketed video links instead of image embeds.
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4"];

/// A successfully rewritten reference.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// Markdown file, relative to the bundle root.
    pub document: PathBuf,
    /// The link target as originally written.
    pub target: String,
    /// The relocated attachment path the reference now points at.
    pub new_path: PathBuf,
}

/// A reference whose derived filename had no relocated counterpart.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedReference {
    pub document: PathBuf,
    pub target: String,
}

/// Outcome of a rewrite pass over the whole bundle.
#[derive(Debug, Default)]
pub struct RewriteReport {
    pub rewrites: Vec<Rewrite>,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Rewrites attachment references in every markdown file under `root`.
///
/// Matched attachments are renamed to the filename the export naming
/// convention implies, so the link and the file agree.
/// Documents are only written back when their content actually changed.
pub fn rewrite_links(root: &Path, relocation: &mut Relocation) -> Result<RewriteReport> {
    let pattern = Regex::new(r"!\[[^\]]*\]\(([^)]+)\)(\s*\{[^}]*\})?").unwrap();

    let mut documents = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.context("failed to walk directory tree")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if relative.extension().is_some_and(|e| e == MARKDOWN_EXT) {
            documents.push(relative);
        }
    }

    let mut report = RewriteReport::default();

    for document in documents {
        let path = root.join(&document);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", document.display()))?;

        // First pass: decide a replacement for each distinct reference text,
        // renaming the matched attachment as a side effect.
        let mut replacements: HashMap<String, String> = HashMap::new();
        let mut seen = HashSet::new();
        for caps in pattern.captures_iter(&content) {
            let reference = caps[0].to_string();
            if !seen.insert(reference.clone()) {
                continue;
            }
            let target = caps[1].to_string();

            let expected = expected_file_name(&document, &target);
            let Some(attachment) = resolve(relocation, &document, &target, &expected) else {
                report.unresolved.push(UnresolvedReference {
                    document: document.clone(),
                    target,
                });
                continue;
            };

            let new_path = relocation
                .rename(attachment, &expected)
                .with_context(|| format!("failed to rename attachment for {}", target))?
                .to_path_buf();

            replacements.insert(reference, render(&target, &new_path));
            report.rewrites.push(Rewrite {
                document: document.clone(),
                target,
                new_path,
            });
        }

        if replacements.is_empty() {
            continue;
        }

        // Second pass: substitute every occurrence in one sweep so a
        // reference with an attribute block is never clobbered by its
        // attribute-less twin.
        let updated = pattern.replace_all(&content, |caps: &Captures| {
            replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });

        if updated != content {
            fs::write(&path, updated.as_bytes())
                .with_context(|| format!("failed to write {}", document.display()))?;
        }
    }

    Ok(report)
}

/// Derives the attachment filename implied by the export naming convention:
/// the document stem minus any leading ordering prefix (`"01 Intro.md"` →
/// `"Intro"`), joined to the target's basename with an underscore, then
/// sanitized.
fn expected_file_name(document: &Path, target: &str) -> String {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    // The ordering prefix is digits plus the whitespace after them; a stem
    // with no digits keeps its leading whitespace.
    let cleaned = stem.trim_start_matches(|c: char| c.is_ascii_digit());
    let cleaned = if cleaned.len() < stem.len() {
        cleaned.trim_start()
    } else {
        cleaned
    };
    sanitize_filename(&format!("{}_{}", cleaned, target_basename(target)))
}

/// Looks up the relocated attachment for a reference: first by the derived
/// expected filename, then by the target resolved against the document's
/// directory.
fn resolve(
    relocation: &Relocation,
    document: &Path,
    target: &str,
    expected: &str,
) -> Option<AttachmentRef> {
    if let Some(found) = relocation.by_name(expected) {
        return Some(found);
    }
    let document_dir = document.parent().unwrap_or_else(|| Path::new(""));
    let origin = normalize(document_dir.join(target));
    relocation.by_original_path(&origin)
}

/// Builds the replacement reference text for a resolved attachment.
///
/// Video files become bracketed links with a fixed dimension annotation;
/// everything else is a plain image embed. Attribute blocks never survive.
fn render(target: &str, new_path: &Path) -> String {
    let link = forward_slashes(new_path);
    if is_video(new_path) {
        format!("[{} 640x480]({})", sanitize(&target_basename(target)), link)
    } else {
        format!("![]({})", link)
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

fn target_basename(target: &str) -> String {
    Path::new(target)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.to_string())
}

/// Resolves `.` and `..` components lexically, without touching the
/// filesystem.
fn normalize(path: PathBuf) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
