//! Archive conversion command
//!
//! Extracts the input archive into a temporary workspace, relocates
//! attachments, rewrites markdown links, and packs the result into
//! `<input-stem>_converted.zip` beside the input. The workspace is removed
//! on every exit path.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tempfile::TempDir;

use crate::archive;
use crate::convert::{relocate_attachments, rewrite_links};

use super::output::Output;

/// Converts a single note archive.
pub fn run(archive_path: &Path, strict: bool, output: &Output) -> Result<()> {
    if !archive_path.is_file() {
        bail!("archive not found: {}", archive_path.display());
    }

    // parent() is Some("") for a bare filename
    let parent = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let converted = parent.join(format!("{}_converted.zip", stem));

    // Dropped on every exit path, taking the extracted tree with it.
    let workspace = TempDir::new_in(parent).context("failed to create temporary workspace")?;
    output.verbose_ctx(
        "convert",
        &format!("Workspace: {}", workspace.path().display()),
    );

    archive::extract(archive_path, workspace.path())
        .with_context(|| format!("failed to extract {}", archive_path.display()))?;

    let mut relocation =
        relocate_attachments(workspace.path()).context("failed to relocate attachments")?;

    if !output.is_json() {
        for mv in relocation.moves() {
            println!("Moved {} -> {}", mv.from.display(), mv.to.display());
        }
    }
    for name in relocation.collisions() {
        output.warn(&format!(
            "duplicate attachment name '{}', keeping the first occurrence",
            name
        ));
    }

    let report = rewrite_links(workspace.path(), &mut relocation)
        .context("failed to rewrite markdown links")?;

    if !output.is_json() {
        for rewrite in &report.rewrites {
            println!(
                "Rewrote {} -> {} in {}",
                rewrite.target,
                rewrite.new_path.display(),
                rewrite.document.display()
            );
        }
    }
    for unresolved in &report.unresolved {
        output.warn(&format!(
            "no attachment found for '{}' in {}",
            unresolved.target,
            unresolved.document.display()
        ));
    }
    if strict && !report.unresolved.is_empty() {
        bail!(
            "{} unresolved reference(s), aborting (--strict)",
            report.unresolved.len()
        );
    }

    archive::pack(workspace.path(), &converted)
        .with_context(|| format!("failed to create {}", converted.display()))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "archive": converted.display().to_string(),
            "moved": relocation.moves().len(),
            "rewritten": report.rewrites.len(),
            "unresolved": report.unresolved,
        }));
    } else {
        output.success(&format!("Created archive: {}", converted.display()));
    }

    Ok(())
}
