//! Zip archive packing and unpacking
//!
//! The bundle is treated as an opaque tree: extraction inflates the input
//! archive into a working directory, and packing deflates the transformed
//! tree back into a fresh archive. Entry names always use forward slashes.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to walk directory tree")]
    Walk(#[from] walkdir::Error),

    #[error("archive entry escapes the extraction directory: {0}")]
    UnsafeEntry(String),
}

/// Extracts a zip archive into `dest`, creating directories as needed.
///
/// Entries whose names would escape `dest` are rejected outright.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive)?;
    let mut archive = ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ArchiveError::UnsafeEntry(entry.name().to_string()));
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut entry, &mut outfile)?;
        }
    }

    Ok(())
}

/// Packs the tree under `dir` into a deflate-compressed zip at `output`,
/// including empty directories.
pub fn pack(dir: &Path, output: &Path) -> Result<(), ArchiveError> {
    let file = File::create(output)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else {
            zip.start_file(name.as_str(), options)?;
            let mut input = File::open(path)?;
            io::copy(&mut input, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn pack_and_extract_round_trip() {
        let source = TempDir::new().unwrap();
        write(source.path(), "note.md", b"# Hello\n");
        write(source.path(), "deep/nested/photo.png", b"\x89PNG");
        fs::create_dir_all(source.path().join("empty")).unwrap();

        let work = TempDir::new().unwrap();
        let archive = work.path().join("bundle.zip");
        pack(source.path(), &archive).unwrap();

        let dest = TempDir::new().unwrap();
        extract(&archive, dest.path()).unwrap();

        assert_eq!(
            fs::read(dest.path().join("note.md")).unwrap(),
            b"# Hello\n"
        );
        assert_eq!(
            fs::read(dest.path().join("deep/nested/photo.png")).unwrap(),
            b"\x89PNG"
        );
        assert!(dest.path().join("empty").is_dir());
    }

    #[test]
    fn extract_missing_archive_fails() {
        let dir = TempDir::new().unwrap();
        let result = extract(&dir.path().join("missing.zip"), dir.path());
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }

    #[test]
    fn extract_rejects_invalid_archive() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, b"not a zip").unwrap();

        let result = extract(&bogus, dir.path());
        assert!(matches!(result, Err(ArchiveError::Zip(_))));
    }
}
