//! Attachment relocation
//!
//! Walks an extracted note bundle and moves every non-markdown file into
//! its own uuid-named folder under `uploads/<run-id>/`, renaming it to a
//! sanitized form. The resulting [`Relocation`] records where each
//! attachment went so link rewriting can find it again.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;
use walkdir::WalkDir;

use super::sanitize::sanitize_filename;

/// Root folder all attachments end up under.
pub const UPLOADS_DIR: &str = "uploads";

const MARKDOWN_EXT: &str = "md";

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("failed to walk directory tree")]
    Walk(#[from] walkdir::Error),

    #[error("failed to move {} to {}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A single attachment move, both paths relative to the bundle root.
#[derive(Debug, Clone)]
pub struct Move {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Opaque handle to one relocated attachment inside a [`Relocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRef(usize);

/// Mapping from original attachment locations to their new homes under
/// `uploads/`.
///
/// Built once by [`relocate_attachments`]; afterwards the only mutation is
/// [`rename`](Relocation::rename), which keeps the indexes consistent while
/// the rewriter aligns filenames with the export naming convention.
///
/// Lookups are exact-match indexes. When two originals sanitize to the same
/// filename, the first one wins and the name is recorded in
/// [`collisions`](Relocation::collisions).
#[derive(Debug)]
pub struct Relocation {
    root: PathBuf,
    run_dir: PathBuf,
    moves: Vec<Move>,
    original_index: HashMap<PathBuf, usize>,
    name_index: HashMap<String, usize>,
    collisions: Vec<String>,
    renamed: HashSet<usize>,
}

impl Relocation {
    fn new(root: PathBuf, run_dir: PathBuf) -> Self {
        Self {
            root,
            run_dir,
            moves: Vec::new(),
            original_index: HashMap::new(),
            name_index: HashMap::new(),
            collisions: Vec::new(),
            renamed: HashSet::new(),
        }
    }

    fn insert(&mut self, from: PathBuf, to: PathBuf, sanitized: String) {
        let idx = self.moves.len();
        self.original_index.insert(from.clone(), idx);
        match self.name_index.entry(sanitized) {
            Entry::Occupied(occupied) => self.collisions.push(occupied.key().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(idx);
            }
        }
        self.moves.push(Move { from, to });
    }

    /// The run's uploads folder, relative to the bundle root.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Every move performed, in walk order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Sanitized filenames that collided during indexing (first entry kept).
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    /// Looks up an attachment by the sanitized filename it had before
    /// relocation.
    pub fn by_name(&self, sanitized: &str) -> Option<AttachmentRef> {
        self.name_index.get(sanitized).copied().map(AttachmentRef)
    }

    /// Looks up an attachment by its pre-relocation path relative to the
    /// bundle root.
    pub fn by_original_path(&self, original: &Path) -> Option<AttachmentRef> {
        self.original_index.get(original).copied().map(AttachmentRef)
    }

    /// Current location of an attachment, relative to the bundle root.
    pub fn current_path(&self, attachment: AttachmentRef) -> &Path {
        &self.moves[attachment.0].to
    }

    /// Renames a relocated attachment inside its folder, keeping the
    /// mapping in sync. Returns the attachment's path relative to the
    /// bundle root.
    ///
    /// The first rename wins: once an attachment has been claimed, later
    /// calls return its existing location unchanged so previously written
    /// links never dangle.
    pub fn rename(&mut self, attachment: AttachmentRef, file_name: &str) -> io::Result<&Path> {
        let idx = attachment.0;
        if !self.renamed.contains(&idx) {
            let entry = &mut self.moves[idx];
            let new_rel = entry.to.with_file_name(file_name);
            if new_rel != entry.to {
                fs::rename(self.root.join(&entry.to), self.root.join(&new_rel))?;
                entry.to = new_rel;
            }
            self.renamed.insert(idx);
        }
        Ok(&self.moves[idx].to)
    }
}

/// Moves every attachment in the tree under `root` into
/// `uploads/<run-id>/<attachment-id>/<sanitized-name>`.
///
/// Markdown files and anything already under `uploads/` stay put. Returns
/// the mapping the link rewriter consumes.
pub fn relocate_attachments(root: &Path) -> Result<Relocation, RelocateError> {
    if !root.exists() {
        return Err(RelocateError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(RelocateError::RootNotDirectory(root.to_path_buf()));
    }

    let run_dir = PathBuf::from(UPLOADS_DIR).join(Uuid::new_v4().to_string());
    fs::create_dir_all(root.join(&run_dir))?;

    // Collect before moving: moving during the walk would revisit the same
    // files under uploads/.
    let mut attachments = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if relative.starts_with(UPLOADS_DIR) {
            continue;
        }
        if relative.extension().is_some_and(|e| e == MARKDOWN_EXT) {
            continue;
        }
        attachments.push(relative);
    }

    let mut relocation = Relocation::new(root.to_path_buf(), run_dir);

    for original in attachments {
        let file_name = original
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let sanitized = sanitize_filename(&file_name);

        let folder = relocation.run_dir.join(Uuid::new_v4().to_string());
        fs::create_dir_all(root.join(&folder))?;

        let destination = folder.join(&sanitized);
        fs::rename(root.join(&original), root.join(&destination)).map_err(|source| {
            RelocateError::Move {
                from: original.clone(),
                to: destination.clone(),
                source,
            }
        })?;

        relocation.insert(original, destination, sanitized);
    }

    Ok(relocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn moves_attachments_under_uploads() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.png");
        touch(dir.path(), "deep/nested/scan.pdf");

        let relocation = relocate_attachments(dir.path()).unwrap();

        assert_eq!(relocation.moves().len(), 2);
        for mv in relocation.moves() {
            assert!(mv.to.starts_with(UPLOADS_DIR));
            assert!(dir.path().join(&mv.to).is_file());
            assert!(!dir.path().join(&mv.from).exists());
        }
    }

    #[test]
    fn markdown_files_stay_put() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "note.md");
        touch(dir.path(), "sub/other.md");

        let relocation = relocate_attachments(dir.path()).unwrap();

        assert!(relocation.moves().is_empty());
        assert!(dir.path().join("note.md").is_file());
        assert!(dir.path().join("sub/other.md").is_file());
    }

    #[test]
    fn sanitizes_moved_filenames() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "my photo (1).png");

        let relocation = relocate_attachments(dir.path()).unwrap();

        let mv = &relocation.moves()[0];
        assert_eq!(
            mv.to.file_name().unwrap().to_str().unwrap(),
            "my_photo__1_.png"
        );
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = relocate_attachments(&missing).unwrap_err();
        assert!(matches!(err, RelocateError::RootNotFound(_)));
    }

    #[test]
    fn file_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        let err = relocate_attachments(&file).unwrap_err();
        assert!(matches!(err, RelocateError::RootNotDirectory(_)));
    }

    #[test]
    fn name_collisions_keep_first_entry() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/diagram.png");
        touch(dir.path(), "b/diagram.png");

        let relocation = relocate_attachments(dir.path()).unwrap();

        assert_eq!(relocation.collisions(), ["diagram.png"]);
        let first = relocation.by_name("diagram.png").unwrap();
        assert_eq!(
            relocation.moves()[0].to,
            relocation.current_path(first).to_path_buf()
        );
    }

    #[test]
    fn original_path_index_keeps_both_copies() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/diagram.png");
        touch(dir.path(), "b/diagram.png");

        let relocation = relocate_attachments(dir.path()).unwrap();

        let a = relocation.by_original_path(Path::new("a/diagram.png")).unwrap();
        let b = relocation.by_original_path(Path::new("b/diagram.png")).unwrap();
        assert_ne!(relocation.current_path(a), relocation.current_path(b));
    }

    #[test]
    fn existing_uploads_content_is_untouched() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "uploads/old/asset.png");
        touch(dir.path(), "fresh.png");

        let relocation = relocate_attachments(dir.path()).unwrap();

        assert_eq!(relocation.moves().len(), 1);
        assert!(dir.path().join("uploads/old/asset.png").is_file());
    }

    #[test]
    fn rename_moves_file_and_updates_mapping() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.png");

        let mut relocation = relocate_attachments(dir.path()).unwrap();
        let attachment = relocation.by_name("photo.png").unwrap();

        let renamed = relocation
            .rename(attachment, "note_photo.png")
            .unwrap()
            .to_path_buf();

        assert_eq!(
            renamed.file_name().unwrap().to_str().unwrap(),
            "note_photo.png"
        );
        assert!(dir.path().join(&renamed).is_file());
        assert_eq!(relocation.current_path(attachment), renamed.as_path());
    }

    #[test]
    fn second_rename_keeps_the_first_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.png");

        let mut relocation = relocate_attachments(dir.path()).unwrap();
        let attachment = relocation.by_name("photo.png").unwrap();

        relocation.rename(attachment, "a_photo.png").unwrap();
        let kept = relocation
            .rename(attachment, "b_photo.png")
            .unwrap()
            .to_path_buf();

        assert_eq!(kept.file_name().unwrap().to_str().unwrap(), "a_photo.png");
        assert!(dir.path().join(&kept).is_file());
    }
}
