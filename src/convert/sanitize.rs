//! Filename sanitization
//!
//! Names from note exports can contain unicode, spaces, and punctuation
//! that break relative links once files are moved around. Sanitization
//! transliterates to ASCII and restricts names to `[A-Za-z0-9_-]`, keeping
//! the extension separator intact so file types stay recognizable.

use deunicode::deunicode;

/// Transliterates `name` to ASCII and replaces every character outside
/// `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    deunicode(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitizes a filename while preserving its extension.
///
/// `"Мой Файл.PNG"` becomes `"Moi_Fail.PNG"`. Names without an extension
/// (including dotfiles like `.gitignore`) are sanitized as a whole.
pub fn sanitize_filename(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}.{}", sanitize(stem), sanitize(ext))
        }
        _ => sanitize(name),
    }
}
