//! Filename generation and manipulation.

use crate::error::{Error, Result};

/// Longest file stem kept from a post title, in bytes.
///
/// Leaves room for a `_N` counter and an extension under the 255-byte name
/// limit of common filesystems.
pub const MAX_STEM_BYTES: usize = 200;

/// Turn a post title into a safe file stem.
///
/// Path separators and characters that are invalid on common filesystems are
/// replaced, whitespace runs are collapsed and the result is truncated to
/// [`MAX_STEM_BYTES`] on a char boundary. Titles that sanitize to nothing are
/// rejected.
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = truncate_to_bytes(&collapsed, MAX_STEM_BYTES);

    // Windows refuses trailing dots and spaces.
    let sanitized = truncated.trim_end_matches(&['.', ' '][..]).trim_start();

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(Error::InvalidFilename(format!(
            "Filename '{}' is empty after sanitizing",
            name
        )));
    }

    Ok(sanitized.to_string())
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a char.
fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Sanitize a path component (folder name) with less strict validation.
///
/// This is used for creator names where we want to sanitize rather than
/// reject on certain characters.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Join a stem and an extension.
pub fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// Insert a counter before the extension: `clip.mp4` → `clip_2.mp4`.
pub fn numbered_filename(filename: &str, counter: usize) -> String {
    match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => {
            format!("{}_{}{}", &filename[..dot_pos], counter, &filename[dot_pos..])
        }
        _ => format!("{}_{}", filename, counter),
    }
}
