use std::path::Path;

/// Input extensions accepted for conversion
pub const ALLOWED_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Extension given to converted artifacts
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Checks whether a client-supplied filename ends in an accepted extension
/// (case-insensitive)
pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Sanitizes a client-supplied filename for on-disk storage.
///
/// Strips any path components, then replaces every character outside
/// `[A-Za-z0-9.]` with `-`. The original name is untrusted and display-only;
/// only the sanitized form ever touches the filesystem.
pub fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect()
}

/// Builds the collision-resistant staged name: `<unix-millis>-<sanitized>`
pub fn staged_filename(timestamp_millis: i64, original: &str) -> String {
    format!("{}-{}", timestamp_millis, sanitize_filename(original))
}

/// Maps a staged name to its converted counterpart: same basename, `.jpg`
pub fn converted_filename(stored_name: &str) -> String {
    match Path::new(stored_name).file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => format!("{}.{}", stem, OUTPUT_EXTENSION),
        _ => format!("{}.{}", stored_name, OUTPUT_EXTENSION),
    }
}
