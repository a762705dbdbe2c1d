//! File name sanitization
//!
//! Book titles and URL path segments become file names on disk. Characters
//! that are illegal on common filesystems are removed, reserved device names
//! get a suffix, and the result is capped at 255 bytes.

use percent_encoding::percent_decode_str;
use url::Url;

const MAX_FILENAME_BYTES: usize = 255;

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Makes a string safe to use as a single file name
///
/// Returns an empty string if nothing usable is left.
///
/// # Example
///
/// ```
/// use tululu_catalog::url::sanitize_filename;
///
/// assert_eq!(sanitize_filename("12_Why? Because: yes.txt"), "12_Why Because yes.txt");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !is_illegal(*c))
        .collect();

    // Windows silently drops trailing dots and spaces
    let cleaned = cleaned.trim().trim_end_matches(['.', ' ']).to_string();

    let cleaned = if is_reserved(&cleaned) {
        match cleaned.split_once('.') {
            Some((stem, rest)) => format!("{}_.{}", stem, rest),
            None => format!("{}_", cleaned),
        }
    } else {
        cleaned
    };

    truncate_preserving_extension(&cleaned, MAX_FILENAME_BYTES)
}

/// Derives a file name from the last path segment of a URL
///
/// Query strings and fragments are ignored. Returns `None` when the URL path
/// ends with a slash or sanitizes to nothing.
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let name = sanitize_filename(&decoded);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn is_illegal(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

fn truncate_preserving_extension(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 && name.len() - pos <= 16 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    let budget = max_bytes.saturating_sub(ext.len());
    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &stem[..end], ext)
}
