//! File name handling
//!
//! Client-supplied names are reduced to a single path component so every
//! stored file sits directly under the storage root.

use super::types::{StorageError, MAX_FILE_NAME_BYTES};

/// Reduce a client-supplied name to a bare file name.
///
/// Directory parts are dropped (`../../etc/passwd` becomes `passwd`,
/// `C:\tmp\a.csv` becomes `a.csv`). Names that are empty, `.`/`..`, too long,
/// or contain control characters or `:` are refused. `:` is the separator of
/// the backend command line.
pub fn sanitize_file_name(raw: &str) -> Result<String, StorageError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.len() > MAX_FILE_NAME_BYTES
        || name.chars().any(|c| c.is_control() || c == ':');

    if invalid {
        return Err(StorageError::InvalidFileName(raw.to_string()));
    }

    Ok(name.to_string())
}

/// The `n`th candidate name: `report.csv`, `report-1.csv`, `report-2.csv`...
///
/// The stem is shortened when needed so a candidate never exceeds
/// [`MAX_FILE_NAME_BYTES`].
pub fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }

    let suffix = format!("-{}", n);
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot + suffix.len() < MAX_FILE_NAME_BYTES => {
            name.split_at(dot)
        }
        _ => (name, ""),
    };

    let budget = MAX_FILE_NAME_BYTES - suffix.len() - ext.len();
    format!("{}{}{}", truncate_at_char(stem, budget), suffix, ext)
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
fn truncate_at_char(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max)
        .last()
        .unwrap_or(0);
    &s[..end]
}
