//! Wire format of the backend command channel
//!
//! ```text
//! PROCESS_FILE:<path>\n
//! ```
//!
//! One ASCII line per connection, no length prefix, no acknowledgment.

use super::NotifyError;

pub const PROCESS_FILE_COMMAND: &str = "PROCESS_FILE";

/// Frame a `PROCESS_FILE` command for `path`.
pub fn encode_process_file(path: &str) -> Result<Vec<u8>, NotifyError> {
    if path.is_empty() || path.contains(['\r', '\n']) {
        return Err(NotifyError::InvalidPath(path.to_string()));
    }

    let mut frame = Vec::with_capacity(PROCESS_FILE_COMMAND.len() + path.len() + 2);
    frame.extend_from_slice(PROCESS_FILE_COMMAND.as_bytes());
    frame.push(b':');
    frame.extend_from_slice(path.as_bytes());
    frame.push(b'\n');
    Ok(frame)
}

/// Join the configured prefix and a storage-relative path with `/`.
pub fn backend_path(prefix: &str, relative_path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative_path.to_string()
    } else {
        format!("{}/{}", prefix, relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let frame = encode_process_file("report.csv").unwrap();
        assert_eq!(frame, b"PROCESS_FILE:report.csv\n");
    }

    #[test]
    fn test_line_breaks_rejected() {
        assert!(matches!(
            encode_process_file("a.csv\nPROCESS_FILE:/etc/passwd"),
            Err(NotifyError::InvalidPath(_))
        ));
        assert!(encode_process_file("a.csv\r").is_err());
        assert!(encode_process_file("").is_err());
    }

    #[test]
    fn test_backend_path_prefix() {
        assert_eq!(backend_path("", "report.csv"), "report.csv");
        assert_eq!(backend_path("shared", "report.csv"), "shared/report.csv");
        assert_eq!(backend_path("shared/", "report.csv"), "shared/report.csv");
    }
}
