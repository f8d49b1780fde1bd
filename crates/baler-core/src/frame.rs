//! Frame grammar.
//!
//! A shard is a concatenation of frames, each serialized as
//!
//! ```text
//! \n<delimiter><relative path>\n<raw file bytes>
//! ```
//!
//! The decoder recognizes a frame boundary by a literal prefix match of the
//! delimiter at the start of a line. Content lines that themselves begin with
//! the delimiter are therefore misread as boundaries; [`crate::gate`] counts
//! such lines so the encoder can warn about them.

use crate::{BalerError, Result};
use std::path::{Component, Path, PathBuf};

/// Render the header that opens a frame.
pub fn header(delimiter: &str, relative_path: &str) -> String {
    format!("\n{delimiter}{relative_path}\n")
}

/// Total on-disk size of a frame.
pub fn frame_len(delimiter: &str, relative_path: &str, content_len: u64) -> u64 {
    // leading newline + delimiter + path + newline
    (delimiter.len() + relative_path.len() + 2) as u64 + content_len
}

/// Length of the header line as the decoder scans it: delimiter and path,
/// without the surrounding newlines.
pub fn header_line_len(delimiter: &str, relative_path: &str) -> u64 {
    (delimiter.len() + relative_path.len()) as u64
}

/// If `line` opens a frame, return the (trimmed) relative path bytes.
pub fn parse_delimiter_line<'a>(line: &'a [u8], delimiter: &str) -> Option<&'a [u8]> {
    line.strip_prefix(delimiter.as_bytes()).map(<[u8]>::trim_ascii)
}

/// Whether a content line would be mistaken for a frame boundary.
pub fn collides_with_delimiter(line: &[u8], delimiter: &str) -> bool {
    line.starts_with(delimiter.as_bytes())
}

/// Whether `relative_path` survives a write/parse cycle unchanged.
///
/// Line breaks would split the header and surrounding whitespace is trimmed
/// by the decoder.
pub fn is_representable(relative_path: &str) -> bool {
    !relative_path.is_empty()
        && !relative_path.contains(['\n', '\r'])
        && relative_path.trim() == relative_path
}

/// Turn a decoded frame path into a path below the destination root.
///
/// Rejects empty, absolute, and parent-escaping paths.
pub fn validate_frame_path(raw: &[u8]) -> Result<PathBuf> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        BalerError::validation_with("frame path is not valid UTF-8", e)
    })?;
    if text.is_empty() {
        return Err(BalerError::validation("frame has an empty path"));
    }

    let path = Path::new(text);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BalerError::validation(format!(
                    "frame path '{text}' escapes the destination directory"
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(BalerError::validation(format!(
            "frame path '{text}' does not name a file"
        )));
    }
    Ok(clean)
}

/// `/`-separated form of a path relative to the tree root.
///
/// Returns `None` for non-UTF-8 names.
pub fn relative_key(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(header("// filename: ", "a.txt"), "\n// filename: a.txt\n");
        assert_eq!(
            frame_len("// filename: ", "a.txt", 3),
            header("// filename: ", "a.txt").len() as u64 + 3
        );
        assert_eq!(header_line_len("// filename: ", "a.txt"), 18);
    }

    #[test]
    fn test_parse_delimiter_line() {
        let d = "// filename: ";
        assert_eq!(
            parse_delimiter_line(b"// filename: src/main.rs", d),
            Some(&b"src/main.rs"[..])
        );
        assert_eq!(
            parse_delimiter_line(b"// filename:  padded.txt \r", d),
            Some(&b"padded.txt"[..])
        );
        assert_eq!(parse_delimiter_line(b"fn main() {}", d), None);
        assert_eq!(parse_delimiter_line(b" // filename: x", d), None);
    }

    #[test]
    fn test_representable_paths() {
        assert!(is_representable("src/lib.rs"));
        assert!(is_representable("dir with space/file.txt"));
        assert!(!is_representable(""));
        assert!(!is_representable("bad\nname"));
        assert!(!is_representable(" leading"));
        assert!(!is_representable("trailing "));
    }

    #[test]
    fn test_validate_frame_path() {
        assert_eq!(
            validate_frame_path(b"a/b/c.txt").unwrap(),
            PathBuf::from("a").join("b").join("c.txt")
        );
        assert_eq!(validate_frame_path(b"./a.txt").unwrap(), PathBuf::from("a.txt"));

        let bad_paths: [&[u8]; 6] = [b"", b"../x", b"a/../../x", b"/etc/passwd", b".", b"\xff"];
        for bad in bad_paths {
            let err = validate_frame_path(bad).unwrap_err();
            assert!(err.is_validation(), "{:?}", bad);
        }
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let path = Path::new("a").join("b").join("c.txt");
        assert_eq!(relative_key(&path).as_deref(), Some("a/b/c.txt"));
        assert_eq!(relative_key(Path::new("../x")), None);
    }
}
