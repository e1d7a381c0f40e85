// Drag payload parsing
// Extracts a local file path from a text/uri-list drop payload

use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve a drop payload to a local file path.
///
/// These are never surfaced to the user; the drop handler logs them and
/// does nothing further.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriListError {
    #[error("drop payload contained no URIs")]
    Empty,
    #[error("not a file URI: `{0}`")]
    NotAFileUri(String),
    #[error("invalid percent-encoding in `{0}`")]
    BadEscape(String),
}

/// Parse a `text/uri-list` payload into the first usable local path.
///
/// Entries are CRLF-separated and lines starting with '#' are comments
/// (RFC 2483). Only the first entry is considered, and only `file://`
/// URIs are accepted; the referenced file is never touched.
pub fn first_file_uri(payload: &str) -> Result<PathBuf, UriListError> {
    for line in payload.lines() {
        let line = line.trim_end_matches('\r').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let rest = line
            .strip_prefix("file://")
            .ok_or_else(|| UriListError::NotAFileUri(line.to_string()))?;
        // file URIs may carry a `localhost` authority; anything else is remote
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        if !rest.starts_with('/') {
            return Err(UriListError::NotAFileUri(line.to_string()));
        }

        let decoded =
            percent_decode(rest).ok_or_else(|| UriListError::BadEscape(line.to_string()))?;
        return Ok(PathBuf::from(decoded));
    }
    Err(UriListError::Empty)
}

/// Decode %XX escapes; None on truncated/malformed escapes or non-UTF-8
fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_val(*bytes.get(i + 1)?)?;
            let lo = hex_val(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn plain_file_uri() {
        assert_eq!(
            first_file_uri("file:///home/user/ticket.pdf").unwrap(),
            Path::new("/home/user/ticket.pdf")
        );
    }

    #[test]
    fn crlf_list_takes_the_first_entry() {
        let payload = "file:///a.pdf\r\nfile:///b.pdf\r\n";
        assert_eq!(first_file_uri(payload).unwrap(), Path::new("/a.pdf"));
    }

    #[test]
    fn comment_lines_are_skipped() {
        let payload = "# dropped from the file manager\r\nfile:///tmp/x";
        assert_eq!(first_file_uri(payload).unwrap(), Path::new("/tmp/x"));
    }

    #[test]
    fn localhost_authority_is_accepted() {
        assert_eq!(
            first_file_uri("file://localhost/tmp/x").unwrap(),
            Path::new("/tmp/x")
        );
    }

    #[test]
    fn percent_escapes_are_decoded() {
        assert_eq!(
            first_file_uri("file:///home/user/My%20Ticket%20%2842%29.pdf").unwrap(),
            Path::new("/home/user/My Ticket (42).pdf")
        );
    }

    #[test]
    fn non_file_schemes_are_rejected() {
        assert_eq!(
            first_file_uri("https://example.com/ticket.pdf"),
            Err(UriListError::NotAFileUri(
                "https://example.com/ticket.pdf".to_string()
            ))
        );
    }

    #[test]
    fn remote_hosts_are_rejected() {
        assert!(matches!(
            first_file_uri("file://nas.local/share/x"),
            Err(UriListError::NotAFileUri(_))
        ));
    }

    #[test]
    fn empty_payload_is_an_error() {
        assert_eq!(first_file_uri(""), Err(UriListError::Empty));
        assert_eq!(first_file_uri("\r\n# only comments\r\n"), Err(UriListError::Empty));
    }

    #[test]
    fn malformed_escapes_are_an_error() {
        assert!(matches!(
            first_file_uri("file:///bad%2"),
            Err(UriListError::BadEscape(_))
        ));
        assert!(matches!(
            first_file_uri("file:///bad%zz"),
            Err(UriListError::BadEscape(_))
        ));
    }
}
