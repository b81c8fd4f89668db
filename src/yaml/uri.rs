//! Minimal URI parsing with editor-URI semantics
//!
//! Splits a string into scheme, authority, path, query and fragment using the
//! RFC 3986 appendix B expression. A string without a scheme parses as a
//! `file` URI; `file`/`http`/`https` paths are rooted at `/`.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

static URI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([^:/?#]+?):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?")
        .expect("Invalid URI_RE regex")
});

/// Scheme assumed when none is given
pub const DEFAULT_SCHEME: &str = "file";

/// Parsed URI components; path, query and fragment are percent-decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl Uri {
    /// Parse a URI string; never fails, unmatched parts are empty
    pub fn parse(value: &str) -> Self {
        let Some(caps) = URI_RE.captures(value) else {
            return Self::empty(DEFAULT_SCHEME);
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

        let scheme = match group(2) {
            "" => DEFAULT_SCHEME.to_string(),
            s => s.to_string(),
        };
        let path = resolve_reference(&scheme, percent_decode(group(5)));

        Self {
            authority: percent_decode(group(4)),
            path,
            query: percent_decode(group(7)),
            fragment: percent_decode(group(9)),
            scheme,
        }
    }

    fn empty(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            authority: String::new(),
            path: String::new(),
            query: String::new(),
            fragment: String::new(),
        }
    }
}

fn resolve_reference(scheme: &str, path: String) -> String {
    match scheme {
        "file" | "http" | "https" if path.is_empty() => "/".to_string(),
        "file" | "http" | "https" if !path.starts_with('/') => format!("/{}", path),
        _ => path,
    }
}

/// Decode `%XX` escapes; input that is not UTF-8 once decoded is returned unchanged
fn percent_decode(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
