//! Request path normalization.
//!
//! Request paths are always '/'-separated, regardless of the host OS.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::reject::Rejection;

/// Bytes left alone when a name is written into a URL path: the
/// unreserved characters, plus the sub-delimiters that are legal there.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Percent-encode a name for use as (part of) a URL path.
///
/// `?` and `#` are escaped, so they stay part of the path instead of
/// starting a query or a fragment.
pub fn encode(name: &str) -> String {
    utf8_percent_encode(name, PATH).to_string()
}

/// Make an encoded relative path safe to use as a relative reference: a
/// colon in its first segment would otherwise read as a URI scheme.
pub fn relative_ref(encoded: String) -> String {
    let first = encoded.split('/').next().unwrap_or("");
    if first.contains(':') {
        format!("./{}", encoded)
    } else {
        encoded
    }
}

/// Percent-decode the raw path of a request URI and make sure it is rooted.
///
/// The result is *not* cleaned: redirect decisions look at the path exactly
/// as the client sent it.
pub fn decode(raw: &str) -> Result<String, Rejection> {
    let decoded = match percent_decode_str(raw).decode_utf8() {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!("path: failed to decode {:?}: {:?}", raw, err);
            return Err(Rejection::NotFound);
        }
    };
    if decoded.starts_with('/') {
        Ok(decoded.into_owned())
    } else {
        Ok(format!("/{}", decoded))
    }
}

/// Lexically clean a rooted path.
///
/// Duplicate slashes and `.` segments are dropped, `..` removes the
/// preceding segment and never climbs above the root. The result starts
/// with '/' and ends with '/' only when it is the root itself.
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }

    let mut out = String::with_capacity(path.len() + 1);
    for seg in &segments {
        out.push('/');
        out.push_str(seg);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// The segments of a cleaned path, root excluded.
pub fn segments(clean: &str) -> impl Iterator<Item = &str> {
    clean.split('/').filter(|seg| !seg.is_empty())
}

/// The last segment of a request path, ignoring trailing slashes.
///
/// Returns `"/"` for the root and `"."` for an empty path.
pub fn base(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Join a child name onto a cleaned directory path.
pub fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}
