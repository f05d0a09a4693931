//! `If-Modified-Since` evaluation for directory listings.
//!
//! See [RFC 7232 section 3.3](https://tools.ietf.org/html/rfc7232#section-3.3).

use std::time::{Duration, SystemTime};

use http::header::{
    HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, LAST_MODIFIED,
};
use http::{HeaderMap, Method, StatusCode};

use crate::body::Body;
use crate::reply::Response;

/// The outcome of a precondition check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CondResult {
    /// The request carries no usable precondition.
    None,
    /// The precondition is satisfied: the client's copy is still current.
    Unmodified,
    /// The precondition is not satisfied: the content changed since.
    Modified,
}

/// Whether a modification time is obviously unspecified: missing, or
/// exactly the Unix epoch.
pub fn is_zero_time(modified: Option<SystemTime>) -> bool {
    match modified {
        None => true,
        Some(t) => t == SystemTime::UNIX_EPOCH,
    }
}

/// Evaluate `If-Modified-Since` against a modification time.
///
/// Only `GET` and `HEAD` requests are eligible.
pub fn check_if_modified_since(
    method: &Method,
    headers: &HeaderMap,
    modified: Option<SystemTime>,
) -> CondResult {
    if method != Method::GET && method != Method::HEAD {
        return CondResult::None;
    }
    let modified = match modified {
        Some(t) if !is_zero_time(Some(t)) => t,
        _ => return CondResult::None,
    };
    let since = match headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .and_then(|v| httpdate::parse_http_date(v).ok())
    {
        Some(since) => since,
        None => return CondResult::None,
    };

    // HTTP dates carry whole seconds only.
    let modified = truncate_secs(modified);
    let result = if modified <= since {
        CondResult::Unmodified
    } else {
        CondResult::Modified
    };
    tracing::trace!(
        "if-modified-since? header = {:?}, modified = {:?}, result = {:?}",
        since,
        modified,
        result
    );
    result
}

fn truncate_secs(t: SystemTime) -> SystemTime {
    match t.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => SystemTime::UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => t,
    }
}

/// Set `Last-Modified` unless the modification time is unspecified.
pub fn set_last_modified(headers: &mut HeaderMap, modified: Option<SystemTime>) {
    if is_zero_time(modified) {
        return;
    }
    if let Some(t) = modified {
        let date = httpdate::fmt_http_date(t);
        if let Ok(value) = HeaderValue::from_str(&date) {
            headers.insert(LAST_MODIFIED, value);
        }
    }
}

/// Turn the headers gathered so far into a `304 Not Modified` response.
///
/// Representation metadata is dropped; `Last-Modified` only survives when
/// there is no `ETag` to validate against instead.
pub fn not_modified(mut headers: HeaderMap) -> Response {
    headers.remove(CONTENT_TYPE);
    headers.remove(CONTENT_LENGTH);
    if headers.contains_key(ETAG) {
        headers.remove(LAST_MODIFIED);
    }
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::NOT_MODIFIED;
    *res.headers_mut() = headers;
    res
}
