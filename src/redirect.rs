//! Redirects to the canonical form of a request path.
//!
//! Directories are addressed with a trailing slash, files without one, and
//! an index file is addressed through its directory. Locations are always
//! relative, so the server keeps working when mounted below a prefix.

use http::header::{HeaderValue, LOCATION};
use http::StatusCode;

use crate::body::Body;
use crate::path;
use crate::reject::Rejection;
use crate::reply::Response;

/// A redirect the request must be answered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// `.../index.html` → `.../`
    StripIndex,
    /// A directory requested without its trailing slash.
    ToSlash,
    /// A regular file requested with a trailing slash.
    Canonical,
}

impl Redirect {
    /// Decide whether the request path needs redirecting, given the name
    /// of the index file and whether the opened entry is a directory.
    ///
    /// Rules are checked in order and the first match wins. `upath` is the
    /// decoded, uncleaned request path, always starting with '/'.
    pub fn check(upath: &str, index: &str, is_dir: bool) -> Option<Redirect> {
        if is_index_path(upath, index) {
            return Some(Redirect::StripIndex);
        }
        let trailing = upath.ends_with('/');
        if is_dir && !trailing {
            Some(Redirect::ToSlash)
        } else if !is_dir && trailing {
            Some(Redirect::Canonical)
        } else {
            None
        }
    }

    /// The relative location to send the client to.
    pub fn location(self, upath: &str) -> String {
        match self {
            Redirect::StripIndex => "./".to_owned(),
            Redirect::ToSlash => path::relative_ref(path::encode(path::base(upath)) + "/"),
            Redirect::Canonical => format!("../{}", path::encode(path::base(upath))),
        }
    }

    /// Build the `301` response for this redirect.
    pub fn into_response(self, upath: &str, query: Option<&str>) -> Response {
        let location = self.location(upath);
        tracing::debug!("redirect {:?}: {:?} -> {:?}", self, upath, location);
        local_redirect(location, query)
    }
}

/// Whether `upath` names the index file of some directory.
pub fn is_index_path(upath: &str, index: &str) -> bool {
    upath
        .strip_suffix(index)
        .map_or(false, |rest| rest.ends_with('/'))
}

/// A `301 Moved Permanently` to a relative location, keeping the query.
///
/// The location is not made absolute.
pub fn local_redirect(mut location: String, query: Option<&str>) -> Response {
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(q);
    }
    let value = match HeaderValue::try_from(location) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("redirect location is not a valid header: {}", err);
            return Rejection::Internal.into_response();
        }
    };
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::MOVED_PERMANENTLY;
    res.headers_mut().insert(LOCATION, value);
    res
}
