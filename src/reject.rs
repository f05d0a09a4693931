//! Error responses.
//!
//! Every failure while handling a request is classified into one of three
//! kinds, and each kind is rendered with a fixed, generic message. The
//! underlying `io::Error` is logged but never written to the client.

use std::fmt;
use std::io;

use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::StatusCode;

use crate::reply::Response;

/// The reason a request could not be served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// `404 Not Found`: missing, hidden or undecodable paths.
    NotFound,
    /// `403 Forbidden`: the backend refused access.
    Forbidden,
    /// `500 Internal Server Error`: anything else.
    Internal,
}

impl Rejection {
    /// Classify a filesystem error.
    pub fn from_io(err: &io::Error) -> Rejection {
        match err.kind() {
            io::ErrorKind::NotFound => Rejection::NotFound,
            io::ErrorKind::PermissionDenied => Rejection::Forbidden,
            _ => Rejection::Internal,
        }
    }

    /// The status code of this rejection.
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::NotFound => StatusCode::NOT_FOUND,
            Rejection::Forbidden => StatusCode::FORBIDDEN,
            Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Rejection::NotFound => "404 page not found\n",
            Rejection::Forbidden => "403 Forbidden\n",
            Rejection::Internal => "500 Internal Server Error\n",
        }
    }

    /// Render this rejection as a plain-text response.
    pub fn into_response(self) -> Response {
        let mut res = Response::new(self.message().into());
        *res.status_mut() = self.status();
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res.headers_mut()
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        res
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().trim_end())
    }
}

impl std::error::Error for Rejection {}

/// Log an open/stat failure for `name` at a level matching its kind, and
/// classify it.
pub(crate) fn fs_error(name: &str, err: io::Error) -> Rejection {
    let rej = Rejection::from_io(&err);
    match rej {
        Rejection::NotFound => tracing::debug!("file not found: {:?}", name),
        Rejection::Forbidden => tracing::warn!("file permission denied: {:?}", name),
        Rejection::Internal => tracing::error!("file open error (path={:?}): {}", name, err),
    }
    rej
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_io_errors() {
        let nf = io::Error::new(io::ErrorKind::NotFound, "/secret/path is gone");
        let pd = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let other = io::Error::new(io::ErrorKind::Other, "disk on fire");

        assert_eq!(Rejection::from_io(&nf), Rejection::NotFound);
        assert_eq!(Rejection::from_io(&pd), Rejection::Forbidden);
        assert_eq!(Rejection::from_io(&other), Rejection::Internal);
    }

    #[test]
    fn error_response_headers() {
        let res = Rejection::Forbidden.into_response();
        assert_eq!(res.status(), 403);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    }

    #[test]
    fn display_is_status_phrase() {
        assert_eq!(Rejection::NotFound.to_string(), "404 page not found");
        assert_eq!(Rejection::Internal.to_string(), "500 Internal Server Error");
    }
}
