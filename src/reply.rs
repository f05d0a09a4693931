//! Responses produced by the file server.

use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, Method};

use crate::body::Body;

/// An HTTP response with a dirserve [`Body`].
pub type Response = http::Response<Body>;

/// A buffered `text/html` response. `HEAD` requests get the headers only.
pub(crate) fn html(method: &Method, page: String) -> Response {
    let len = page.len();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        page.into()
    };
    let mut res = Response::new(body);
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    res.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
    res
}

/// Copy the configured extra headers onto a response, replacing any
/// existing values of the same name.
pub(crate) fn extend_headers(res: &mut Response, extra: &HeaderMap) {
    for (k, v) in extra.iter() {
        res.headers_mut().insert(k, v.clone());
    }
}
