//! Serving the contents of a regular file.
//!
//! This is the generic part of file serving: it knows nothing about
//! directories or redirects. Given an open, seekable entry, its name and its
//! modification time, it evaluates every conditional request header,
//! honors a byte range, picks a content type and streams the body.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::Poll;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};
use futures_util::{ready, stream, Stream};
use headers::{
    AcceptRanges, ContentLength, ContentRange, ETag, HeaderMapExt, IfMatch, IfNoneMatch, IfRange,
    IfUnmodifiedSince, LastModified, Range,
};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::poll_read_buf;

use crate::body::Body;
use crate::conditional::{self, CondResult};
use crate::fs::{File, FileInfo};
use crate::handler::Config;
use crate::reject::Rejection;
use crate::reply::{self, Response};

const SNIFF_LEN: usize = 512;

#[derive(Debug)]
struct Conditionals {
    if_modified_since: CondResult,
    if_unmodified_since: Option<IfUnmodifiedSince>,
    if_range: Option<IfRange>,
    range: Option<Range>,
    if_match: Option<IfMatch>,
    if_none_match: Option<IfNoneMatch>,
}

enum Cond {
    NoBody(Response),
    WithBody(Option<Range>),
}

impl Conditionals {
    fn new(method: &Method, headers: &HeaderMap, modified: Option<SystemTime>) -> Conditionals {
        Conditionals {
            if_modified_since: conditional::check_if_modified_since(method, headers, modified),
            if_unmodified_since: headers.typed_get(),
            if_range: headers.typed_get(),
            range: headers.typed_get(),
            if_match: headers.typed_get(),
            if_none_match: headers.typed_get(),
        }
    }

    /// `If-Match` wins over `If-Unmodified-Since`, and `If-None-Match`
    /// over `If-Modified-Since`, as RFC 7232 section 6 orders them.
    fn check(
        self,
        method: &Method,
        etag: Option<&ETag>,
        last_modified: Option<LastModified>,
        not_modified: impl FnOnce() -> Response,
    ) -> Cond {
        if let Some(tag_match) = self.if_match {
            let precondition = match etag {
                Some(tag) => tag_match.precondition_passes(tag),
                None => tag_match == IfMatch::any(),
            };
            tracing::trace!(
                "if-match? header = {:?}, file = {:?}, result = {}",
                tag_match,
                etag,
                precondition
            );
            if !precondition {
                return Cond::NoBody(precondition_failed());
            }
        } else if let Some(since) = self.if_unmodified_since {
            // no last_modified means the precondition can't be evaluated
            let precondition = last_modified
                .map(|time| since.precondition_passes(time.into()))
                .unwrap_or(true);
            tracing::trace!(
                "if-unmodified-since? header = {:?}, file = {:?}, result = {}",
                since,
                last_modified,
                precondition
            );
            if !precondition {
                return Cond::NoBody(precondition_failed());
            }
        }

        if let Some(tag_match) = self.if_none_match {
            let matched = match etag {
                Some(tag) => !tag_match.precondition_passes(tag),
                None => tag_match == IfNoneMatch::any(),
            };
            tracing::trace!(
                "if-none-match? header = {:?}, file = {:?}, matched = {}",
                tag_match,
                etag,
                matched
            );
            if matched {
                if method == Method::GET || method == Method::HEAD {
                    return Cond::NoBody(not_modified());
                }
                return Cond::NoBody(precondition_failed());
            }
        } else if self.if_modified_since == CondResult::Unmodified {
            return Cond::NoBody(not_modified());
        }

        if let Some(if_range) = self.if_range {
            let can_range = !if_range.is_modified(etag, last_modified.as_ref());
            tracing::trace!(
                "if-range? header = {:?}, file = {:?},{:?}, result = {}",
                if_range,
                etag,
                last_modified,
                can_range
            );
            if !can_range {
                return Cond::WithBody(None);
            }
        }

        Cond::WithBody(self.range)
    }
}

fn precondition_failed() -> Response {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::PRECONDITION_FAILED;
    res
}

/// Serve an open regular file.
///
/// `name` is only used to pick a content type; `info` supplies the size and
/// modification time. The whole conditional and range algorithm runs here,
/// independently of any check the caller did.
pub async fn serve<F: File>(
    method: &Method,
    headers: &HeaderMap,
    name: &str,
    info: &FileInfo,
    mut file: F,
    config: &Config,
) -> Response {
    let modified = info.modified().filter(|t| *t != UNIX_EPOCH);
    let last_modified = modified.map(LastModified::from);
    let etag = if config.etag {
        modified.and_then(|modified| weak_etag(modified, info.len()))
    } else {
        None
    };

    // Headers a 304 is allowed to repeat.
    let mut validators = config.headers.clone();
    if let Some(ref etag) = etag {
        validators.typed_insert(etag.clone());
    }
    if config.last_modified {
        conditional::set_last_modified(&mut validators, modified);
    }

    let conditionals = Conditionals::new(method, headers, modified);
    let range = match conditionals.check(method, etag.as_ref(), last_modified, || {
        conditional::not_modified(validators.clone())
    }) {
        Cond::NoBody(res) => return res,
        Cond::WithBody(range) => range,
    };

    let len = info.len();
    let (start, end) = match bytes_range(range, len) {
        Ok(range) => range,
        Err(BadRange) => {
            let mut res = Response::new(Body::empty());
            *res.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
            res.headers_mut()
                .typed_insert(ContentRange::unsatisfied_bytes(len));
            return res;
        }
    };

    let content_type = match content_type(name, &mut file).await {
        Ok(content_type) => content_type,
        Err(err) => {
            tracing::error!("file read error (name={:?}): {}", name, err);
            return Rejection::Internal.into_response();
        }
    };

    let sub_len = end - start;
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        if start != 0 {
            if let Err(err) = file.seek(SeekFrom::Start(start)).await {
                tracing::error!("file seek error (name={:?}): {}", name, err);
                return Rejection::Internal.into_response();
            }
        }
        let buf_size = config
            .read_buffer_size
            .unwrap_or_else(|| optimal_buf_size(sub_len))
            .max(1);
        Body::stream(file_stream(file, buf_size, sub_len))
    };

    let mut resp = Response::new(body);
    if sub_len != len {
        *resp.status_mut() = StatusCode::PARTIAL_CONTENT;
        match ContentRange::bytes(start..end, len) {
            Ok(content_range) => resp.headers_mut().typed_insert(content_range),
            Err(_) => return Rejection::Internal.into_response(),
        }
    }

    resp.headers_mut().typed_insert(ContentLength(sub_len));
    resp.headers_mut().insert(CONTENT_TYPE, content_type);
    resp.headers_mut().typed_insert(AcceptRanges::bytes());
    reply::extend_headers(&mut resp, &validators);

    resp
}

/// A weak tag derived from the modification time and the size.
fn weak_etag(modified: SystemTime, len: u64) -> Option<ETag> {
    let since = modified.duration_since(UNIX_EPOCH).ok()?;
    format!("W/\"{:x}-{:x}\"", since.as_secs(), len).parse().ok()
}

/// Guess from the extension, otherwise sniff the leading bytes. The file
/// is rewound afterwards.
async fn content_type<F: File>(name: &str, file: &mut F) -> io::Result<HeaderValue> {
    if let Some(mime) = mime_guess::from_path(name).first() {
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            return Ok(value);
        }
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut *file).take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(HeaderValue::from_static(sniff(&head)))
}

/// A deliberately small content sniffer: UTF-8 text or opaque bytes.
fn sniff(head: &[u8]) -> &'static str {
    if head.contains(&0) {
        return "application/octet-stream";
    }
    match std::str::from_utf8(head) {
        Ok(_) => "text/plain; charset=utf-8",
        // a multi-byte character cut off by the sniff window
        Err(e) if e.error_len().is_none() => "text/plain; charset=utf-8",
        Err(_) => "application/octet-stream",
    }
}

struct BadRange;

/// The first satisfiable range of the header. Specs out of bounds are
/// skipped; only when none is left is the request unsatisfiable.
fn bytes_range(range: Option<Range>, max_len: u64) -> Result<(u64, u64), BadRange> {
    use std::ops::Bound;

    let range = if let Some(range) = range {
        range
    } else {
        return Ok((0, max_len));
    };

    let mut unsatisfiable = false;
    for (start, end) in range.satisfiable_ranges(max_len) {
        let start = match start {
            Bound::Unbounded => 0,
            Bound::Included(s) => s,
            Bound::Excluded(s) => s + 1,
        };

        let end = match end {
            Bound::Unbounded => max_len,
            Bound::Included(s) => {
                // a last-byte-pos past the end is clamped to the end
                if s >= max_len {
                    max_len
                } else {
                    s + 1
                }
            }
            Bound::Excluded(s) => s,
        };

        if start < end && end <= max_len {
            return Ok((start, end));
        }
        tracing::trace!("unsatisfiable byte range: {}-{}/{}", start, end, max_len);
        unsatisfiable = true;
    }

    if unsatisfiable {
        Err(BadRange)
    } else {
        Ok((0, max_len))
    }
}

fn file_stream<F: File>(
    mut file: F,
    buf_size: usize,
    mut len: u64,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + Sync {
    let mut buf = BytesMut::new();
    stream::poll_fn(move |cx| {
        if len == 0 {
            return Poll::Ready(None);
        }
        reserve_at_least(&mut buf, buf_size);

        let n = match ready!(poll_read_buf(Pin::new(&mut file), cx, &mut buf)) {
            Ok(n) => n as u64,
            Err(err) => {
                tracing::debug!("file read error: {}", err);
                return Poll::Ready(Some(Err(err)));
            }
        };

        if n == 0 {
            tracing::debug!("file read found EOF before expected length");
            return Poll::Ready(None);
        }

        let mut chunk = buf.split().freeze();
        if n > len {
            chunk = chunk.split_to(len as usize);
            len = 0;
        } else {
            len -= n;
        }

        Poll::Ready(Some(Ok(chunk)))
    })
}

fn reserve_at_least(buf: &mut BytesMut, cap: usize) {
    if buf.capacity() - buf.len() < cap {
        buf.reserve(cap);
    }
}

const DEFAULT_READ_BUF_SIZE: usize = 8_192;

fn optimal_buf_size(len: u64) -> usize {
    // Don't reserve a bigger-than-needed buffer for small files.
    std::cmp::min(DEFAULT_READ_BUF_SIZE as u64, len.max(1)) as usize
}
