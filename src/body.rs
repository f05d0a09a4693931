//! The response body type produced by the file server.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http_body::{Frame, SizeHint};
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, StreamBody};

/// A boxed response body.
///
/// Listings and error pages are buffered, file contents are streamed.
#[derive(Debug)]
pub struct Body(BoxBody<Bytes, crate::Error>);

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl http_body::Body for Body {
    type Data = Bytes;
    type Error = crate::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

impl Body {
    /// A body with no data, used for redirects, 304s and `HEAD`.
    pub fn empty() -> Self {
        Body(Empty::<Bytes>::new().map_err(crate::Error::new).boxed())
    }

    pub(crate) fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        let frames = stream.map(|item| item.map(Frame::data).map_err(crate::Error::new));
        Body(BodyExt::boxed(StreamBody::new(frames)))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body(Full::new(b).map_err(crate::Error::new).boxed())
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}
