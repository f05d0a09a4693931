//! The request handler tying path resolution, redirects, listings and
//! content delivery together.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use http::header::{HeaderValue, IntoHeaderName};
use http::request::Parts;
use http::{HeaderMap, Request};
use tracing::Instrument;

use crate::conditional::{self, CondResult};
use crate::content;
use crate::exclude::Exclude;
use crate::fs::{File, FileInfo, FileSystem};
use crate::listing;
use crate::path;
use crate::redirect::Redirect;
use crate::reject::{self, Rejection};
use crate::reply::{self, Response};

/// Configuration for a [`FileServer`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the file served in place of a directory listing
    /// (default `index.html`)
    pub index: String,
    /// Set a specific read buffer size (default auto detect). Zero is
    /// treated as one byte.
    pub read_buffer_size: Option<usize>,
    /// Include the Last-Modified header in responses
    pub last_modified: bool,
    /// Include a weak ETag header in file responses
    pub etag: bool,
    /// Extra headers added to every successful response
    pub headers: HeaderMap<HeaderValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: "index.html".to_owned(),
            read_buffer_size: None,
            last_modified: true,
            etag: false,
            headers: HeaderMap::new(),
        }
    }
}

impl Config {
    /// Override the index file name.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Override the read buffer size.
    pub fn read_buffer_size(mut self, size: Option<usize>) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Override the last_modified exposure
    pub fn last_modified(mut self, last_modified: bool) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Override the etag exposure
    pub fn etag(mut self, etag: bool) -> Self {
        self.etag = etag;
        self
    }

    /// Add an additional header
    pub fn add_header(mut self, key: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.insert(key, value);
        self
    }
}

/// Serves HTTP requests with the contents of a [`FileSystem`].
///
/// Requests ending in `/index.html` are redirected to the same path without
/// the final `index.html`; directories are redirected to their path with a
/// trailing slash, and files to their path without one. A directory is
/// answered with its index file if it has one, or with an HTML listing.
///
/// `FileServer` is cheap to clone and implements hyper's `Service`.
///
/// # Example
///
/// ```
/// use dirserve::{fs::Dir, Exclude, FileServer};
///
/// let server = FileServer::new(Dir::new("/var/www"))
///     .exclude(Exclude::default_hidden());
/// ```
pub struct FileServer<F> {
    fs: Arc<F>,
    exclude: Arc<Exclude>,
    config: Arc<Config>,
}

impl<F> Clone for FileServer<F> {
    fn clone(&self) -> Self {
        FileServer {
            fs: self.fs.clone(),
            exclude: self.exclude.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F> fmt::Debug for FileServer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileServer")
            .field("exclude", &self.exclude)
            .field("config", &self.config)
            .finish()
    }
}

impl<F: FileSystem> FileServer<F> {
    /// Serve everything in `fs`, with the default configuration and no
    /// exclusions.
    pub fn new(fs: F) -> Self {
        FileServer {
            fs: Arc::new(fs),
            exclude: Arc::new(Exclude::none()),
            config: Arc::new(Config::default()),
        }
    }

    /// Hide entries matching `exclude` from listings and lookups.
    pub fn exclude(mut self, exclude: Exclude) -> Self {
        self.exclude = Arc::new(exclude);
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Answer a request. The request body is ignored.
    pub async fn serve<B>(&self, req: Request<B>) -> Response {
        let (parts, _) = req.into_parts();
        self.handle(&parts).await
    }

    async fn handle(&self, req: &Parts) -> Response {
        let start = Instant::now();
        let span = tracing::info_span!(
            "request",
            method = %req.method,
            path = %req.uri.path(),
        );
        let res = match self.dispatch(req).instrument(span).await {
            Ok(res) => res,
            Err(rej) => rej.into_response(),
        };
        tracing::info!(
            target: "dirserve::access",
            "\"{} {} {:?}\" {} {:?}",
            req.method,
            req.uri,
            req.version,
            res.status().as_u16(),
            start.elapsed(),
        );
        res
    }

    async fn dispatch(&self, req: &Parts) -> Result<Response, Rejection> {
        let upath = path::decode(req.uri.path())?;
        let mut name = path::clean(&upath);

        let mut file = self.open(&name).await?;
        let mut info = stat(&name, &file).await?;

        if let Some(redirect) = Redirect::check(&upath, &self.config.index, info.is_dir()) {
            return Ok(redirect.into_response(&upath, req.uri.query()));
        }

        if info.is_dir() {
            let index = path::join(&name, &self.config.index);
            if let Ok(index_file) = self.open(&index).await {
                if let Ok(index_info) = index_file.stat().await {
                    tracing::trace!("serving index {:?}", index);
                    name = index;
                    file = index_file;
                    info = index_info;
                }
            }
        }

        if info.is_dir() {
            return self.list(req, file, &info).await;
        }

        tracing::trace!("serving file {:?}", name);
        Ok(content::serve(&req.method, &req.headers, info.name(), &info, file, &self.config).await)
    }

    /// Open a cleaned path, unless one of its segments is hidden.
    async fn open(&self, name: &str) -> Result<F::File, Rejection> {
        if self.exclude.hides(name) {
            tracing::debug!("excluded: {:?}", name);
            return Err(Rejection::NotFound);
        }
        self.fs
            .open(name)
            .await
            .map_err(|err| reject::fs_error(name, err))
    }

    async fn list(
        &self,
        req: &Parts,
        mut dir: F::File,
        info: &FileInfo,
    ) -> Result<Response, Rejection> {
        let mut headers = self.config.headers.clone();
        if conditional::check_if_modified_since(&req.method, &req.headers, info.modified())
            == CondResult::Unmodified
        {
            return Ok(conditional::not_modified(headers));
        }
        if self.config.last_modified {
            conditional::set_last_modified(&mut headers, info.modified());
        }

        let mut res = listing::dir_list(&req.method, &mut dir, &self.exclude).await?;
        reply::extend_headers(&mut res, &headers);
        Ok(res)
    }
}

async fn stat<T: File>(name: &str, file: &T) -> Result<FileInfo, Rejection> {
    file.stat().await.map_err(|err| reject::fs_error(name, err))
}

impl<F, B> hyper::service::Service<Request<B>> for FileServer<F>
where
    F: FileSystem,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let (parts, _) = req.into_parts();
        let server = self.clone();
        Box::pin(async move { Ok(server.handle(&parts).await) })
    }
}
