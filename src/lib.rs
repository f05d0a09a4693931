#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

//! # dirserve
//!
//! Serve a directory tree over HTTP, with the semantics of a classic web
//! server's static file handler:
//!
//! - directories answer with their `index.html`, or an HTML listing;
//! - non-canonical paths are redirected (`/dir` → `/dir/`,
//!   `/file/` → `/file`, `/dir/index.html` → `/dir/`);
//! - `If-Modified-Since`, `If-None-Match` and friends answer `304`/`412`;
//! - byte ranges answer `206`;
//! - errors never leak filesystem details: the client only ever sees
//!   `404`, `403` or `500` with a fixed message.
//!
//! The entry point is [`FileServer`], which works over any
//! [`FileSystem`](fs::FileSystem): a directory on disk ([`fs::Dir`]) or an
//! in-memory tree ([`fs::MemFs`]).
//!
//! ```no_run
//! use dirserve::{fs::Dir, Exclude, FileServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dirserve::Error> {
//!     let files = FileServer::new(Dir::new("."))
//!         .exclude(Exclude::default_hidden());
//!
//!     dirserve::serve(files).run(([127, 0, 0, 1], 8000)).await
//! }
//! ```

mod body;
pub mod conditional;
pub mod content;
mod error;
pub mod exclude;
pub mod fs;
pub mod handler;
pub mod listing;
pub mod path;
pub mod redirect;
pub mod reject;
mod reply;
mod server;

pub use self::body::Body;
pub use self::error::Error;
pub use self::exclude::Exclude;
pub use self::handler::{Config, FileServer};
pub use self::reject::Rejection;
pub use self::reply::Response;
pub use self::server::{serve, Server};

#[doc(hidden)]
pub use http;
