//! Binding a listener and driving connections with hyper.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use crate::fs::FileSystem;
use crate::handler::FileServer;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Create a `Server` answering with the provided file server.
pub fn serve<F: FileSystem>(files: FileServer<F>) -> Server<F> {
    Server { files }
}

/// A dirserve Server ready to accept connections.
#[derive(Debug)]
pub struct Server<F> {
    files: FileServer<F>,
}

impl<F: FileSystem> Server<F> {
    /// Bind to `addr` and serve until the process receives CTRL-C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> Result<(), crate::Error> {
        self.run_with_graceful_shutdown(addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {}", err);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Bind to `addr` and serve until `signal` completes.
    pub async fn run_with_graceful_shutdown(
        self,
        addr: impl Into<SocketAddr>,
        signal: impl Future<Output = ()>,
    ) -> Result<(), crate::Error> {
        let addr = addr.into();
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, signal).await
    }

    /// Serve connections from an already bound listener until `signal`
    /// completes, then wait a bounded time for open connections to finish.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        signal: impl Future<Output = ()>,
    ) -> Result<(), crate::Error> {
        tracing::info!("listening on http://{}", listener.local_addr()?);

        let builder = Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            // e.g. EMFILE: back off instead of spinning
                            tracing::warn!("accept error: {}", err);
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };
                    tracing::trace!("connection from {}", remote);

                    let conn = builder.serve_connection(TokioIo::new(stream), self.files.clone());
                    let conn = graceful.watch(conn.into_owned());
                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            tracing::debug!("connection error ({}): {}", remote, err);
                        }
                    });
                }
                _ = &mut signal => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);
        tokio::select! {
            _ = graceful.shutdown() => {
                tracing::debug!("all connections closed");
            }
            _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
                tracing::warn!("timed out waiting for connections to close");
            }
        }
        Ok(())
    }
}
