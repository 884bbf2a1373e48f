//! The background read/decode/dispatch loop
//!
//! One worker task runs per started client. Its life is a single cycle
//! repeated until the stop token fires: acquire a watch-enabled
//! connection, pull framed records off it, decode each into a report and
//! hand it to the dispatcher. Connection-level failures close the socket
//! and re-enter the cycle after a backoff wait; record-level failures
//! cost only the record they occurred on.
//!
//! Every suspension point (dial, socket read, backoff sleep) races the
//! cancellation token, so a stop request is observed promptly even while
//! the daemon is unreachable.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Result;
use crate::error::GpsdWatchError;
use crate::protocol::v3::{Report, Watch};
use crate::sink::Dispatcher;

use super::WatchOptions;
use super::connection::{Backoff, Connection, ConnectionState, SharedConnectionState};

pub(crate) struct Worker {
    addr: String,
    watch: Watch,
    opts: WatchOptions,
    backoff: Backoff,
    dispatcher: Dispatcher,
    state: Arc<SharedConnectionState>,
    cancel: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        addr: String,
        opts: WatchOptions,
        dispatcher: Dispatcher,
        state: Arc<SharedConnectionState>,
        cancel: CancellationToken,
    ) -> Self {
        Worker {
            addr,
            watch: opts.watch_policy(),
            backoff: Backoff::new(opts.backoff_base, opts.backoff_cap),
            opts,
            dispatcher,
            state,
            cancel,
        }
    }

    /// Runs until the cancellation token fires
    ///
    /// No error on the connect/read/decode/dispatch path terminates this
    /// loop; each one is logged, reported to the observer and recovered.
    pub(crate) async fn run(mut self) {
        loop {
            self.state.set(ConnectionState::Connecting);
            // Cloned so the cancel arm does not borrow `self` alongside
            // the `&mut self` connect arm.
            let cancel = self.cancel.clone();
            let conn = tokio::select! {
                _ = cancel.cancelled() => break,
                conn = self.connect() => conn,
            };

            let mut conn = match conn {
                Ok(conn) => conn,
                Err(err) => {
                    self.state.set(ConnectionState::Disconnected);
                    warn!(addr = %self.addr, error = %err, "connect to gpsd failed");
                    self.dispatcher.observe(&err);
                    if !self.wait_backoff().await {
                        break;
                    }
                    continue;
                }
            };

            info!(addr = %self.addr, "watching gpsd report stream");
            self.state.set(ConnectionState::Watching);
            self.backoff.reset();

            let err = self.read_loop(&mut conn).await;
            // Close the socket before any backoff wait.
            drop(conn);
            self.state.set(ConnectionState::Disconnected);

            let Some(err) = err else {
                break; // stop requested
            };
            warn!(addr = %self.addr, error = %err, "gpsd connection lost");
            self.dispatcher.observe(&err);
            if !self.wait_backoff().await {
                break;
            }
        }

        self.state.set(ConnectionState::Disconnected);
        info!(addr = %self.addr, "gpsd watch worker stopped");
    }

    /// Dials the daemon and performs the watch handshake
    ///
    /// Takes `&mut self` so the returned future holds an exclusive
    /// borrow and stays spawnable without requiring `Sync` callbacks.
    async fn connect(&mut self) -> Result<Connection<Compat<TcpStream>>> {
        let stream = match timeout(self.opts.connect_timeout, TcpStream::connect(&self.addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(GpsdWatchError::IoError(err)),
            Err(_) => {
                return Err(GpsdWatchError::IoError(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                )));
            }
        };

        // The handshake write gets the same bound; a peer that accepts
        // but never reads must not stall the worker until stop.
        let open = Connection::open(stream.compat(), self.watch.clone(), self.opts.max_frame_len);
        match timeout(self.opts.connect_timeout, open).await {
            Ok(conn) => conn,
            Err(_) => Err(GpsdWatchError::IoError(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "watch handshake timed out",
            ))),
        }
    }

    /// Consumes one connection until stop or a connection-level error
    ///
    /// Returns `None` when stop was requested, `Some(err)` when the
    /// connection must be re-established.
    async fn read_loop(
        &mut self,
        conn: &mut Connection<Compat<TcpStream>>,
    ) -> Option<GpsdWatchError> {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                next = timeout(self.opts.read_timeout, conn.next_line()) => next,
            };

            let line = match next {
                Err(_) => return Some(GpsdWatchError::ReadTimeout(self.opts.read_timeout)),
                Ok(Err(err)) => return Some(err),
                Ok(Ok(None)) => {
                    return Some(GpsdWatchError::IoError(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "gpsd closed the connection",
                    )));
                }
                Ok(Ok(Some(line))) => line,
            };

            match Report::decode(&line) {
                Ok(report) => self.dispatcher.dispatch(report),
                Err(err) => {
                    // Isolated malformed records are expected during
                    // device hot-plug; drop the record, keep the stream.
                    debug!(error = %err, "dropping undecodable record");
                    self.dispatcher.observe(&err);
                }
            }
        }
    }

    /// Waits out the current backoff delay; `false` means stop fired
    async fn wait_backoff(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        debug!(addr = %self.addr, ?delay, "waiting before reconnect");
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ErrorObserver, LatestReports, ReportCallback};

    #[tokio::test]
    async fn test_run_is_spawnable_and_stops_on_cancel() {
        let on_report: ReportCallback = Box::new(|_report| Ok(()));
        let on_error: ErrorObserver = Box::new(|_err| {});
        let dispatcher = Dispatcher::new(on_report, on_error, Arc::new(LatestReports::default()));

        let cancel = CancellationToken::new();
        // Nothing listens on this port; the worker cycles through
        // connect failures until cancelled.
        let worker = Worker::new(
            "127.0.0.1:9".into(),
            WatchOptions::default(),
            dispatcher,
            Arc::new(SharedConnectionState::default()),
            cancel.clone(),
        );

        // The boxed callbacks are Send but not Sync; the run future must
        // still satisfy the spawn bound.
        let join = tokio::spawn(worker.run());
        cancel.cancel();
        join.await.unwrap();
    }
}
