//! Consumer-facing GPSD watch client
//!
//! [`WatchClient`] is the caller-visible handle around the background
//! worker. The caller's thread only ever performs three operations:
//! [`start`](WatchClient::start) spawns the worker,
//! [`stop`](WatchClient::stop) cancels it and waits for full shutdown,
//! and [`latest`](WatchClient::latest) snapshots the last report of a
//! class without touching the network. Everything else — dialing,
//! handshaking, framing, decoding, reconnecting — happens on the worker
//! task.
//!
//! # Example
//!
//! ```no_run
//! use gpsd_watch::client::{Endpoint, WatchClient, WatchOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let opts = WatchOptions::default().read_timeout(Duration::from_secs(60));
//! let mut client = WatchClient::with_options(Endpoint::new("10.0.0.5", 2947), opts);
//!
//! client.start(|report| {
//!     println!("report: {report:?}");
//!     Ok(())
//! })?;
//! // ...
//! client.stop().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::GpsdWatchError;
use crate::framing::DEFAULT_MAX_FRAME_LEN;
use crate::protocol::v3::{Report, ReportClass, Watch};
use crate::sink::{CallbackError, Dispatcher, LatestReports};
use crate::Result;

/// Connection state, reconnect policy and the socket-facing core
pub mod connection;
mod worker;

pub use connection::{Backoff, ConnectionState};

/// Address of the GPSD daemon to contact
///
/// Immutable once the client is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// The port GPSD conventionally listens on
    pub const DEFAULT_PORT: u16 = 2947;

    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Endpoint {
    /// The local daemon on its conventional port, `127.0.0.1:2947`
    fn default() -> Self {
        Endpoint::new("127.0.0.1", Endpoint::DEFAULT_PORT)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Tunables for the background worker
///
/// All timing constants live here rather than in the loop, so tests can
/// run the reconnect machinery without real-time delays. The defaults
/// suit a local daemon; raise `read_timeout` for daemons that sit quiet
/// between device activations.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    device: Option<String>,
    backoff_base: Duration,
    backoff_cap: Duration,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_frame_len: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            device: None,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl WatchOptions {
    /// Restricts the watch to a particular GPS device
    ///
    /// # Arguments
    /// * `device` - Path to the GPS device (e.g., "/dev/ttyUSB0")
    pub fn device<S: AsRef<str>>(mut self, device: S) -> Self {
        self.device = Some(device.as_ref().into());
        self
    }

    /// First reconnect delay after a failure
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Ceiling the reconnect delay doubles up to
    pub fn backoff_cap(mut self, cap: Duration) -> Self {
        self.backoff_cap = cap;
        self
    }

    /// Bound on establishing the TCP connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Silence on the socket longer than this is treated as a dead
    /// connection and triggers a reconnect
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Largest record the line framer will buffer before giving up on
    /// the connection
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    fn watch_policy(&self) -> Watch {
        Watch {
            device: self.device.clone(),
            ..Watch::enable_json()
        }
    }
}

struct WorkerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Handle owning the background worker and the latest-report cache
///
/// Construct with [`new`](WatchClient::new) or
/// [`with_options`](WatchClient::with_options); neither touches the
/// network. `start` must be called from within a tokio runtime, since it
/// spawns the worker task there.
pub struct WatchClient {
    endpoint: Endpoint,
    opts: WatchOptions,
    latest: Arc<LatestReports>,
    state: Arc<connection::SharedConnectionState>,
    worker: Option<WorkerHandle>,
}

impl WatchClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_options(endpoint, WatchOptions::default())
    }

    pub fn with_options(endpoint: Endpoint, opts: WatchOptions) -> Self {
        WatchClient {
            endpoint,
            opts,
            latest: Arc::new(LatestReports::default()),
            state: Arc::new(connection::SharedConnectionState::default()),
            worker: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Spawns the background worker, delivering reports to `on_report`
    ///
    /// Recovered errors (dropped records, connection losses, callback
    /// failures) are logged but otherwise discarded; use
    /// [`start_with_observer`](WatchClient::start_with_observer) to
    /// receive them programmatically.
    ///
    /// Fails with [`GpsdWatchError::AlreadyStarted`] while a worker is
    /// running.
    pub fn start<F>(&mut self, on_report: F) -> Result<()>
    where
        F: FnMut(Report) -> core::result::Result<(), CallbackError> + Send + 'static,
    {
        self.start_with_observer(on_report, |_err: &GpsdWatchError| {})
    }

    /// Like [`start`](WatchClient::start), with an error observer
    ///
    /// The observer runs on the worker task for every error the worker
    /// recovers from; it must not block for long.
    pub fn start_with_observer<F, E>(&mut self, on_report: F, on_error: E) -> Result<()>
    where
        F: FnMut(Report) -> core::result::Result<(), CallbackError> + Send + 'static,
        E: FnMut(&GpsdWatchError) + Send + 'static,
    {
        if self.is_running() {
            return Err(GpsdWatchError::AlreadyStarted);
        }

        let dispatcher = Dispatcher::new(
            Box::new(on_report),
            Box::new(on_error),
            Arc::clone(&self.latest),
        );
        let cancel = CancellationToken::new();
        let worker = worker::Worker::new(
            self.endpoint.addr(),
            self.opts.clone(),
            dispatcher,
            Arc::clone(&self.state),
            cancel.clone(),
        );

        let join = tokio::spawn(worker.run());
        self.worker = Some(WorkerHandle { cancel, join });
        Ok(())
    }

    /// Stops the background worker and waits for it to fully exit
    ///
    /// Idempotent; a no-op when no worker is running. On return the
    /// socket is closed, no further callbacks will run, and the client
    /// may be started again.
    pub async fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        handle.cancel.cancel();
        if handle.join.await.is_err() {
            // A panicking consumer callback takes the task down with it;
            // surface that instead of swallowing the JoinError.
            warn!(endpoint = %self.endpoint, "gpsd watch worker panicked");
        }
    }

    /// Snapshot of the last report seen for `class`
    ///
    /// Synchronous and non-blocking; never touches the network.
    pub fn latest(&self, class: ReportClass) -> Option<Report> {
        self.latest.latest(class)
    }

    /// Current connection state as published by the worker
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether a worker is currently running
    ///
    /// A worker whose task has already exited (a panicking consumer
    /// callback takes it down) counts as stopped, so `start` accepts a
    /// replacement without an intervening [`stop`](WatchClient::stop).
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| !handle.join.is_finished())
    }
}

impl Drop for WatchClient {
    /// Signals the worker to stop if the handle is dropped without an
    /// explicit `stop`; dropping cannot wait for the task to exit
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            handle.cancel.cancel();
        }
    }
}
