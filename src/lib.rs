//! # gpsd-watch
//!
//! A background client for GPSD (GPS Service Daemon) built on its JSON protocol.
//!
//! This library keeps a persistent TCP connection to a GPSD daemon, enables
//! watch mode, and consumes the resulting stream of newline-delimited JSON
//! reports on a background task. Incoming TPV (time/position/velocity),
//! SKY (satellite visibility) and ATT (attitude) reports are decoded into
//! typed values, handed to a consumer callback in arrival order, and cached
//! so the latest report of each class can be queried without blocking.
//!
//! The connection is self-healing: on connect failure, peer close, read
//! timeout or oversized frame the worker closes the socket, waits with
//! exponential backoff, and reconnects. Nothing on the read/decode/dispatch
//! path terminates the worker short of an explicit [`WatchClient::stop`].
//!
//! ## Example
//!
//! ```no_run
//! use gpsd_watch::client::{Endpoint, WatchClient};
//! use gpsd_watch::protocol::v3::{Report, ReportClass};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = WatchClient::new(Endpoint::default());
//! client.start(|report| {
//!     if let Report::Tpv(tpv) = &report {
//!         println!("fix mode: {:?}", tpv.mode);
//!     }
//!     Ok(())
//! })?;
//!
//! // Elsewhere, query the latest fix without touching the network.
//! let last_fix = client.latest(ReportClass::Tpv);
//! println!("latest: {last_fix:?}");
//!
//! client.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`WatchClient::stop`]: client::WatchClient::stop

use crate::error::GpsdWatchError;

/// Client handle, connection management and the background worker
#[cfg(feature = "proto-v3")]
pub mod client;

/// Error types used throughout the library
pub mod error;

/// Newline framing of the raw socket byte stream
pub mod framing;

/// Protocol definitions and message parsing for the GPSD JSON protocol
pub mod protocol;

/// Report delivery to the consumer and latest-value caching
#[cfg(feature = "proto-v3")]
pub mod sink;

/// Convenience type alias for Results with GpsdWatchError
pub type Result<T> = core::result::Result<T, GpsdWatchError>;
