//! Socket-facing connection core, reconnect policy and connection state
//!
//! A [`Connection`] owns one live socket in watch mode: it performs the
//! `?WATCH` handshake on open and drives the line framer from socket
//! reads. The reconnect decision lives with the caller (the worker loop),
//! which consults a [`Backoff`] between attempts and publishes the
//! current [`ConnectionState`] through a shared atomic cell.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::AsyncReadExt;

use crate::framing::LineFramer;
use crate::protocol::GpsdJsonEncodeAsync;
use crate::protocol::v3::{RequestMessage, Watch};
use crate::{Result, error::GpsdWatchError};

/// Where the client currently stands with the daemon
///
/// The worker moves `Disconnected → Connecting → Watching`, falling back
/// to `Disconnected` on any connection-level error. After an explicit
/// stop the state is `Disconnected` and stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// No socket held
    Disconnected = 0,
    /// Socket open or handshake in progress
    Connecting = 1,
    /// Socket live, report stream being consumed
    Watching = 2,
}

/// Lock-free connection state cell shared between worker and caller
#[derive(Debug, Default)]
pub(crate) struct SharedConnectionState(AtomicU8);

impl SharedConnectionState {
    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> ConnectionState {
        match self.0.load(Ordering::Acquire) {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Watching,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Exponential backoff between reconnect attempts
///
/// Each call to [`next_delay`](Backoff::next_delay) returns the current
/// delay and doubles it up to the cap. [`reset`](Backoff::reset) returns
/// to the base delay and is called whenever a connection reaches the
/// watching state, so transient drops recover quickly while an
/// unreachable daemon is not hammered.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Backoff {
            base,
            cap,
            next: base,
        }
    }

    /// Returns the delay for the next attempt and advances the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.cap);
        delay
    }

    /// Drops back to the base delay
    pub fn reset(&mut self) {
        self.next = self.base;
    }
}

/// One live, watch-enabled connection to the daemon
///
/// Generic over the stream type so tests can drive it with in-memory
/// streams; the worker uses a `tokio::net::TcpStream` through the
/// `futures_io` compat adapter.
#[derive(Debug)]
pub(crate) struct Connection<S> {
    stream: S,
    framer: LineFramer,
    chunk: [u8; 2048],
}

impl<S> Connection<S>
where
    S: futures_io::AsyncRead + futures_io::AsyncWrite + Unpin,
{
    /// Sends the watch-enable command and wraps the stream for reading
    pub(crate) async fn open(mut stream: S, watch: Watch, max_frame_len: usize) -> Result<Self> {
        stream
            .write_request(&RequestMessage::Watch(Some(watch)))
            .await?;

        Ok(Connection {
            stream,
            framer: LineFramer::new(max_frame_len),
            chunk: [0u8; 2048],
        })
    }

    /// Returns the next framed record, or `Ok(None)` once the peer closes
    ///
    /// Read errors and oversized frames surface as connection-level
    /// errors; the caller drops the connection (and this framer's
    /// buffered partial record with it) and reconnects.
    pub(crate) async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(line) = self.framer.next_line()? {
                return Ok(Some(line));
            }

            let bytes_read = self
                .stream
                .read(&mut self.chunk)
                .await
                .map_err(GpsdWatchError::IoError)?;
            if bytes_read == 0 {
                return Ok(None); // EOF reached
            }
            self.framer.extend(&self.chunk[..bytes_read]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_to_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(8));
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 8]);
    }

    #[test]
    fn test_backoff_reset_returns_to_base() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_shared_connection_state_roundtrip() {
        let state = SharedConnectionState::default();
        assert_eq!(state.get(), ConnectionState::Disconnected);

        state.set(ConnectionState::Connecting);
        assert_eq!(state.get(), ConnectionState::Connecting);
        state.set(ConnectionState::Watching);
        assert_eq!(state.get(), ConnectionState::Watching);
        state.set(ConnectionState::Disconnected);
        assert_eq!(state.get(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_open_sends_watch_command() {
        let stream = futures::io::Cursor::new(Vec::new());
        let conn = Connection::open(stream, Watch::enable_json(), 1024)
            .await
            .unwrap();

        assert_eq!(
            conn.stream.into_inner(),
            br#"?WATCH={"enable":true,"json":true};"#
        );
    }

    #[tokio::test]
    async fn test_next_line_frames_and_signals_eof() {
        let mut conn = Connection {
            stream: futures::io::Cursor::new(b"{\"class\":\"TPV\",\"mode\":0}\n\n".to_vec()),
            framer: LineFramer::new(1024),
            chunk: [0u8; 2048],
        };

        assert_eq!(
            conn.next_line().await.unwrap(),
            Some(b"{\"class\":\"TPV\",\"mode\":0}".to_vec())
        );
        assert_eq!(conn.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_line_rejects_unbounded_record() {
        let mut conn = Connection {
            stream: futures::io::Cursor::new(vec![b'x'; 64]),
            framer: LineFramer::new(16),
            chunk: [0u8; 2048],
        };

        assert!(matches!(
            conn.next_line().await,
            Err(GpsdWatchError::FrameTooLarge { limit: 16 })
        ));
    }
}
