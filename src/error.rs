//! Error types for GPSD watch client operations
//!
//! This module defines the error types that can occur while talking to a
//! GPSD daemon or while decoding its JSON protocol records.

/// Main error type for GPSD watch client operations
///
/// Connection-level errors (`IoError`, `FrameTooLarge`, `ReadTimeout`) cause
/// the background worker to drop the socket and reconnect with backoff.
/// Record-level errors (`SerdeError`, `MissingClass`, `Callback`) drop the
/// offending record only; the stream keeps going. `AlreadyStarted` is
/// returned synchronously to the caller and never crosses the worker.
#[derive(Debug)]
pub enum GpsdWatchError {
    /// I/O error occurred during network communication
    ///
    /// This typically happens when the connection to GPSD is lost,
    /// the daemon is unreachable, or there are network-related issues.
    IoError(std::io::Error),

    /// JSON deserialization error
    ///
    /// Occurs when GPSD sends malformed JSON or when a record does not
    /// match the expected message structure.
    SerdeError(serde_json::Error),

    /// A record was valid JSON but carried no `class` field
    ///
    /// Every GPSD response object is required to identify itself through
    /// its `class` member; a record without one cannot be classified.
    MissingClass,

    /// No newline was seen within the configured buffer limit
    ///
    /// GPSD records are at most a few kilobytes, so an unbounded line is
    /// taken as stream corruption and treated as a connection-level error.
    FrameTooLarge {
        /// The configured maximum buffered frame size in bytes
        limit: usize,
    },

    /// No data arrived within the configured read timeout
    ///
    /// A dead peer that never sends a TCP reset would otherwise stall the
    /// worker forever; the timeout converts that into a reconnect.
    ReadTimeout(std::time::Duration),

    /// The consumer callback returned an error
    ///
    /// Reported through the error observer; the worker continues with the
    /// next record.
    Callback(Box<dyn std::error::Error + Send + Sync>),

    /// `start` was called while a worker is already running
    AlreadyStarted,
}

impl GpsdWatchError {
    /// Whether this error tears down the current connection
    ///
    /// Connection-level errors trigger the reconnect path; everything else
    /// costs at most the record it occurred on.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            GpsdWatchError::IoError(_)
                | GpsdWatchError::FrameTooLarge { .. }
                | GpsdWatchError::ReadTimeout(_)
        )
    }
}

impl core::fmt::Display for GpsdWatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsdWatchError::IoError(err) => write!(f, "IoError: {}", err),
            GpsdWatchError::SerdeError(err) => write!(f, "SerdeError: {}", err),
            GpsdWatchError::MissingClass => {
                write!(f, "MissingClass: record has no class field")
            }
            GpsdWatchError::FrameTooLarge { limit } => {
                write!(f, "FrameTooLarge: no newline within {} bytes", limit)
            }
            GpsdWatchError::ReadTimeout(timeout) => {
                write!(f, "ReadTimeout: no data for {:?}", timeout)
            }
            GpsdWatchError::Callback(err) => write!(f, "Callback: {}", err),
            GpsdWatchError::AlreadyStarted => {
                write!(f, "AlreadyStarted: client worker is already running")
            }
        }
    }
}

impl core::error::Error for GpsdWatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_classified() {
        let eof = GpsdWatchError::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "peer closed",
        ));
        assert!(eof.is_connection_error());
        assert!(GpsdWatchError::FrameTooLarge { limit: 8192 }.is_connection_error());
        assert!(
            GpsdWatchError::ReadTimeout(std::time::Duration::from_secs(30))
                .is_connection_error()
        );

        assert!(!GpsdWatchError::MissingClass.is_connection_error());
        assert!(!GpsdWatchError::AlreadyStarted.is_connection_error());
    }

    #[test]
    fn test_display_names_the_variant() {
        let err = GpsdWatchError::FrameTooLarge { limit: 16 };
        assert_eq!(err.to_string(), "FrameTooLarge: no newline within 16 bytes");
    }
}
