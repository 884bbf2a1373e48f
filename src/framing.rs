//! Newline framing for the GPSD byte stream
//!
//! GPSD speaks newline-delimited JSON over TCP, but TCP reads arrive at
//! arbitrary byte boundaries. [`LineFramer`] accumulates raw chunks and
//! yields complete records one line at a time, independent of how the
//! stream was split into reads. A partial record at the end of a read is
//! buffered until its newline arrives.

use crate::{Result, error::GpsdWatchError};

/// Default cap on a single buffered record, in bytes
///
/// GPSD records are at most a few kilobytes; a SKY report with a full
/// constellation view stays well under this.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024;

/// Incremental splitter of a byte stream into newline-terminated records
///
/// Feed socket reads in with [`extend`](LineFramer::extend) and drain
/// complete lines with [`next_line`](LineFramer::next_line). Empty lines
/// are skipped and line terminators (`\n` or `\r\n`) are stripped.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    /// Bytes already scanned for a newline, to avoid rescanning on
    /// every partial read
    searched: usize,
    max_len: usize,
}

impl LineFramer {
    /// Creates a framer that fails once `max_len` bytes are buffered
    /// without a newline
    pub fn new(max_len: usize) -> Self {
        LineFramer {
            buf: Vec::new(),
            searched: 0,
            max_len,
        }
    }

    /// Appends one chunk of raw socket bytes
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns the next complete record, without its line terminator
    ///
    /// `Ok(None)` means no complete line is buffered yet. An unterminated
    /// record growing past the configured limit yields
    /// [`GpsdWatchError::FrameTooLarge`]; the connection should be dropped
    /// and the framer discarded with it.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let Some(pos) = self.buf[self.searched..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|pos| self.searched + pos)
            else {
                self.searched = self.buf.len();
                if self.buf.len() > self.max_len {
                    return Err(GpsdWatchError::FrameTooLarge {
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.searched = 0;
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(framer: &mut LineFramer) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        while let Some(line) = framer.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_framing_splits_lines() {
        let mut framer = LineFramer::new(DEFAULT_MAX_FRAME_LEN);
        framer.extend(b"{\"class\":\"TPV\"}\n{\"class\":\"SKY\"}\r\n");
        assert_eq!(
            drain(&mut framer),
            vec![b"{\"class\":\"TPV\"}".to_vec(), b"{\"class\":\"SKY\"}".to_vec()]
        );
    }

    #[test]
    fn test_framing_buffers_partial_record() {
        let mut framer = LineFramer::new(DEFAULT_MAX_FRAME_LEN);
        framer.extend(b"{\"class\":");
        assert!(framer.next_line().unwrap().is_none());
        framer.extend(b"\"TPV\"}\n");
        assert_eq!(
            framer.next_line().unwrap(),
            Some(b"{\"class\":\"TPV\"}".to_vec())
        );
    }

    #[test]
    fn test_framing_skips_empty_lines() {
        let mut framer = LineFramer::new(DEFAULT_MAX_FRAME_LEN);
        framer.extend(b"\n\r\na\n\n\nb\n");
        assert_eq!(drain(&mut framer), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_framing_chunk_boundary_independence() {
        let stream = b"{\"class\":\"TPV\",\"mode\":3}\n\r\n{\"class\":\"SKY\"}\r\n{\"class\":\"ATT\"}\n";

        let mut whole = LineFramer::new(DEFAULT_MAX_FRAME_LEN);
        whole.extend(stream);
        let expected = drain(&mut whole);
        assert_eq!(expected.len(), 3);

        for chunk_size in 1..stream.len() {
            let mut framer = LineFramer::new(DEFAULT_MAX_FRAME_LEN);
            let mut lines = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                framer.extend(chunk);
                lines.extend(drain(&mut framer));
            }
            assert_eq!(lines, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_framing_rejects_oversized_record() {
        let mut framer = LineFramer::new(16);
        framer.extend(&[b'x'; 17]);
        assert!(matches!(
            framer.next_line(),
            Err(GpsdWatchError::FrameTooLarge { limit: 16 })
        ));
    }

    #[test]
    fn test_framing_limit_allows_exact_fit() {
        let mut framer = LineFramer::new(16);
        framer.extend(&[b'x'; 16]);
        assert!(framer.next_line().unwrap().is_none());
        framer.extend(b"\n");
        assert_eq!(framer.next_line().unwrap(), Some(vec![b'x'; 16]));
    }
}
