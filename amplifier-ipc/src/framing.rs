//! Line framing over raw worker output
//!
//! Pipe reads do not respect line boundaries: a single read may contain
//! several lines, or end in the middle of one. [`LineFramer`] keeps the
//! trailing partial line until the rest arrives, and [`LineReader`] drives a
//! framer from any `AsyncRead`.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::IpcError;

/// Longest line kept; longer lines are dropped whole
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Splits a byte stream into lines, buffering a partial trailing line across feeds
#[derive(Debug)]
pub struct LineFramer {
    partial: Vec<u8>,
    max_line_bytes: usize,
    /// Inside an overlong line, skipping to its newline
    discarding: bool,
    dropped: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            partial: Vec::new(),
            max_line_bytes: max_line_bytes.max(1),
            discarding: false,
            dropped: 0,
        }
    }

    /// Append bytes and return every line they complete, without terminators
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            if self.discarding {
                self.discarding = false;
            } else {
                self.partial.extend_from_slice(&rest[..pos]);
                if self.partial.len() > self.max_line_bytes {
                    self.drop_line();
                } else {
                    lines.push(self.take_line());
                }
            }
            rest = &rest[pos + 1..];
        }

        if !self.discarding {
            self.partial.extend_from_slice(rest);
            if self.partial.len() > self.max_line_bytes {
                self.drop_line();
                self.discarding = true;
            }
        }

        lines
    }

    /// Flush the unterminated remainder once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        self.discarding = false;
        if self.partial.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    /// Bytes buffered waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }

    /// Overlong lines dropped so far
    pub fn dropped_lines(&self) -> usize {
        self.dropped
    }

    fn drop_line(&mut self) {
        self.partial.clear();
        self.dropped += 1;
        tracing::warn!(max_line_bytes = self.max_line_bytes, "Dropping worker output line over the size limit");
    }

    fn take_line(&mut self) -> String {
        let mut raw = std::mem::take(&mut self.partial);
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        String::from_utf8_lossy(&raw).into_owned()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Async line reader over a worker pipe.
///
/// `next_line` is cancel-safe: the only await point is a single `read`, and
/// lines already framed are queued, so it can sit inside `tokio::select!`.
pub struct LineReader<R> {
    inner: R,
    framer: LineFramer,
    ready: VecDeque<String>,
    buf: Box<[u8]>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_framer(inner, LineFramer::new())
    }

    pub fn with_framer(inner: R, framer: LineFramer) -> Self {
        Self {
            inner,
            framer,
            ready: VecDeque::new(),
            buf: vec![0u8; READ_CHUNK].into_boxed_slice(),
            eof: false,
        }
    }

    /// Next complete line, or `None` once the stream is exhausted
    pub async fn next_line(&mut self) -> Result<Option<String>, IpcError> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }

            let n = self.inner.read(&mut self.buf).await?;
            if n == 0 {
                self.eof = true;
                self.ready.extend(self.framer.finish());
            } else {
                self.ready.extend(self.framer.feed(&self.buf[..n]));
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.eof && self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_held_across_feeds() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"STREAM:{\"type\":\"chu").is_empty());
        assert_eq!(framer.pending_len(), 19);

        let lines = framer.feed(b"nk\",\"content\":\"A\"}\nnext");
        assert_eq!(lines, vec![r#"STREAM:{"type":"chunk","content":"A"}"#.to_string()]);
        assert_eq!(framer.finish().as_deref(), Some("next"));
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_multiple_lines_and_crlf() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"one\r\ntwo\n\nthree\n");
        assert_eq!(lines, vec!["one", "two", "", "three"]);
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(&[b'a', 0xff, b'b', b'\n']);
        assert_eq!(lines, vec!["a\u{fffd}b"]);
    }

    #[test]
    fn test_oversized_line_is_dropped_whole() {
        let mut framer = LineFramer::with_max_line_bytes(4);
        assert!(framer.feed(b"abcdefghij").is_empty());
        assert_eq!(framer.pending_len(), 0);

        let lines = framer.feed(b"klm\nok\n");
        assert_eq!(lines, vec!["ok"]);
        assert_eq!(framer.dropped_lines(), 1);
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_multibyte_text_never_torn() {
        let mut framer = LineFramer::with_max_line_bytes(6);
        let lines = framer.feed("héllo\nwörld!!\nfin\n".as_bytes());
        assert_eq!(lines, vec!["héllo", "fin"]);
        assert_eq!(framer.dropped_lines(), 1);
        assert!(lines.iter().all(|line| !line.contains('\u{fffd}')));
    }

    #[tokio::test]
    async fn test_line_reader_over_split_reads() {
        let reader = tokio_test::io::Builder::new()
            .read(b"hel")
            .read(b"lo\nwor")
            .read(b"ld")
            .build();
        let mut lines = LineReader::new(reader);

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("world"));
        assert!(lines.next_line().await.unwrap().is_none());
        assert!(lines.is_finished());
    }
}
