//! Decoder for the daemon's multiplexed log stream.
//!
//! Without a TTY the daemon interleaves stdout and stderr on one byte
//! stream. Each frame starts with an 8-byte header: one stream-type byte,
//! three padding bytes, and a big-endian u32 payload length, followed by
//! exactly that many payload bytes.

use std::fmt;

/// Frame header length in bytes.
const HEADER_LEN: usize = 8;

/// Which stream a log frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard input (only appears on attach streams).
    Stdin,
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl StreamKind {
    /// Map the header tag byte onto a stream kind.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Stdin),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            _ => None,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// One decoded frame borrowing its payload from the stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFrame<'a> {
    /// Stream the frame belongs to.
    pub stream: StreamKind,
    /// Raw payload bytes.
    pub payload: &'a [u8],
}

/// Iterator over complete frames in a raw log buffer.
///
/// Decoding stops silently at the first incomplete frame: fewer than 8
/// bytes of header left, or a declared length larger than the remaining
/// buffer. A frame is never partially emitted.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Frames<'a> {
    /// Decode frames from a raw multiplexed buffer.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = LogFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.buf[self.offset..];
            if rest.len() < HEADER_LEN {
                return None;
            }

            let tag = rest[0];
            let len = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
            if rest.len() - HEADER_LEN < len {
                // Truncated trailing frame: end of stream, not an error.
                return None;
            }

            let payload = &rest[HEADER_LEN..HEADER_LEN + len];
            self.offset += HEADER_LEN + len;

            // Frames with an unknown tag are skipped rather than surfaced;
            // the daemon only emits 0..=2.
            if let Some(stream) = StreamKind::from_tag(tag) {
                return Some(LogFrame { stream, payload });
            }
        }
    }
}

/// Iterator over logical text lines in a raw log buffer.
///
/// Lazy and finite: one line per non-empty frame, payload decoded as lossy
/// UTF-8 with trailing whitespace trimmed. Frame order is preserved; frames
/// are never merged or reordered.
#[derive(Debug, Clone)]
pub struct LogLines<'a> {
    frames: Frames<'a>,
}

impl<'a> LogLines<'a> {
    /// Decode lines from a raw multiplexed buffer.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            frames: Frames::new(buf),
        }
    }
}

impl Iterator for LogLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        for frame in self.frames.by_ref() {
            let text = String::from_utf8_lossy(frame.payload);
            let line = text.trim_end();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
        None
    }
}

/// Decode a whole buffer into its non-empty text lines.
#[must_use]
pub fn decode_lines(buf: &[u8]) -> Vec<String> {
    LogLines::new(buf).collect()
}
