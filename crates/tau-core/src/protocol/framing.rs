//! Length-prefixed framing and the incremental stream parser.
//!
//! Wire format of one frame:
//!
//! ```text
//! <body length as decimal ASCII digits>|<body bytes>
//! ```
//!
//! For example `13|{"type":"x"}`.  The body is one JSON packet.
//!
//! # Why a buffer is needed
//!
//! TCP delivers a byte stream, not messages.  A single read may return half a
//! header, a body split across many reads, or several frames at once.
//! [`StreamParser`] keeps the unconsumed remainder between calls and only
//! ever hands out complete frames, in arrival order, each exactly once.
//!
//! # States
//!
//! ```text
//! AwaitingHeader ──(digits + '|')──▶ AwaitingBody{declared} ──(declared bytes)──▶ emit
//!       ▲                                                                        │
//!       └────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Separator between the length digits and the body.
pub const HEADER_DELIMITER: u8 = b'|';

/// Default upper bound for a frame body: 1 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Fatal framing errors.  The stream cannot be resynchronized after any of
/// these; the caller should close the connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FramingError {
    /// A header byte that is neither a digit nor the delimiter.
    #[error("invalid frame header byte 0x{byte:02X} at offset {offset}")]
    InvalidHeader { byte: u8, offset: usize },

    /// The declared body length exceeds the configured maximum.
    #[error("frame of {declared} bytes exceeds maximum frame size of {max} bytes")]
    FrameTooLarge { declared: usize, max: usize },

    /// A header declaring a zero-length body.  Every frame carries one packet.
    #[error("frame header declares an empty body")]
    EmptyFrame,

    /// The stream ended in the middle of a frame.
    #[error("stream ended inside a frame: {buffered} byte(s) buffered{}", expected_suffix(.expected))]
    Truncated {
        buffered: usize,
        expected: Option<usize>,
    },
}

fn expected_suffix(expected: &Option<usize>) -> String {
    match expected {
        Some(n) => format!(", body of {n} byte(s) expected"),
        None => String::new(),
    }
}

/// One complete frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Wraps `payload` in a frame header.
///
/// # Errors
///
/// Returns [`FramingError::EmptyFrame`] for an empty payload and
/// [`FramingError::FrameTooLarge`] when the payload exceeds `max_frame_size`.
///
/// # Examples
///
/// ```rust
/// use tau_core::protocol::framing::{encode_frame, DEFAULT_MAX_FRAME_SIZE};
///
/// let frame = encode_frame(b"{}", DEFAULT_MAX_FRAME_SIZE).unwrap();
/// assert_eq!(frame, b"2|{}");
/// ```
pub fn encode_frame(payload: &[u8], max_frame_size: usize) -> Result<Vec<u8>, FramingError> {
    if payload.is_empty() {
        return Err(FramingError::EmptyFrame);
    }
    if payload.len() > max_frame_size {
        return Err(FramingError::FrameTooLarge {
            declared: payload.len(),
            max: max_frame_size,
        });
    }
    let header = payload.len().to_string();
    let mut buf = Vec::with_capacity(header.len() + 1 + payload.len());
    buf.extend_from_slice(header.as_bytes());
    buf.push(HEADER_DELIMITER);
    buf.extend_from_slice(payload);
    Ok(buf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Accumulating length digits until the delimiter arrives.
    AwaitingHeader,
    /// Header consumed; waiting until `declared` body bytes are buffered.
    AwaitingBody { declared: usize },
}

/// Incremental parser turning arbitrarily fragmented input into frames.
///
/// The parser never performs I/O and never closes anything; it only reports.
/// After a fatal error it stays failed and returns the same error on every
/// subsequent call.
///
/// # Examples
///
/// ```rust
/// use tau_core::protocol::framing::StreamParser;
///
/// let mut parser = StreamParser::default();
/// assert!(parser.feed(b"5|he").unwrap().is_empty());
/// let frames = parser.feed(b"llo3|abc").unwrap();
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].payload(), b"hello");
/// assert_eq!(frames[1].payload(), b"abc");
/// ```
#[derive(Debug, Clone)]
pub struct StreamParser {
    state: ParseState,
    buffer: Vec<u8>,
    /// Start of the unconsumed bytes in `buffer`.
    read_pos: usize,
    max_frame_size: usize,
    max_header_digits: usize,
    failed: Option<FramingError>,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl StreamParser {
    /// Creates a parser that rejects frames larger than `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            state: ParseState::AwaitingHeader,
            buffer: Vec::with_capacity(4096),
            read_pos: 0,
            max_frame_size,
            max_header_digits: max_frame_size.to_string().len(),
            failed: None,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Number of bytes received but not yet handed out as part of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Returns `true` when the parser is between frames with nothing buffered.
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::AwaitingHeader && self.buffered_len() == 0
    }

    /// Appends newly received bytes, first dropping bytes already handed out.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.failed.is_none() {
            self.compact();
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Extracts the next complete frame, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] when the buffered header is invalid or
    /// declares an oversized or empty body.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FramingError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        match self.step() {
            Ok(frame) => Ok(frame),
            Err(err) => {
                self.reset_buffer();
                self.failed = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Pushes `chunk` and drains every frame that became complete.
    ///
    /// # Errors
    ///
    /// Returns the first [`FramingError`] encountered.  Frames completed
    /// before the error in the same call are dropped by this convenience
    /// method; callers that must see them use [`StreamParser::push`] and
    /// [`StreamParser::next_frame`] directly.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, FramingError> {
        self.push(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Signals end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::Truncated`] when a partial frame is buffered,
    /// or the earlier fatal error if the parser had already failed.
    pub fn finish(&mut self) -> Result<(), FramingError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.is_idle() {
            return Ok(());
        }
        let expected = match self.state {
            ParseState::AwaitingBody { declared } => Some(declared),
            ParseState::AwaitingHeader => None,
        };
        let err = FramingError::Truncated {
            buffered: self.buffered_len(),
            expected,
        };
        self.reset_buffer();
        self.state = ParseState::AwaitingHeader;
        self.failed = Some(err.clone());
        Err(err)
    }

    fn step(&mut self) -> Result<Option<Frame>, FramingError> {
        if self.state == ParseState::AwaitingHeader {
            match self.parse_header()? {
                Some(declared) => self.state = ParseState::AwaitingBody { declared },
                None => return Ok(None),
            }
        }

        let ParseState::AwaitingBody { declared } = self.state else {
            return Ok(None);
        };
        if self.buffered_len() < declared {
            return Ok(None);
        }

        let end = self.read_pos + declared;
        let payload = self.buffer[self.read_pos..end].to_vec();
        self.read_pos = end;
        self.state = ParseState::AwaitingHeader;
        Ok(Some(Frame::new(payload)))
    }

    /// Drops consumed bytes from the front of the buffer, once per `push`
    /// rather than once per frame.
    fn compact(&mut self) {
        if self.read_pos == 0 {
            return;
        }
        if self.read_pos == self.buffer.len() {
            self.buffer.clear();
        } else {
            self.buffer.drain(..self.read_pos);
        }
        self.read_pos = 0;
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.read_pos = 0;
    }

    /// Parses `digits|` at the read position and consumes it.
    ///
    /// Oversized lengths are rejected as soon as the digits seen so far make
    /// it impossible to stay within the limit, without waiting for the
    /// delimiter.
    fn parse_header(&mut self) -> Result<Option<usize>, FramingError> {
        let mut declared: usize = 0;
        let mut header_len = None;
        for (offset, &byte) in self.buffer[self.read_pos..].iter().enumerate() {
            match byte {
                b'0'..=b'9' => {
                    if offset >= self.max_header_digits {
                        return Err(self.too_large(declared));
                    }
                    declared = declared
                        .checked_mul(10)
                        .and_then(|d| d.checked_add(usize::from(byte - b'0')))
                        .ok_or_else(|| self.too_large(usize::MAX))?;
                    if declared > self.max_frame_size {
                        return Err(self.too_large(declared));
                    }
                }
                HEADER_DELIMITER if offset > 0 => {
                    if declared == 0 {
                        return Err(FramingError::EmptyFrame);
                    }
                    header_len = Some(offset + 1);
                    break;
                }
                _ => return Err(FramingError::InvalidHeader { byte, offset }),
            }
        }
        match header_len {
            Some(len) => {
                self.read_pos += len;
                Ok(Some(declared))
            }
            None => Ok(None),
        }
    }

    fn too_large(&self, declared: usize) -> FramingError {
        FramingError::FrameTooLarge {
            declared,
            max: self.max_frame_size,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
