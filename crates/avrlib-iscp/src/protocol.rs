//! ISCP frame encoder/decoder.
//!
//! ISCP over RS-232 is plain ASCII. Commands sent to the receiver are
//! wrapped in a fixed envelope:
//!
//! ```text
//! !1<code><argument>\r
//! ```
//!
//! - `!`: start character.
//! - `1`: unit type (1 = receiver).
//! - `<code>`: three uppercase letters (`PWR`, `MVL`, ...).
//! - `<argument>`: command parameter, or `QSTN` to query.
//! - Terminator: carriage return (0x0D).
//!
//! Messages from the receiver use the same `!1<code><argument>` layout but
//! end with an EOF byte (0x1A) instead of a carriage return, sometimes
//! followed by CR/LF that ends up at the start of the next frame. Replies
//! to queries and spontaneous notifications are indistinguishable.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use avrlib_core::error::Error;

use crate::commands::Command;

/// Envelope header: start character plus receiver unit type.
pub const HEADER: &[u8] = b"!1";

/// Terminator appended to every outgoing command.
pub const TERMINATOR: u8 = b'\r';

/// Delimiter that ends every message from the receiver.
pub const DELIMITER: u8 = 0x1A;

/// Shortest frame that carries a full code and argument.
pub const MIN_FRAME_LEN: usize = 7;

/// Buffer limit before undelimited input is discarded.
/// ISCP messages are well under 100 bytes; 8192 is generous headroom.
pub const MAX_FRAME_LEN: usize = 8192;

/// Encode a command into the exact bytes written to the transport.
///
/// # Example
///
/// ```
/// use avrlib_iscp::protocol::encode;
///
/// assert_eq!(encode("PL1"), b"!1PL1\r");
/// assert_eq!(encode("MVL2D"), b"!1MVL2D\r");
/// ```
pub fn encode(command: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(HEADER.len() + command.len() + 1);
    put_envelope(&mut buf, command);
    buf.to_vec()
}

fn put_envelope(buf: &mut BytesMut, command: &str) {
    buf.put_slice(HEADER);
    buf.put_slice(command.as_bytes());
    buf.put_u8(TERMINATOR);
}

/// One delimiter-bounded message from the receiver, delimiter excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Bytes);

impl Frame {
    /// Wrap raw frame bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Frame(bytes.into())
    }

    /// The raw bytes of the frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the frame is empty (two adjacent delimiters).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the frame into command code and argument.
    ///
    /// Leading CR/LF left over from the previous message is skipped, then
    /// the code is read from offsets 2..5 and the argument from 5..7. The
    /// header bytes themselves are not checked.
    pub fn parse(&self) -> ParsedFrame {
        let start = self
            .0
            .iter()
            .position(|&b| b != b'\r' && b != b'\n')
            .unwrap_or(self.0.len());
        let body = &self.0[start..];

        if body.len() < MIN_FRAME_LEN {
            return ParsedFrame::Unparseable {
                reason: "frame shorter than header, code and argument",
            };
        }

        let code = &body[2..5];
        if !code.iter().all(u8::is_ascii_alphanumeric) {
            return ParsedFrame::Unparseable {
                reason: "command code is not ASCII alphanumeric",
            };
        }
        let argument = &body[5..7];
        if !argument.iter().all(u8::is_ascii_graphic) {
            return ParsedFrame::Unparseable {
                reason: "argument is not printable ASCII",
            };
        }

        let payload = String::from_utf8_lossy(&body[5..])
            .trim_end_matches(['\r', '\n', ' '])
            .to_string();

        ParsedFrame::Response {
            code: String::from_utf8_lossy(code).into_owned(),
            argument: String::from_utf8_lossy(argument).into_owned(),
            payload,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Result of parsing a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame {
    /// A structurally valid message.
    Response {
        /// Three-character command code (e.g. `"PWR"`).
        code: String,
        /// Two-character argument field (e.g. `"01"`).
        argument: String,
        /// Everything after the code, trailing CR/LF removed.
        payload: String,
    },

    /// The frame is too short or has a malformed code/argument field.
    Unparseable {
        /// Why the frame was rejected.
        reason: &'static str,
    },
}

/// `tokio_util` codec for ISCP: frames inbound on 0x1A, envelopes outbound.
///
/// Usable directly with `FramedRead`/`Framed` over an `AsyncRead` port, and
/// internally by [`FrameDecoder`].
#[derive(Debug, Clone)]
pub struct IscpCodec {
    max_frame_len: usize,
}

impl IscpCodec {
    /// Create a codec with a custom buffer limit.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        IscpCodec { max_frame_len }
    }
}

impl Default for IscpCodec {
    fn default() -> Self {
        Self::with_max_frame_len(MAX_FRAME_LEN)
    }
}

impl Decoder for IscpCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        match src.iter().position(|&b| b == DELIMITER) {
            Some(pos) => {
                let frame = src.split_to(pos).freeze();
                src.advance(1);
                Ok(Some(Frame(frame)))
            }
            None => {
                if src.len() > self.max_frame_len {
                    warn!(len = src.len(), "no frame delimiter in buffer, discarding");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<&Command> for IscpCodec {
    type Error = Error;

    fn encode(&mut self, command: &Command, dst: &mut BytesMut) -> Result<(), Error> {
        dst.reserve(HEADER.len() + command.as_str().len() + 1);
        put_envelope(dst, command.as_str());
        Ok(())
    }
}

/// Incremental frame splitter over an owned buffer.
///
/// Bytes are appended as they arrive; [`frames`](FrameDecoder::frames)
/// yields every complete frame and leaves any partial tail buffered until
/// its delimiter shows up.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    codec: IscpCodec,
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create a decoder with the default buffer limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with a custom buffer limit.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        FrameDecoder {
            codec: IscpCodec::with_max_frame_len(max_frame_len),
            buf: BytesMut::new(),
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Drain complete frames in arrival order.
    pub fn frames(&mut self) -> impl Iterator<Item = Frame> + '_ {
        std::iter::from_fn(move || self.codec.decode(&mut self.buf).ok().flatten())
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_power_on() {
        assert_eq!(encode("PL1"), b"!1PL1\r");
    }

    #[test]
    fn encode_volume() {
        assert_eq!(encode("MVL2D"), b"!1MVL2D\r");
    }

    #[test]
    fn encode_query() {
        assert_eq!(encode("PWRQSTN"), b"!1PWRQSTN\r");
    }

    #[test]
    fn codec_encoder_matches_encode() {
        let command = Command::new("AMT01").unwrap();
        let mut dst = BytesMut::new();
        IscpCodec::default().encode(&command, &mut dst).unwrap();
        assert_eq!(&dst[..], encode("AMT01").as_slice());
    }

    // ---------------------------------------------------------------
    // Frame splitting
    // ---------------------------------------------------------------

    #[test]
    fn two_frames_in_arrival_order() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"!1PWR01\x1a!1MVL2D\x1a");
        let frames: Vec<Frame> = decoder.frames().collect();
        assert_eq!(
            frames,
            vec![Frame::new(&b"!1PWR01"[..]), Frame::new(&b"!1MVL2D"[..])]
        );
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn partial_frame_waits_for_delimiter() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"!1PWR01\x1a!1AM");
        assert_eq!(decoder.frames().count(), 1);
        assert_eq!(decoder.buffered(), 4);

        decoder.extend(b"T00\x1a");
        let frames: Vec<Frame> = decoder.frames().collect();
        assert_eq!(frames, vec![Frame::new(&b"!1AMT00"[..])]);
    }

    #[test]
    fn no_delimiter_no_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"!1PWR01");
        assert_eq!(decoder.frames().count(), 0);
        assert_eq!(decoder.buffered(), 7);
    }

    #[test]
    fn adjacent_delimiters_yield_empty_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"\x1a");
        let frames: Vec<Frame> = decoder.frames().collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn overflow_discards_undelimited_garbage() {
        let mut decoder = FrameDecoder::with_max_frame_len(16);
        decoder.extend(&[b'A'; 32]);
        assert_eq!(decoder.frames().count(), 0);
        assert_eq!(decoder.buffered(), 0);

        // The stream resynchronizes on the next delimiter.
        decoder.extend(b"!1PWR00\x1a");
        assert_eq!(decoder.frames().count(), 1);
    }

    // ---------------------------------------------------------------
    // Frame parsing
    // ---------------------------------------------------------------

    #[test]
    fn parse_power_response() {
        assert_eq!(
            Frame::new(&b"!1PWR01"[..]).parse(),
            ParsedFrame::Response {
                code: "PWR".into(),
                argument: "01".into(),
                payload: "01".into(),
            }
        );
    }

    #[test]
    fn parse_keeps_trailing_payload() {
        match Frame::new(&b"!1AMX1234ABCD\r\n"[..]).parse() {
            ParsedFrame::Response {
                code,
                argument,
                payload,
            } => {
                assert_eq!(code, "AMX");
                assert_eq!(argument, "12");
                assert_eq!(payload, "1234ABCD");
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn parse_skips_leading_line_break() {
        match Frame::new(&b"\r\n!1MVL2D"[..]).parse() {
            ParsedFrame::Response { code, argument, .. } => {
                assert_eq!(code, "MVL");
                assert_eq!(argument, "2D");
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn parse_na_argument() {
        match Frame::new(&b"!1PWRN/A"[..]).parse() {
            ParsedFrame::Response { argument, payload, .. } => {
                assert_eq!(argument, "N/");
                assert_eq!(payload, "N/A");
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn parse_short_frame_is_unparseable() {
        for raw in [&b""[..], b"!", b"!1PW", b"!1PWR0"] {
            assert!(
                matches!(Frame::new(raw).parse(), ParsedFrame::Unparseable { .. }),
                "frame {raw:?} should be unparseable"
            );
        }
    }

    #[test]
    fn parse_binary_code_is_unparseable() {
        let frame = Frame::new(&[b'!', b'1', 0xFF, 0xFE, 0x00, b'0', b'1'][..]);
        assert!(matches!(frame.parse(), ParsedFrame::Unparseable { .. }));
    }

    #[test]
    fn frame_display_escapes_control_bytes() {
        assert_eq!(Frame::new(&b"!1PWR01\r"[..]).to_string(), "!1PWR01\\r");
    }
}
