use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// Longest accepted input line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20;

/// One line of JSON-lines input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Text(String),
    /// The line was consumed but can't be used, with the reason
    Rejected(String),
}

/// `LinesCodec` that reports undecodable and oversized lines as items instead
/// of errors. `FramedRead` ends the stream after the first decode error, so a
/// single bad line would otherwise lose everything after it.
#[derive(Debug)]
pub struct EventLineCodec {
    inner: LinesCodec,
}

impl EventLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn recover(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<InputLine>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(InputLine::Text)),
            // the codec drops the rest of the line on its own
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(InputLine::Rejected("line too long".to_string())))
            }
            // invalid UTF-8, the line has already been taken off the buffer
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(InputLine::Rejected(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for EventLineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for EventLineCodec {
    type Item = InputLine;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<InputLine>, LinesCodecError> {
        Self::recover(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<InputLine>, LinesCodecError> {
        Self::recover(self.inner.decode_eof(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut EventLineCodec, input: &[u8]) -> Vec<InputLine> {
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(line) = codec.decode(&mut buf).unwrap() {
            out.push(line);
        }
        while let Some(line) = codec.decode_eof(&mut buf).unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn test_invalid_utf8_line_is_rejected_not_fatal() {
        let lines = decode_all(&mut EventLineCodec::default(), b"{\"a\":\"\xff\"}\n{\"ok\":1}\n");
        assert_eq!(lines.len(), 2);
        assert!(matches!(lines[0], InputLine::Rejected(_)));
        assert_eq!(lines[1], InputLine::Text("{\"ok\":1}".to_string()));
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let mut input = vec![b'x'; 64];
        input.extend_from_slice(b"\nshort\n");
        let lines = decode_all(&mut EventLineCodec::new(16), &input);
        assert_eq!(
            lines,
            vec![
                InputLine::Rejected("line too long".to_string()),
                InputLine::Text("short".to_string()),
            ]
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        let lines = decode_all(&mut EventLineCodec::default(), b"a\r\nb");
        assert_eq!(
            lines,
            vec![InputLine::Text("a".to_string()), InputLine::Text("b".to_string())]
        );
    }
}
