//! Stream framing for requests and responses.
//!
//! Requests arrive as a byte stream with no length prefix. Each request is one
//! complete JSON value; values may be separated by newlines, by other
//! whitespace, or by nothing at all, and a single read may carry a partial
//! value or several whole ones. [`RequestDecoder`] buffers bytes per
//! connection and yields complete requests in arrival order.
//!
//! Bytes are framed once as they arrive. The JSON parser only runs at points
//! where a value could end: a closing bracket or string at the top level, a
//! top-level scalar byte, or a newline. Malformed input is dropped through the
//! end of its line, even when that line spans several reads, so each bad line
//! produces exactly one error.
//!
//! Responses are one compact JSON object followed by `\n`.

use serde::Serialize;
use serde_json::Value;

use super::errors::DecodeError;
use super::request::Command;

/// Size of a single socket read.
pub(crate) const READ_CHUNK_BYTES: usize = 4096;

/// Incremental request decoder for one connection.
#[derive(Debug)]
pub struct RequestDecoder {
    buffer: Vec<u8>,
    framing: Framing,
    skipping_line: bool,
    max_request_bytes: usize,
}

enum Scan {
    Empty,
    Incomplete,
    Complete(Value, usize),
    Invalid(serde_json::Error),
}

/// Bracket and string state for the bytes framed so far.
#[derive(Debug, Default)]
struct Framing {
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Framing {
    /// Frames unread bytes, stopping just after one where a value may end.
    fn advance(&mut self, bytes: &[u8]) -> bool {
        while let Some(&byte) = bytes.get(self.scanned) {
            self.scanned += 1;
            if self.step(byte) {
                return true;
            }
        }
        false
    }

    fn step(&mut self, byte: u8) -> bool {
        // A raw newline is never valid inside a string, so it always lets the
        // parser decide.
        if byte == b'\n' {
            return true;
        }
        if self.in_string {
            match (self.escaped, byte) {
                (true, _) => self.escaped = false,
                (false, b'\\') => self.escaped = true,
                (false, b'"') => {
                    self.in_string = false;
                    return self.depth == 0;
                }
                _ => {}
            }
            return false;
        }
        match byte {
            b'"' => {
                self.in_string = true;
                false
            }
            b'{' | b'[' => {
                self.depth += 1;
                false
            }
            b'}' | b']' => {
                self.depth = self.depth.saturating_sub(1);
                self.depth == 0
            }
            b' ' | b'\t' | b'\r' => false,
            _ => self.depth == 0,
        }
    }
}

impl RequestDecoder {
    /// Creates a decoder that refuses to buffer more than `max_request_bytes`
    /// of an unfinished request.
    pub fn new(max_request_bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(READ_CHUNK_BYTES),
            framing: Framing::default(),
            skipping_line: false,
            max_request_bytes,
        }
    }

    /// Appends bytes read from the connection.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Yields the next complete request, if the buffer holds one.
    ///
    /// Returns `None` when more bytes are needed. A malformed request is
    /// discarded through the end of the line the parser failed on, including
    /// bytes of that line which have not arrived yet, so the following
    /// request is still decoded.
    pub fn next_request(&mut self) -> Option<Result<Command, DecodeError>> {
        if self.skipping_line && !self.skip_rest_of_line() {
            return None;
        }
        loop {
            if !self.framing.advance(&self.buffer) {
                return self.check_limit().err().map(Err);
            }
            match self.scan() {
                Scan::Empty => {
                    self.consume(self.buffer.len());
                    return None;
                }
                Scan::Incomplete => {}
                Scan::Complete(value, consumed) => {
                    self.consume(consumed);
                    return Some(Command::from_value(value));
                }
                Scan::Invalid(error) => {
                    self.discard_through_line(error.line());
                    return Some(Err(DecodeError::from_json_error(error)));
                }
            }
        }
    }

    /// Flushes the decoder once the peer has stopped sending.
    ///
    /// Leftover bytes can never complete, so they are reported as malformed.
    /// The tail of a line that already produced an error is dropped quietly.
    pub fn finish(&mut self) -> Option<DecodeError> {
        let skipped = std::mem::take(&mut self.skipping_line);
        if skipped || self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.consume(self.buffer.len());
            return None;
        }
        let size = self.buffer.len();
        self.consume(size);
        Some(DecodeError::malformed(format!(
            "connection closed with {size} bytes of incomplete request"
        )))
    }

    fn scan(&self) -> Scan {
        let mut stream = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
        match stream.next() {
            None => Scan::Empty,
            Some(Ok(value)) => Scan::Complete(value, stream.byte_offset()),
            Some(Err(error)) if error.is_eof() => Scan::Incomplete,
            Some(Err(error)) => Scan::Invalid(error),
        }
    }

    fn check_limit(&mut self) -> Result<(), DecodeError> {
        let size = self.buffer.len();
        if size <= self.max_request_bytes {
            return Ok(());
        }
        self.consume(size);
        Err(DecodeError::RequestTooLarge {
            size,
            max_size: self.max_request_bytes,
        })
    }

    /// Removes the first `count` bytes and restarts framing on the rest.
    fn consume(&mut self, count: usize) {
        self.buffer.drain(..count);
        self.framing = Framing::default();
    }

    /// Drops everything up to and including the newline ending `line`
    /// (1-based). When that line is still unterminated the buffer is emptied
    /// and the decoder keeps skipping until the newline arrives.
    fn discard_through_line(&mut self, line: usize) {
        let newline = self
            .buffer
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .nth(line.saturating_sub(1))
            .map(|(index, _)| index + 1);
        match newline {
            Some(end) => self.consume(end),
            None => {
                self.consume(self.buffer.len());
                self.skipping_line = true;
            }
        }
    }

    /// Drops bytes through the next newline. Returns `false` while the line
    /// is still open.
    fn skip_rest_of_line(&mut self) -> bool {
        match self.buffer.iter().position(|byte| *byte == b'\n') {
            Some(index) => {
                self.consume(index + 1);
                self.skipping_line = false;
                true
            }
            None => {
                self.consume(self.buffer.len());
                false
            }
        }
    }
}

/// Serialises a response as a single newline-terminated line.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn encode<T: Serialize>(response: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    const LIMIT: usize = 256;

    #[fixture]
    fn decoder() -> RequestDecoder {
        RequestDecoder::new(LIMIT)
    }

    fn drain(decoder: &mut RequestDecoder) -> Vec<Result<Command, DecodeError>> {
        std::iter::from_fn(|| decoder.next_request()).collect()
    }

    #[rstest]
    fn decodes_a_newline_terminated_request(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":\"clear_canvas\"}\n");
        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 1);
        assert!(matches!(decoded[0], Ok(Command::ClearCanvas)));
        assert_eq!(decoder.buffered(), 0);
    }

    #[rstest]
    fn decodes_an_unterminated_request(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":\"list_components\"}");
        assert!(matches!(
            decoder.next_request(),
            Some(Ok(Command::ListComponents))
        ));
    }

    #[rstest]
    fn waits_for_the_rest_of_a_split_request(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":\"clea");
        assert!(decoder.next_request().is_none());
        decoder.push(b"r_canvas\"}\n");
        assert!(matches!(
            decoder.next_request(),
            Some(Ok(Command::ClearCanvas))
        ));
    }

    #[rstest]
    fn yields_pipelined_requests_in_order(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":\"clear_canvas\"}{\"command\":\"list_components\"}\n");
        decoder.push(b"  {\"command\":\"clear_canvas\"}\n");
        let names: Vec<_> = drain(&mut decoder)
            .into_iter()
            .map(|decoded| decoded.expect("valid").name())
            .collect();
        assert_eq!(names, ["clear_canvas", "list_components", "clear_canvas"]);
    }

    #[rstest]
    fn recovers_after_a_malformed_line(mut decoder: RequestDecoder) {
        decoder.push(b"not json\n{\"command\":\"clear_canvas\"}\n");
        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 2);
        assert!(matches!(decoded[0], Err(DecodeError::Malformed { .. })));
        assert!(matches!(decoded[1], Ok(Command::ClearCanvas)));
    }

    #[rstest]
    fn waits_for_the_end_of_a_split_malformed_request(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\": oops");
        assert!(decoder.next_request().is_none());

        decoder.push(b" more}\n{\"command\":\"clear_canvas\"}\n");
        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 2);
        assert!(matches!(decoded[0], Err(DecodeError::Malformed { .. })));
        assert!(matches!(decoded[1], Ok(Command::ClearCanvas)));
    }

    #[rstest]
    fn skips_the_unterminated_tail_of_a_malformed_line(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\": oops}");
        assert!(matches!(
            decoder.next_request(),
            Some(Err(DecodeError::Malformed { .. }))
        ));
        assert_eq!(decoder.buffered(), 0);

        decoder.push(b" trailing}");
        assert!(decoder.next_request().is_none());
        decoder.push(b" garbage}\n{\"command\":\"clear_canvas\"}\n");
        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 1);
        assert!(matches!(decoded[0], Ok(Command::ClearCanvas)));
    }

    #[rstest]
    fn reports_a_long_malformed_line_once(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\": oops ");
        for _ in 0..4 {
            decoder.push(&[b'x'; 48]);
            assert!(decoder.next_request().is_none());
        }
        decoder.push(b"}\n{\"command\":\"clear_canvas\"}\n");

        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 2);
        assert!(matches!(decoded[0], Err(DecodeError::Malformed { .. })));
        assert!(matches!(decoded[1], Ok(Command::ClearCanvas)));
    }

    #[rstest]
    fn rejects_invalid_utf8_and_recovers(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":\"\xff\xfe\"}\n{\"command\":\"clear_canvas\"}\n");
        let decoded = drain(&mut decoder);
        assert_eq!(decoded.len(), 2);
        assert!(matches!(decoded[0], Err(DecodeError::Malformed { .. })));
        assert!(matches!(decoded[1], Ok(Command::ClearCanvas)));
    }

    #[rstest]
    fn decodes_a_request_spread_over_several_lines(mut decoder: RequestDecoder) {
        decoder.push(b"{\n  \"command\": \"list_components\"\n");
        assert!(decoder.next_request().is_none());
        decoder.push(b"}\n");
        assert!(matches!(
            decoder.next_request(),
            Some(Ok(Command::ListComponents))
        ));
    }

    #[rstest]
    fn finish_ignores_the_tail_of_a_reported_line(mut decoder: RequestDecoder) {
        decoder.push(b"nope");
        assert!(decoder.next_request().is_some_and(|decoded| decoded.is_err()));
        decoder.push(b" still the same line");
        assert!(decoder.finish().is_none());
    }

    #[rstest]
    fn rejects_oversize_incomplete_requests(mut decoder: RequestDecoder) {
        let mut request = b"{\"command\":\"create_component\",\"component_name\":\"".to_vec();
        request.extend(std::iter::repeat_n(b'x', LIMIT));
        decoder.push(&request);

        let decoded = decoder.next_request();
        assert!(matches!(
            decoded,
            Some(Err(DecodeError::RequestTooLarge { max_size: LIMIT, .. }))
        ));
        assert_eq!(decoder.buffered(), 0);
    }

    #[rstest]
    fn whitespace_only_input_yields_nothing(mut decoder: RequestDecoder) {
        decoder.push(b"  \r\n\n");
        assert!(decoder.next_request().is_none());
        assert!(decoder.finish().is_none());
    }

    #[rstest]
    fn finish_reports_truncated_requests(mut decoder: RequestDecoder) {
        decoder.push(b"{\"command\":");
        assert!(decoder.next_request().is_none());
        let error = decoder.finish().expect("truncated request");
        assert!(error.to_string().contains("incomplete request"));
    }

    #[test]
    fn encode_appends_a_newline() {
        let bytes = encode(&json!({"success": true})).expect("encode");
        assert_eq!(bytes, b"{\"success\":true}\n");
    }
}
