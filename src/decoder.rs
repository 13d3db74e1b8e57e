//! Incremental decoding of backend response bodies into [`StreamChunk`]s.
//!
//! A [`DecodeSession`] owns the buffer for exactly one response. Bytes go in
//! through [`DecodeSession::feed`] in whatever pieces the network delivers
//! them; complete framing units come out as chunks in arrival order. The
//! emitted sequence depends only on the concatenated bytes, never on where
//! the pieces were split.

use std::fmt;

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backend::ChunkStream,
    dialect::{Dialect, LogicalEndpoint},
    errors::BridgeError,
    models::StreamChunk,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON object per `\n`-terminated line.
    Ndjson,
    /// `data: `-prefixed lines, terminated by a `[DONE]` payload.
    Sse,
    /// A single, non-streamed JSON body.
    Document,
}

impl Framing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ndjson => "ndjson",
            Self::Sse => "sse",
            Self::Document => "document",
        }
    }

    /// Picks a framing from the response `Content-Type`, falling back to the
    /// dialect's streaming convention.
    pub fn detect(content_type: Option<&str>, dialect: Dialect, streaming: bool) -> Self {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        if content_type.starts_with("text/event-stream") {
            return Self::Sse;
        }
        if content_type.starts_with("application/x-ndjson")
            || content_type.starts_with("application/jsonl")
        {
            return Self::Ndjson;
        }
        match (streaming, dialect) {
            (false, _) => Self::Document,
            (true, Dialect::Native) => Self::Ndjson,
            (true, Dialect::OpenAiCompatible) => Self::Sse,
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where content and completion live inside one decoded JSON unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{"response": "...", "done": bool}`
    NativeGenerate,
    /// `{"message": {"content": "..."}, "done": bool}`
    NativeChat,
    /// `{"choices": [{"delta": {"content": "..."}}]}`; completion comes only from `[DONE]`.
    OpenAi,
}

impl PayloadShape {
    pub fn for_endpoint(dialect: Dialect, endpoint: LogicalEndpoint) -> Self {
        match (dialect, endpoint) {
            (Dialect::OpenAiCompatible, _) => Self::OpenAi,
            (Dialect::Native, LogicalEndpoint::Generate) => Self::NativeGenerate,
            (Dialect::Native, _) => Self::NativeChat,
        }
    }

    /// Returns the content delta (empty when absent) and the in-body completion flag, if any.
    fn extract(self, unit: &Value) -> (String, Option<bool>) {
        let content = match self {
            Self::NativeGenerate => unit.get("response").and_then(Value::as_str),
            Self::NativeChat => unit.pointer("/message/content").and_then(Value::as_str),
            Self::OpenAi => unit
                .pointer("/choices/0/delta/content")
                .or_else(|| unit.pointer("/choices/0/message/content"))
                .or_else(|| unit.pointer("/choices/0/text"))
                .and_then(Value::as_str),
        };
        let done = match self {
            Self::NativeGenerate | Self::NativeChat => unit.get("done").and_then(Value::as_bool),
            Self::OpenAi => None,
        };
        (content.unwrap_or_default().to_owned(), done)
    }
}

/// A unit that could not be decoded. Logged and dropped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    pub framing: Framing,
    pub reason: String,
    pub discarded_bytes: usize,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discarded {} undecodable {} bytes: {}",
            self.discarded_bytes, self.framing, self.reason
        )
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub chunks: Vec<StreamChunk>,
    pub warning: Option<DecodeWarning>,
}

/// Characters of a rejected document kept for the error report.
const REJECTED_BODY_LIMIT: usize = 400;

enum UnitParse {
    Parsed(Value),
    Incomplete,
    Malformed,
}

pub struct DecodeSession {
    framing: Framing,
    shape: PayloadShape,
    buffer: Vec<u8>,
    /// Units that failed with an early-EOF error, joined with what follows.
    pending: Vec<u8>,
    done: bool,
    warnings: Vec<DecodeWarning>,
    /// HTTP status of the response being decoded.
    status: u16,
    /// Head of a document body that did not parse.
    rejected: Option<String>,
}

impl DecodeSession {
    pub fn new(framing: Framing, shape: PayloadShape) -> Self {
        Self {
            framing,
            shape,
            buffer: Vec::new(),
            pending: Vec::new(),
            done: false,
            warnings: Vec::new(),
            status: 200,
            rejected: None,
        }
    }

    /// Records the response status, reported if a document body is rejected.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Warnings recorded so far, including the one returned by [`Self::finish`].
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// The error for a document body that held no decodable unit, once
    /// [`Self::finish`] has run. Streamed framings never reject.
    pub fn rejection(&self) -> Option<BridgeError> {
        self.rejected.as_ref().map(|body| BridgeError::UpstreamError {
            status: self.status,
            body: body.clone(),
        })
    }

    /// Appends bytes and returns every chunk completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);
        if self.framing == Framing::Document {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|b| *b == b'\n') {
            let line_end = consumed + offset;
            let line = self.buffer[consumed..line_end].to_vec();
            consumed = line_end + 1;

            if let Some(chunk) = self.take_line(&line, false) {
                chunks.push(chunk);
            }
            if self.done {
                break;
            }
        }
        self.buffer.drain(..consumed);
        if self.done {
            self.release();
        }
        chunks
    }

    /// Ends the session, giving any trailing bytes one last parse attempt.
    pub fn finish(&mut self) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::default();
        if self.done {
            return outcome;
        }

        let warnings_before = self.warnings.len();
        let trailing = std::mem::take(&mut self.buffer);
        match self.framing {
            Framing::Document => outcome.chunks.extend(self.take_document(&trailing)),
            Framing::Ndjson | Framing::Sse if !trailing.trim_ascii().is_empty() => {
                outcome.chunks.extend(self.take_line(&trailing, true));
            }
            Framing::Ndjson | Framing::Sse => {}
        }
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.record_warning("unterminated unit at end of stream".to_owned(), pending.len());
        }
        outcome.warning = self.warnings[warnings_before..].last().cloned();

        self.done = true;
        self.release();
        outcome
    }

    fn take_document(&mut self, body: &[u8]) -> Option<StreamChunk> {
        match serde_json::from_slice::<Value>(body) {
            Ok(unit) => {
                let (content, _) = self.shape.extract(&unit);
                Some(StreamChunk::assistant(content, true))
            }
            Err(error) => {
                self.record_warning(format!("undecodable document: {error}"), body.len());
                let head = String::from_utf8_lossy(body);
                self.rejected = Some(if head.trim().is_empty() {
                    format!("empty response body: {error}")
                } else {
                    head.chars().take(REJECTED_BODY_LIMIT).collect()
                });
                None
            }
        }
    }

    fn take_line(&mut self, line: &[u8], at_end: bool) -> Option<StreamChunk> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        let payload = match self.framing {
            Framing::Sse => {
                let data = line.strip_prefix(b"data:")?;
                let data = data.strip_prefix(b" ").unwrap_or(data).trim_ascii();
                if data == b"[DONE]" {
                    debug!(framing = %self.framing, "stream sentinel reached");
                    self.pending.clear();
                    self.done = true;
                    return None;
                }
                data
            }
            _ => line,
        };

        let unit = match self.parse_unit(payload) {
            UnitParse::Parsed(unit) => unit,
            UnitParse::Incomplete | UnitParse::Malformed => return None,
        };

        let (content, done) = self.shape.extract(&unit);
        let is_final = if at_end {
            done.unwrap_or(true)
        } else {
            done.unwrap_or(false)
        };
        if is_final {
            self.done = true;
        }
        Some(StreamChunk::assistant(content, is_final))
    }

    fn parse_unit(&mut self, payload: &[u8]) -> UnitParse {
        if !self.pending.is_empty() {
            let mut joined = std::mem::take(&mut self.pending);
            let held = joined.len();
            joined.push(b'\n');
            joined.extend_from_slice(payload);
            match serde_json::from_slice::<Value>(&joined) {
                Ok(unit) => return UnitParse::Parsed(unit),
                Err(error) if error.is_eof() => {
                    self.pending = joined;
                    return UnitParse::Incomplete;
                }
                Err(error) => {
                    self.record_warning(format!("unterminated unit: {error}"), held);
                }
            }
        }

        match serde_json::from_slice::<Value>(payload) {
            Ok(unit) => UnitParse::Parsed(unit),
            Err(error) if error.is_eof() => {
                self.pending = payload.to_vec();
                UnitParse::Incomplete
            }
            Err(error) => {
                self.record_warning(format!("malformed unit: {error}"), payload.len());
                UnitParse::Malformed
            }
        }
    }

    fn record_warning(&mut self, reason: String, discarded_bytes: usize) {
        let warning = DecodeWarning {
            framing: self.framing,
            reason,
            discarded_bytes,
        };
        warn!(
            framing = %warning.framing,
            discarded_bytes = warning.discarded_bytes,
            reason = %warning.reason,
            "decode warning"
        );
        self.warnings.push(warning);
    }

    fn release(&mut self) {
        self.buffer = Vec::new();
        self.pending = Vec::new();
    }
}

/// Attaches a session to a response body.
///
/// Chunks are yielded in byte order. When the backend never marks a chunk
/// final (the SSE `[DONE]` case, or a stream that simply ends), one empty
/// completion chunk closes the sequence. A transport error before the session
/// is done ends the stream with [`BridgeError::StreamInterrupted`] carrying the
/// text already emitted. A document body that does not parse ends the stream
/// with [`BridgeError::UpstreamError`] instead of a completion chunk.
pub fn decode_stream<S, E>(body: S, mut session: DecodeSession) -> ChunkStream
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut body = Box::pin(body);
        let mut partial = String::new();
        let mut final_emitted = false;

        while let Some(next) = body.next().await {
            let bytes = match next {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(framing = %session.framing(), error = %error, "response body interrupted");
                    yield Err(BridgeError::StreamInterrupted {
                        partial: std::mem::take(&mut partial),
                        reason: error.to_string(),
                    });
                    return;
                }
            };

            for chunk in session.feed(&bytes) {
                partial.push_str(&chunk.content_delta);
                final_emitted |= chunk.is_final;
                yield Ok(chunk);
            }
            if session.is_done() {
                break;
            }
        }

        for chunk in session.finish().chunks {
            final_emitted |= chunk.is_final;
            yield Ok(chunk);
        }
        if let Some(error) = session.rejection() {
            warn!(framing = %session.framing(), error = %error, "response body rejected");
            yield Err(error);
            return;
        }
        if !final_emitted {
            yield Ok(StreamChunk::completion());
        }
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn decode_all(session: &mut DecodeSession, pieces: &[&[u8]]) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        for piece in pieces {
            chunks.extend(session.feed(piece));
        }
        chunks.extend(session.finish().chunks);
        chunks
    }

    fn byte_by_byte(framing: Framing, shape: PayloadShape, body: &[u8]) -> Vec<StreamChunk> {
        let mut session = DecodeSession::new(framing, shape);
        let pieces: Vec<&[u8]> = body.chunks(1).collect();
        decode_all(&mut session, &pieces)
    }

    fn one_shot(framing: Framing, shape: PayloadShape, body: &[u8]) -> Vec<StreamChunk> {
        let mut session = DecodeSession::new(framing, shape);
        decode_all(&mut session, &[body])
    }

    const NATIVE_CHAT: &str = concat!(
        "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
        "\n",
        "{\"message\":{\"role\":\"assistant\",\"content\":\"lo, \"},\"done\":false}\n",
        "{\"message\":{\"role\":\"assistant\",\"content\":\"héllo\"},\"done\":false}\n",
        "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"eval_count\":3}\n",
    );

    const OPENAI_SSE: &str = concat!(
        ": keep-alive\n",
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    #[test]
    fn fragmentation_does_not_change_ndjson_output() {
        let body = NATIVE_CHAT.as_bytes();
        let whole = one_shot(Framing::Ndjson, PayloadShape::NativeChat, body);
        let split = byte_by_byte(Framing::Ndjson, PayloadShape::NativeChat, body);

        assert_eq!(whole, split);
        assert_eq!(whole.len(), 4);
        assert!(whole[3].is_final);
    }

    #[test]
    fn fragmentation_does_not_change_sse_output() {
        let body = OPENAI_SSE.as_bytes();
        let whole = one_shot(Framing::Sse, PayloadShape::OpenAi, body);
        let split = byte_by_byte(Framing::Sse, PayloadShape::OpenAi, body);

        assert_eq!(whole, split);
        let text: String = whole.iter().map(|c| c.content_delta.as_str()).collect();
        assert_eq!(text, "Hi there");
        assert!(whole.iter().all(|chunk| !chunk.is_final));
    }

    #[test]
    fn ndjson_lines_match_document_decode() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let lines = [
            r#"{"response":"The","done":false}"#,
            r#"{"response":" sky","done":false}"#,
            r#"{"response":" is blue","done":false}"#,
        ];
        let mut chunks = Vec::new();
        for line in lines {
            chunks.extend(session.feed(format!("{line}\n").as_bytes()));
        }

        assert_eq!(chunks.len(), lines.len());
        let streamed: String = chunks.iter().map(|c| c.content_delta.as_str()).collect();

        let document = one_shot(
            Framing::Document,
            PayloadShape::NativeGenerate,
            br#"{"response":"The sky is blue","done":true}"#,
        );
        assert_eq!(document.len(), 1);
        assert!(document[0].is_final);
        assert_eq!(streamed, document[0].content_delta);
    }

    #[test]
    fn done_sentinel_ends_session_without_chunk() {
        let mut session = DecodeSession::new(Framing::Sse, PayloadShape::OpenAi);
        let chunks = session
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\ndata: [DONE]\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("hi", false)]);
        assert!(session.is_done());
        assert!(session.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n").is_empty());
        assert_eq!(session.finish(), DecodeOutcome::default());
    }

    #[test]
    fn unparsable_tail_is_a_warning_not_a_failure() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let chunks = session.feed(b"{\"response\":\"ok\",\"done\":false}\n{\"respo");
        assert_eq!(chunks.len(), 1);

        let outcome = session.finish();
        assert!(outcome.chunks.is_empty());
        let warning = outcome.warning.expect("tail should produce a warning");
        assert_eq!(warning.framing, Framing::Ndjson);
        assert_eq!(warning.discarded_bytes, 7);
    }

    #[test]
    fn parsable_tail_is_forced_final() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        assert!(session.feed(br#"{"response":"end"}"#).is_empty());

        let outcome = session.finish();
        assert_eq!(outcome.chunks, vec![StreamChunk::assistant("end", true)]);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn object_split_across_lines_is_retained_until_complete() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        assert!(session.feed(b"{\"response\":\n").is_empty());
        let chunks = session.feed(b"\"joined\",\"done\":false}\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("joined", false)]);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn malformed_unit_is_dropped_and_stream_continues() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let chunks = session.feed(b"{\"response\" 1}\n{\"response\":\"next\",\"done\":false}\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("next", false)]);
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn stale_fragment_does_not_swallow_next_unit() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let chunks = session.feed(b"{\"response\":\"a\"\n{\"response\":\"b\",\"done\":false}\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("b", false)]);
        assert_eq!(session.warnings().len(), 1);
        assert_eq!(session.warnings()[0].discarded_bytes, 15);
    }

    #[test]
    fn unknown_fields_yield_empty_non_final_delta() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeChat);
        let chunks = session.feed(b"{\"status\":\"pulling manifest\"}\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("", false)]);
        assert!(!session.is_done());
    }

    #[test]
    fn bytes_after_final_chunk_are_ignored() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let chunks = session.feed(b"{\"response\":\"a\",\"done\":true}\n{\"response\":\"b\"}\n");

        assert_eq!(chunks, vec![StreamChunk::assistant("a", true)]);
        assert!(session.is_done());
    }

    #[test]
    fn openai_document_reads_message_content() {
        let chunks = one_shot(
            Framing::Document,
            PayloadShape::OpenAi,
            br#"{"choices":[{"index":0,"message":{"role":"assistant","content":"whole"},"finish_reason":"stop"}]}"#,
        );
        assert_eq!(chunks, vec![StreamChunk::assistant("whole", true)]);
    }

    #[test]
    fn undecodable_document_is_rejected_with_status() {
        let mut session = DecodeSession::new(Framing::Document, PayloadShape::NativeChat)
            .with_status(200);
        assert!(session.feed(b"<html>502 Bad Gateway</html>").is_empty());

        let outcome = session.finish();
        assert!(outcome.chunks.is_empty());
        assert!(outcome.warning.is_some());
        match session.rejection() {
            Some(BridgeError::UpstreamError { status, body }) => {
                assert_eq!(status, 200);
                assert_eq!(body, "<html>502 Bad Gateway</html>");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_is_rejected() {
        let mut session = DecodeSession::new(Framing::Document, PayloadShape::OpenAi);

        let outcome = session.finish();
        assert!(outcome.chunks.is_empty());
        assert!(matches!(
            session.rejection(),
            Some(BridgeError::UpstreamError { status: 200, .. })
        ));
    }

    #[test]
    fn streamed_framings_never_reject() {
        let mut session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        session.feed(b"not json at all\n");
        session.finish();
        assert!(session.rejection().is_none());
    }

    #[test]
    fn detects_framing_from_content_type() {
        assert_eq!(
            Framing::detect(Some("text/event-stream; charset=utf-8"), Dialect::Native, true),
            Framing::Sse
        );
        assert_eq!(
            Framing::detect(Some("application/x-ndjson"), Dialect::OpenAiCompatible, true),
            Framing::Ndjson
        );
        assert_eq!(
            Framing::detect(Some("application/json"), Dialect::Native, false),
            Framing::Document
        );
        assert_eq!(
            Framing::detect(None, Dialect::OpenAiCompatible, true),
            Framing::Sse
        );
    }

    #[tokio::test]
    async fn done_sentinel_becomes_final_completion_chunk() {
        let body = stream::iter(vec![Ok::<_, std::io::Error>(bytes::Bytes::from_static(
            OPENAI_SSE.as_bytes(),
        ))]);
        let chunks: Vec<_> = decode_stream(body, DecodeSession::new(Framing::Sse, PayloadShape::OpenAi))
            .collect()
            .await;

        let last = chunks.last().expect("chunks").as_ref().expect("ok chunk");
        assert_eq!(last, &StreamChunk::completion());
        assert_eq!(chunks.len(), 4);
    }

    #[tokio::test]
    async fn rejected_document_ends_stream_without_completion() {
        let body = stream::iter(vec![Ok::<_, std::io::Error>(bytes::Bytes::from_static(
            b"<html>upstream timed out</html>",
        ))]);
        let session =
            DecodeSession::new(Framing::Document, PayloadShape::NativeChat).with_status(203);
        let results: Vec<_> = decode_stream(body, session).collect().await;

        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(BridgeError::UpstreamError { status, body }) => {
                assert_eq!(*status, 203);
                assert!(body.contains("upstream timed out"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn interruption_keeps_already_emitted_chunks() {
        let lines = [
            "{\"response\":\"one \",\"done\":false}\n",
            "{\"response\":\"two \",\"done\":false}\n",
        ];
        let mut items: Vec<Result<bytes::Bytes, std::io::Error>> = lines
            .iter()
            .map(|line| Ok(bytes::Bytes::copy_from_slice(line.as_bytes())))
            .collect();
        items.push(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )));

        let session = DecodeSession::new(Framing::Ndjson, PayloadShape::NativeGenerate);
        let results: Vec<_> = decode_stream(stream::iter(items), session).collect().await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().expect("first chunk"),
            &StreamChunk::assistant("one ", false)
        );
        assert_eq!(
            results[1].as_ref().expect("second chunk"),
            &StreamChunk::assistant("two ", false)
        );
        match &results[2] {
            Err(BridgeError::StreamInterrupted { partial, .. }) => assert_eq!(partial, "one two "),
            other => panic!("expected interruption, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_emission() {
        let body = stream::iter(
            NATIVE_CHAT
                .split_inclusive('\n')
                .map(|line| Ok::<_, std::io::Error>(bytes::Bytes::copy_from_slice(line.as_bytes())))
                .collect::<Vec<_>>(),
        );
        let mut decoded =
            decode_stream(body, DecodeSession::new(Framing::Ndjson, PayloadShape::NativeChat));
        let first = decoded.next().await.expect("one chunk").expect("ok chunk");
        drop(decoded);

        assert_eq!(first.content_delta, "Hel");
    }
}
