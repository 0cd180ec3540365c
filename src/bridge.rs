//! JSON-lines bridge between a host application and the [`Engine`].
//!
//! Each input line is one call:
//!
//! ```text
//! {"id": 7, "request": {"method": "getImageOptions", "arguments": {"path": "/a.jpg"}}}
//! ```
//!
//! and each output line answers one call, in completion order:
//!
//! ```text
//! {"id": 7, "result": {"width": 3000, "height": 4000}}
//! {"id": 8, "error": {"code": "INVALID", "message": "Image source cannot be opened"}}
//! ```
//!
//! Calls run concurrently on the engine's pool. Only the thread that called
//! [`serve`] writes to the output, so answers never interleave mid-line.

use crate::engine::{Engine, Outcome, Reply, Request};
use crate::imaging::{ImagingError, RasterCodec, Unreadable};
use crate::metadata::MetadataStore;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use thiserror::Error;

/// Transport failure. Failed calls are answered on the wire, never
/// reported here.
#[derive(Error, Debug)]
pub enum BridgeIoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Request reader thread panicked")]
    ReaderPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Invalid,
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

impl BridgeError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Invalid,
            message: message.into(),
        }
    }
}

impl From<&ImagingError> for BridgeError {
    fn from(error: &ImagingError) -> Self {
        match error {
            ImagingError::SourceUnreadable {
                cause: Unreadable::Missing,
                ..
            } => Self::invalid("Image source cannot be opened"),
            ImagingError::SourceUnreadable {
                cause: Unreadable::Undecodable(_),
                ..
            } => Self::invalid("Image source cannot be decoded"),
            ImagingError::EncodeFailed(_) => Self::invalid("Image could not be saved"),
            ImagingError::InvalidRegion(_) | ImagingError::InvalidBounds { .. } => {
                Self::invalid(error.to_string())
            }
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    id: u64,
    request: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Answer {
    Result(Reply),
    Error(BridgeError),
}

/// One output line. `id` is null only when the input line was too broken
/// to carry one.
#[derive(Debug, Serialize)]
struct Response {
    id: Option<u64>,
    #[serde(flatten)]
    answer: Answer,
}

impl Response {
    fn from_outcome(id: u64, outcome: Outcome) -> Self {
        let answer = match outcome {
            Ok(reply) => Answer::Result(reply),
            Err(e) => Answer::Error(BridgeError::from(&e)),
        };
        Self {
            id: Some(id),
            answer,
        }
    }

    fn error(id: Option<u64>, error: BridgeError) -> Self {
        Self {
            id,
            answer: Answer::Error(error),
        }
    }
}

/// Parse one input line into a call, or the error response it deserves.
fn parse_line(line: &str) -> Result<(u64, Request), Response> {
    let envelope: Envelope = serde_json::from_str(line).map_err(|e| {
        let id = serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .and_then(|v| v.get("id").and_then(serde_json::Value::as_u64));
        Response::error(id, BridgeError::invalid(format!("Malformed call: {e}")))
    })?;

    let method = envelope
        .request
        .get("method")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if !Request::METHODS.contains(&method) {
        return Err(Response::error(
            Some(envelope.id),
            BridgeError {
                code: ErrorCode::NotImplemented,
                message: format!("Unknown method '{method}'"),
            },
        ));
    }

    let request = serde_json::from_value(envelope.request).map_err(|e| {
        Response::error(
            Some(envelope.id),
            BridgeError::invalid(format!("Invalid arguments: {e}")),
        )
    })?;
    Ok((envelope.id, request))
}

fn write_response(output: &mut impl Write, response: &Response) -> Result<(), BridgeIoError> {
    serde_json::to_writer(&mut *output, response)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}

/// Answer calls from `input` until it reaches EOF and every submitted call
/// has answered. Returns the number of answers written.
///
/// If writing an answer fails, no further calls are read: the reader stops
/// at its next line and the write error is returned.
pub fn serve<C, M, R, W>(
    engine: &Engine<C, M>,
    input: R,
    mut output: W,
) -> Result<usize, BridgeIoError>
where
    C: RasterCodec + 'static,
    M: MetadataStore + 'static,
    R: BufRead + Send,
    W: Write,
{
    let (tx, rx) = mpsc::channel::<Response>();
    let closed = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let closed = &closed;
        let reader = scope.spawn(move || -> io::Result<usize> {
            let mut calls = 0;
            for line in input.lines() {
                if closed.load(Ordering::Acquire) {
                    log::warn!("Output closed, ignoring further calls");
                    break;
                }
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                calls += 1;
                match parse_line(&line) {
                    Ok((id, request)) => {
                        let tx = tx.clone();
                        engine.submit(request, move |outcome| {
                            // The receiver only goes away if writing failed.
                            let _ = tx.send(Response::from_outcome(id, outcome));
                        });
                    }
                    Err(response) => {
                        if tx.send(response).is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(calls)
        });

        let mut answered = 0;
        for response in rx {
            if let Err(e) = write_response(&mut output, &response) {
                closed.store(true, Ordering::Release);
                return Err(e);
            }
            answered += 1;
        }

        let calls = reader
            .join()
            .map_err(|_| BridgeIoError::ReaderPanicked)??;
        log::debug!("Bridge closed after {calls} calls, {answered} answers");
        Ok(answered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::codec::tests::MockCodec;
    use crate::imaging::{CodecError, ImageProcessor, RegionError};
    use crate::metadata::tests::MemoryStore;
    use crate::scratch::ScratchDir;
    use serde_json::{Value, json};
    use std::path::Path;
    use tempfile::TempDir;

    fn run_bridge(tmp: &TempDir, codec: MockCodec, input: &str) -> Vec<Value> {
        let processor: ImageProcessor<MockCodec, MemoryStore> =
            ImageProcessor::new(codec, ScratchDir::new(tmp.path(), "bridge_"));
        let engine = Engine::new(processor, 2).unwrap();
        let mut out = Vec::new();
        let answered = serve(&engine, input.as_bytes(), &mut out).unwrap();

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), answered);
        assert_eq!(engine.live_rasters(), 0);
        lines
    }

    fn by_id(lines: &[Value], id: u64) -> &Value {
        lines
            .iter()
            .find(|l| l["id"] == id)
            .unwrap_or_else(|| panic!("no answer for id {id}: {lines:?}"))
    }

    #[test]
    fn answers_every_call() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        std::fs::write(&source, b"").unwrap();
        let src = source.to_string_lossy();

        let input = [
            json!({"id": 1, "request": {"method": "getImageOptions", "arguments": {"path": src}}}),
            json!({"id": 2, "request": {"method": "cropImage", "arguments": {
                "path": src, "scale": 1.0, "left": 0.0, "top": 0.0, "right": 0.5, "bottom": 0.5}}}),
            json!({"id": 3, "request": {"method": "sampleImage", "arguments": {
                "path": src, "maximumWidth": 100, "maximumHeight": 100}}}),
            json!({"id": 4, "request": {"method": "requestPermissions"}}),
        ]
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");

        let lines = run_bridge(&tmp, MockCodec::with_dimensions(400, 300), &input);
        assert_eq!(lines.len(), 4);

        assert_eq!(by_id(&lines, 1)["result"], json!({"width": 400, "height": 300}));
        let cropped = by_id(&lines, 2)["result"].as_str().unwrap();
        assert!(Path::new(cropped).exists());
        let sampled = by_id(&lines, 3)["result"].as_str().unwrap();
        assert!(sampled.ends_with(".jpg"));
        assert_eq!(by_id(&lines, 4)["result"], json!(true));
    }

    #[test]
    fn missing_source_answers_invalid() {
        let tmp = TempDir::new().unwrap();
        let input = r#"{"id": 9, "request": {"method": "getImageOptions", "arguments": {"path": "/nope.jpg"}}}"#;
        let lines = run_bridge(&tmp, MockCodec::default(), input);
        assert_eq!(
            lines[0],
            json!({"id": 9, "error": {"code": "INVALID", "message": "Image source cannot be opened"}})
        );
    }

    #[test]
    fn unknown_method_answers_not_implemented() {
        let tmp = TempDir::new().unwrap();
        let input = r#"{"id": 5, "request": {"method": "rotateImage", "arguments": {}}}"#;
        let lines = run_bridge(&tmp, MockCodec::default(), input);
        assert_eq!(lines[0]["id"], 5);
        assert_eq!(lines[0]["error"]["code"], "NOT_IMPLEMENTED");
    }

    #[test]
    fn bad_arguments_answer_invalid() {
        let tmp = TempDir::new().unwrap();
        let input = r#"{"id": 6, "request": {"method": "sampleImage", "arguments": {"path": "/a.jpg"}}}"#;
        let lines = run_bridge(&tmp, MockCodec::default(), input);
        assert_eq!(lines[0]["id"], 6);
        assert_eq!(lines[0]["error"]["code"], "INVALID");
    }

    #[test]
    fn malformed_lines_are_answered_and_blank_lines_skipped() {
        let tmp = TempDir::new().unwrap();
        let input = "not json\n\n{\"id\": 12}\n";
        let lines = run_bridge(&tmp, MockCodec::default(), input);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l["error"]["code"] == "INVALID"));
        assert!(lines.iter().any(|l| l["id"].is_null()));
        assert!(lines.iter().any(|l| l["id"] == 12));
    }

    #[test]
    fn empty_input_ends_immediately() {
        let tmp = TempDir::new().unwrap();
        assert!(run_bridge(&tmp, MockCodec::default(), "").is_empty());
    }

    /// Cycles over the same bytes forever, like a host that never closes
    /// its end of the pipe.
    struct Endless {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl io::Read for Endless {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.bytes.len() - self.pos);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos = (self.pos + n) % self.bytes.len();
            Ok(n)
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "host went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_stops_reading_and_is_reported() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        std::fs::write(&source, b"").unwrap();
        let line = json!({"id": 1, "request": {"method": "getImageOptions",
            "arguments": {"path": source}}});
        let input = io::BufReader::new(Endless {
            bytes: format!("{line}\n").into_bytes(),
            pos: 0,
        });

        let processor: ImageProcessor<MockCodec, MemoryStore> = ImageProcessor::new(
            MockCodec::with_dimensions(40, 30),
            ScratchDir::new(tmp.path(), "bridge_"),
        );
        let engine = Engine::new(processor, 2).unwrap();
        let result = serve(&engine, input, BrokenPipe);
        assert!(matches!(
            result,
            Err(BridgeIoError::Json(_)) | Err(BridgeIoError::Io(_))
        ));
    }

    #[test]
    fn error_messages_follow_cause() {
        let decode = ImagingError::SourceUnreadable {
            path: "/a.jpg".into(),
            cause: Unreadable::Undecodable("bad".into()),
        };
        assert_eq!(
            BridgeError::from(&decode).message,
            "Image source cannot be decoded"
        );

        let encode = ImagingError::EncodeFailed(CodecError::EncodeFailed("full".into()));
        assert_eq!(BridgeError::from(&encode).message, "Image could not be saved");

        let region = ImagingError::InvalidRegion(RegionError::Scale(0.0));
        let mapped = BridgeError::from(&region);
        assert_eq!(mapped.code, ErrorCode::Invalid);
        assert!(mapped.message.contains("scale"), "{}", mapped.message);
    }
}
