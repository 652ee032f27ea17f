//! The request loop: one line in, at most one line out, until end of input.
//!
//! Nothing a single request does can end the loop. Parse failures, missing
//! files, engine errors and engine panics all become `{"error": ...}` lines.
//! Only I/O failures on the streams themselves stop serving.

use std::any::Any;
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{Result, WorkerError};
use crate::ocr::{OcrEngine, Recognition};
use crate::protocol::{write_response, OcrRequest, Response};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
}

pub struct Worker<E: OcrEngine> {
    engine: E,
    summary: ServeSummary,
}

impl<E: OcrEngine> Worker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            summary: ServeSummary::default(),
        }
    }

    pub fn summary(&self) -> ServeSummary {
        self.summary
    }

    /// Handle one raw input line. Blank lines produce no response.
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let outcome = self.process(line);
        Some(self.record(outcome))
    }

    fn handle_bytes(&mut self, raw: &[u8]) -> Option<Response> {
        match std::str::from_utf8(raw) {
            Ok(line) => self.handle_line(line),
            Err(_) => Some(self.record(Err(WorkerError::InvalidJson))),
        }
    }

    fn process(&mut self, line: &str) -> Result<String> {
        let request = OcrRequest::parse(line)?;
        let image_path = request.image_path()?;

        let path = Path::new(image_path);
        if !path.exists() {
            return Err(WorkerError::ImageNotFound(image_path.to_string()));
        }

        let started = Instant::now();
        let recognition = recognize_guarded(&mut self.engine, path)?;
        debug!(
            engine = self.engine.name(),
            image = %path.display(),
            regions = recognition.entries.len(),
            skipped = recognition.skipped(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recognition complete"
        );

        Ok(recognition.joined_text())
    }

    fn record(&mut self, outcome: Result<String>) -> Response {
        self.summary.requests += 1;
        match outcome {
            Ok(text) => {
                self.summary.succeeded += 1;
                Response::success(text)
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!("Request failed: {e}");
                e.into_response()
            }
        }
    }

    /// Serve requests from `input` until end of stream.
    pub fn serve<R, W>(&mut self, mut input: R, output: &mut W) -> io::Result<ServeSummary>
    where
        R: BufRead,
        W: Write + ?Sized,
    {
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            if let Some(response) = self.handle_bytes(&buf) {
                write_response(output, &response)?;
            }
        }
        Ok(self.summary)
    }
}

/// Announce readiness, then serve until end of input.
pub fn run<E, R, W>(engine: E, input: R, output: &mut W) -> io::Result<ServeSummary>
where
    E: OcrEngine,
    R: BufRead,
    W: Write + ?Sized,
{
    write_response(output, &Response::ready())?;
    Worker::new(engine).serve(input, output)
}

/// Run the engine, turning a panic into an ordinary per-request error.
fn recognize_guarded<E: OcrEngine>(engine: &mut E, path: &Path) -> Result<Recognition> {
    match panic::catch_unwind(AssertUnwindSafe(|| engine.recognize(path))) {
        Ok(result) => result,
        Err(payload) => Err(WorkerError::Ocr(format!(
            "OCR engine panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
