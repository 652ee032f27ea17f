use std::cell::Cell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::rc::Rc;

use ocr_worker::error::{Result, WorkerError};
use ocr_worker::ocr::{BoundingBox, OcrEngine, Recognition, TextRegion};
use ocr_worker::protocol::Response;

/// What the fake engine does on its next call.
pub enum Step {
    Texts(Vec<Option<&'static str>>),
    Fail(&'static str),
    Panic(&'static str),
}

/// Engine that replays a fixed script, then returns empty results.
#[derive(Default)]
pub struct FakeEngine {
    steps: VecDeque<Step>,
}

impl FakeEngine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl OcrEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn recognize(&mut self, _image_path: &Path) -> Result<Recognition> {
        match self.steps.pop_front() {
            Some(Step::Texts(texts)) => Ok(texts
                .into_iter()
                .map(|text| text.map(|t| TextRegion::new(BoundingBox::default(), t, 0.9)))
                .collect()),
            Some(Step::Fail(msg)) => Err(WorkerError::Ocr(msg.to_string())),
            Some(Step::Panic(msg)) => panic!("{}", msg),
            None => Ok(Recognition::default()),
        }
    }
}

/// An existing (empty) file standing in for an image.
pub fn image_file() -> tempfile::NamedTempFile {
    tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create image fixture")
}

pub fn request(path: &Path) -> String {
    serde_json::json!({ "image_path": path }).to_string()
}

/// Split raw worker output into lines and parse each one.
pub fn parse_output(out: &[u8]) -> Vec<Response> {
    String::from_utf8(out.to_vec())
        .expect("worker output must be UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("bad line {line:?}: {e}")))
        .collect()
}

/// Output sink that counts bytes written since the last flush.
#[derive(Default)]
pub struct FlushTrackingOutput {
    pub bytes: Vec<u8>,
    unflushed: Rc<Cell<usize>>,
}

impl FlushTrackingOutput {
    pub fn unflushed(&self) -> usize {
        self.unflushed.get()
    }
}

impl Write for FlushTrackingOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        self.unflushed.set(self.unflushed.get() + buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.unflushed.set(0);
        Ok(())
    }
}

/// Input that panics if asked for more bytes while paired output is unflushed.
pub struct FlushCheckedInput<'a> {
    remaining: &'a [u8],
    unflushed: Rc<Cell<usize>>,
}

impl<'a> FlushCheckedInput<'a> {
    pub fn paired_with(input: &'a str, output: &FlushTrackingOutput) -> Self {
        Self {
            remaining: input.as_bytes(),
            unflushed: Rc::clone(&output.unflushed),
        }
    }
}

impl Read for FlushCheckedInput<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for FlushCheckedInput<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        assert_eq!(
            self.unflushed.get(),
            0,
            "input read while {} response bytes were still buffered",
            self.unflushed.get()
        );
        Ok(self.remaining)
    }

    fn consume(&mut self, amt: usize) {
        self.remaining = &self.remaining[amt..];
    }
}
