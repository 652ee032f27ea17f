//! Wire types for the line-delimited JSON protocol.
//!
//! Every message is a single JSON object on its own line. Output uses `", "` and
//! `": "` separators and leaves non-ASCII text unescaped, e.g.
//! `{"success": true, "text": "Hello\nWorld"}`.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::{Result, WorkerError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrRequest {
    #[serde(default)]
    pub image_path: Option<String>,
}

impl OcrRequest {
    /// Parse one trimmed input line. Unknown fields are ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).map_err(|_| WorkerError::InvalidJson)?;
        if !value.is_object() {
            return Err(WorkerError::InvalidRequest(
                "expected a JSON object".to_string(),
            ));
        }
        Self::deserialize(value).map_err(|e| WorkerError::InvalidRequest(e.to_string()))
    }

    pub fn image_path(&self) -> Result<&str> {
        match self.image_path.as_deref() {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(WorkerError::MissingImagePath),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ready { status: String },
    Success { success: bool, text: String },
    Error { error: String },
}

impl Response {
    pub fn ready() -> Self {
        Response::Ready {
            status: "ready".to_string(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Response::Success {
            success: true,
            text: text.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    #[cfg(test)]
    fn to_line(&self) -> Result<String> {
        let bytes = self.encode()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(64);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Write one response line and flush, so the caller can pair it with its request.
pub fn write_response<W: Write + ?Sized>(writer: &mut W, response: &Response) -> io::Result<()> {
    let mut line = response.encode().map_err(io::Error::from)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()
}

/// Compact JSON with a space after `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}
