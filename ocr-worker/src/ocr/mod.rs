//! OCR (Optical Character Recognition) Module
//!
//! The engine is an opaque capability: given an image path it returns the
//! recognized text regions in reading order.
//!
//! # Architecture
//!
//! - `OcrEngine` trait defines the interface the request loop talks to
//! - `TesseractEngine` implements local OCR via leptess
//! - `tsv` turns Tesseract's TSV layout dump into `TextRegion`s
//!
//! A `Recognition` is an ordered list of optional entries. An entry can be
//! missing entirely, or present without text; both are skipped when the text
//! is collected.

mod tesseract;
mod tsv;

use std::path::Path;

use crate::error::Result;

pub use tesseract::TesseractEngine;
pub use tsv::parse_tsv;

pub trait OcrEngine {
    fn name(&self) -> &str;

    fn recognize(&mut self, image_path: &Path) -> Result<Recognition>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&mut self, image_path: &Path) -> Result<Recognition> {
        (**self).recognize(image_path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub bbox: BoundingBox,
    pub text: Option<String>,
    pub confidence: Option<f32>,
}

impl TextRegion {
    pub fn new(bbox: BoundingBox, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: Some(text.into()),
            confidence: Some(confidence),
        }
    }

    /// A region the engine located but could not attach text to.
    pub fn without_text(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            text: None,
            confidence: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub entries: Vec<Option<TextRegion>>,
}

impl Recognition {
    pub fn new(entries: Vec<Option<TextRegion>>) -> Self {
        Self { entries }
    }

    /// Text of every present entry that carries text, in engine order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flatten()
            .filter_map(|region| region.text.as_deref())
    }

    pub fn joined_text(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n")
    }

    /// Entries that were absent or had no text.
    pub fn skipped(&self) -> usize {
        self.entries.len() - self.texts().count()
    }
}

impl FromIterator<Option<TextRegion>> for Recognition {
    fn from_iter<I: IntoIterator<Item = Option<TextRegion>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn region(text: &str) -> Option<TextRegion> {
        Some(TextRegion::new(BoundingBox::default(), text, 0.9))
    }

    #[test]
    fn test_joined_text_preserves_order() {
        let recognition: Recognition = vec![region("Hello"), region("World")].into_iter().collect();
        assert_eq!(recognition.joined_text(), "Hello\nWorld");
    }

    #[test]
    fn test_absent_and_textless_entries_are_skipped() {
        let recognition = Recognition::new(vec![
            region("first"),
            None,
            Some(TextRegion::without_text(BoundingBox::default())),
            region("last"),
        ]);
        assert_eq!(recognition.joined_text(), "first\nlast");
        assert_eq!(recognition.skipped(), 2);
    }

    #[test]
    fn test_empty_recognition_yields_empty_text() {
        assert_eq!(Recognition::default().joined_text(), "");
        assert_eq!(Recognition::new(vec![None, None]).joined_text(), "");
    }

    #[test]
    fn test_empty_string_text_is_kept() {
        let recognition = Recognition::new(vec![region("a"), region(""), region("b")]);
        assert_eq!(recognition.joined_text(), "a\n\nb");
    }
}
