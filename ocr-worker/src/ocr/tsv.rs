//! Tesseract TSV layout output -> line regions.
//!
//! Columns: `level page_num block_num par_num line_num word_num left top width height conf text`.
//! Level 4 rows open a text line, level 5 rows are the words inside it.

use serde::de::IgnoredAny;
use serde::Deserialize;

use super::{BoundingBox, Recognition, TextRegion};

const LEVEL_LINE: u32 = 4;
const LEVEL_WORD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineKey {
    page: u32,
    block: u32,
    par: u32,
    line: u32,
}

/// One TSV record, read by column position.
#[derive(Debug, Deserialize)]
struct Row {
    level: u32,
    page_num: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    _word_num: IgnoredAny,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    conf: f32,
    #[serde(default)]
    text: String,
}

impl Row {
    fn key(&self) -> LineKey {
        LineKey {
            page: self.page_num,
            block: self.block_num,
            par: self.par_num,
            line: self.line_num,
        }
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// Header rows and whitespace-only rows carry nothing.
fn is_filler(record: &csv::StringRecord) -> bool {
    record.get(0) == Some("level") || record.iter().all(|field| field.is_empty())
}

struct LineBuilder {
    key: LineKey,
    bbox: BoundingBox,
    words: Vec<String>,
    confs: Vec<f32>,
}

impl LineBuilder {
    fn new(key: LineKey, bbox: BoundingBox) -> Self {
        Self {
            key,
            bbox,
            words: Vec::new(),
            confs: Vec::new(),
        }
    }

    fn push_word(&mut self, text: &str, conf: f32) {
        let word = text.trim();
        if word.is_empty() {
            return;
        }
        self.words.push(word.to_string());
        if conf >= 0.0 {
            self.confs.push(conf);
        }
    }

    fn finish(self) -> TextRegion {
        if self.words.is_empty() {
            return TextRegion::without_text(self.bbox);
        }
        let confidence = if self.confs.is_empty() {
            None
        } else {
            Some(self.confs.iter().sum::<f32>() / self.confs.len() as f32 / 100.0)
        };
        TextRegion {
            bbox: self.bbox,
            text: Some(self.words.join(" ")),
            confidence,
        }
    }
}

/// Group TSV word rows into one region per text line, in output order.
///
/// Rows that cannot be parsed become absent entries. A line whose words are
/// all blank becomes a region without text.
pub fn parse_tsv(tsv: &str) -> Recognition {
    // get_tsv_text omits the header row, so columns are matched by position
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(tsv.as_bytes());

    let mut entries = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for record in reader.records() {
        let row = match record {
            Ok(record) if is_filler(&record) => continue,
            Ok(record) => record.deserialize::<Row>(None).ok(),
            Err(_) => None,
        };

        // a bad row is its own absent entry; the open line stays open
        let Some(row) = row else {
            entries.push(None);
            continue;
        };

        match row.level {
            LEVEL_LINE => {
                entries.extend(current.take().map(|line| Some(line.finish())));
                current = Some(LineBuilder::new(row.key(), row.bbox()));
            }
            LEVEL_WORD => {
                let line = match current.take() {
                    Some(line) if line.key == row.key() => line,
                    other => {
                        entries.extend(other.map(|line| Some(line.finish())));
                        LineBuilder::new(row.key(), row.bbox())
                    }
                };
                let line = current.insert(line);
                line.push_word(&row.text, row.conf);
            }
            _ => {}
        }
    }

    entries.extend(current.take().map(|line| Some(line.finish())));
    Recognition::new(entries)
}
