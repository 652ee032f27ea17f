use std::path::Path;

use leptess::{LepTess, Variable};
use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::error::{Result, WorkerError};

use super::{parse_tsv, OcrEngine, Recognition};

pub struct TesseractEngine {
    api: LepTess,
    languages: String,
}

/// Every requested language needs `<lang>.traineddata` in the tessdata directory.
fn ensure_language_data(tessdata_dir: &Path, languages: &[&str]) -> Result<()> {
    if !tessdata_dir.is_dir() {
        return Err(WorkerError::EngineNotInstalled(format!(
            "tessdata directory {} does not exist",
            tessdata_dir.display()
        )));
    }

    let missing: Vec<&str> = languages
        .iter()
        .copied()
        .filter(|lang| !tessdata_dir.join(format!("{lang}.traineddata")).is_file())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkerError::EngineNotInstalled(format!(
            "Tesseract language data missing for {} in {}",
            missing.join(", "),
            tessdata_dir.display()
        )))
    }
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let languages = config.tesseract_languages();
        if languages.is_empty() {
            return Err(WorkerError::EngineInit(
                "no OCR languages configured".to_string(),
            ));
        }

        if let Some(dir) = &config.tessdata_dir {
            ensure_language_data(dir, &config.language_list())?;
        }

        let data_path = config
            .tessdata_dir
            .as_deref()
            .map(|dir| dir.to_string_lossy().into_owned());

        let mut api = LepTess::new(data_path.as_deref(), &languages)
            .map_err(|e| WorkerError::EngineInit(e.to_string()))?;

        if let Some(psm) = config.pageseg_mode {
            api.set_variable(Variable::TesseditPagesegMode, &psm.to_string())
                .map_err(|e| {
                    WorkerError::EngineInit(format!("Invalid page segmentation mode {psm}: {e}"))
                })?;
        }

        info!(languages = %languages, "Tesseract OCR initialized");
        Ok(Self { api, languages })
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&mut self, image_path: &Path) -> Result<Recognition> {
        self.api.set_image(image_path).map_err(|e| {
            WorkerError::Ocr(format!(
                "Failed to read image {}: {e}",
                image_path.display()
            ))
        })?;

        let tsv = self
            .api
            .get_tsv_text(0)
            .map_err(|e| WorkerError::Ocr(format!("Failed to extract text: {e}")))?;

        let recognition = parse_tsv(&tsv);
        debug!(
            languages = %self.languages,
            regions = recognition.entries.len(),
            "Tesseract recognition finished"
        );
        Ok(recognition)
    }
}
