use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ocr: OcrConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Engine selection, e.g. "local/tesseract"
    pub model: String,
    /// Tesseract language codes joined with `+` (commas are accepted too)
    pub languages: String,
    pub tessdata_dir: Option<PathBuf>,
    pub pageseg_mode: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub lower_priority: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "local/tesseract".to_string(),
            languages: "eng".to_string(),
            tessdata_dir: None,
            pageseg_mode: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| "local/tesseract".to_string()),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                tessdata_dir: env::var("OCR_TESSDATA_DIR")
                    .or_else(|_| env::var("TESSDATA_PREFIX"))
                    .ok()
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from),
                pageseg_mode: parse_env_opt("OCR_PAGESEG_MODE"),
            },
            worker: WorkerConfig {
                lower_priority: parse_env_or("OCR_LOWER_PRIORITY", true),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

impl OcrConfig {
    /// Language codes in the `+`-joined form Tesseract expects.
    pub fn tesseract_languages(&self) -> String {
        self.language_list().join("+")
    }

    pub fn language_list(&self) -> Vec<&str> {
        self.languages
            .split(['+', ','])
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .collect()
    }
}

/// Providers this binary can construct engines for.
pub const KNOWN_PROVIDERS: &[&str] = &["local"];

/// Known engines this binary can construct.
pub const KNOWN_ENGINES: &[&str] = &["tesseract"];

/// Parse a model string into (provider, engine), e.g. "local/tesseract".
pub fn parse_engine_model(model: &str) -> (&str, &str) {
    match model.split_once('/') {
        Some((provider, engine)) => (provider, engine),
        None => ("local", model),
    }
}
