use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ocr_worker::config::Config;
use ocr_worker::ocr::OcrEngine;
use ocr_worker::protocol::write_response;
use ocr_worker::{startup, worker};

#[derive(Parser)]
#[command(name = "ocr-worker")]
#[command(about = "Resident OCR worker speaking line-delimited JSON on stdin/stdout")]
struct Args {
    /// Engine selection, e.g. "local/tesseract" (overrides OCR_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Tesseract languages, e.g. "eng+chi_sim" (overrides OCR_LANGUAGES)
    #[arg(long)]
    languages: Option<String>,

    /// Directory holding <lang>.traineddata files (overrides OCR_TESSDATA_DIR)
    #[arg(long)]
    tessdata_dir: Option<PathBuf>,

    /// Tesseract page segmentation mode (overrides OCR_PAGESEG_MODE)
    #[arg(long)]
    pageseg_mode: Option<u8>,

    /// Keep the current scheduling priority instead of lowering it
    #[arg(long)]
    keep_priority: bool,

    /// Write logs to stderr as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(model) = self.model {
            config.ocr.model = model;
        }
        if let Some(languages) = self.languages {
            config.ocr.languages = languages;
        }
        if let Some(dir) = self.tessdata_dir {
            config.ocr.tessdata_dir = Some(dir);
        }
        if let Some(psm) = self.pageseg_mode {
            config.ocr.pageseg_mode = Some(psm);
        }
        if self.keep_priority {
            config.worker.lower_priority = false;
        }
    }
}

// stdout carries the protocol, so every log line goes to stderr.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "ocr_worker=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    init_tracing(args.json_logs);

    let mut config = Config::from_env();
    args.apply(&mut config);

    startup::limit_numeric_threads();
    if config.worker.lower_priority {
        startup::try_lower_priority();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let engine = match startup::build_engine(&config.ocr) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("{}", e);
            write_response(&mut out, &e.into_response())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!("OCR worker ready (engine: {})", engine.name());
    let summary = worker::run(engine, io::stdin().lock(), &mut out)?;

    tracing::info!(
        requests = summary.requests,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Input closed, shutting down"
    );

    Ok(ExitCode::SUCCESS)
}
