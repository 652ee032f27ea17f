//! One-time process setup that has to happen before the first request.

use std::env;
use std::io;

use tracing::{debug, info};

use crate::config::{parse_engine_model, OcrConfig, KNOWN_ENGINES, KNOWN_PROVIDERS};
use crate::error::{Result, WorkerError};
use crate::ocr::{OcrEngine, TesseractEngine};

/// Numeric runtimes read these once, when the engine first loads.
pub const THREAD_LIMIT_VARS: &[&str] = &[
    "OMP_NUM_THREADS",
    "OMP_THREAD_LIMIT",
    "MKL_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "VECLIB_MAXIMUM_THREADS",
    "NUMEXPR_NUM_THREADS",
];

/// Pin every numeric thread pool to a single thread. Must run before `build_engine`.
pub fn limit_numeric_threads() {
    for var in THREAD_LIMIT_VARS {
        env::set_var(var, "1");
    }
}

#[cfg(unix)]
const LOWEST_NICE: i32 = 19;

/// Ask the OS to schedule this process at the lowest priority.
#[cfg(unix)]
pub fn lower_priority() -> io::Result<()> {
    rustix::process::setpriority_process(None, LOWEST_NICE)?;
    Ok(())
}

#[cfg(windows)]
pub fn lower_priority() -> io::Result<()> {
    use windows::Win32::System::Threading::{
        GetCurrentProcess, SetPriorityClass, IDLE_PRIORITY_CLASS,
    };

    // SAFETY: GetCurrentProcess returns a pseudo-handle that needs no cleanup.
    unsafe { SetPriorityClass(GetCurrentProcess(), IDLE_PRIORITY_CLASS) }
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(not(any(unix, windows)))]
pub fn lower_priority() -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "priority adjustment not supported on this platform",
    ))
}

/// Best effort: failures are logged and otherwise ignored.
pub fn try_lower_priority() {
    match lower_priority() {
        Ok(()) => debug!("Process priority lowered"),
        Err(e) => debug!("Could not lower process priority: {e}"),
    }
}

/// Construct the configured engine. Called exactly once per process.
pub fn build_engine(config: &OcrConfig) -> Result<Box<dyn OcrEngine>> {
    let (provider, engine) = parse_engine_model(&config.model);
    let provider = provider.to_lowercase();
    let engine = engine.to_lowercase();

    let supported = KNOWN_PROVIDERS.contains(&provider.as_str())
        && KNOWN_ENGINES.contains(&engine.as_str());
    if !supported {
        return Err(WorkerError::EngineNotInstalled(format!(
            "'{}' is not available in this build (supported: {}/{})",
            config.model,
            KNOWN_PROVIDERS.join("|"),
            KNOWN_ENGINES.join("|")
        )));
    }

    info!("Initializing OCR engine: {}...", config.model);
    let engine = TesseractEngine::new(config)?;
    Ok(Box::new(engine))
}
