//! Resident OCR worker.
//!
//! Loads an OCR engine once, then answers line-delimited JSON requests on
//! stdin with one JSON line per request on stdout.

pub mod config;
pub mod error;
pub mod ocr;
pub mod protocol;
pub mod startup;
pub mod worker;
