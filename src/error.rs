//! Error types for the GExport conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ConfigError`] - parameter-configuration file errors
//! - [`XmlError`] - XML tokenization errors
//! - [`SinkError`] - CSV output errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Parameter Configuration Errors
// =============================================================================

/// Errors while loading a parameter-configuration file.
///
/// Any of these aborts the whole run: with a half-loaded configuration the
/// schema restriction would be ill-defined.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read parameter configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// A line is missing the `MOType:col1,col2,...` separator.
    #[error("Wrong format on line {line}: missing ':' in {content:?}")]
    MissingSeparator { line: usize, content: String },

    /// The configuration file declares no managed objects at all.
    #[error("Parameter configuration is empty")]
    Empty,
}

// =============================================================================
// XML Tokenization Errors
// =============================================================================

/// Errors from the XML event source.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Failed to open the input file.
    #[error("Failed to open input file: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed XML.
    #[error("XML parse error: {0}")]
    ParseError(#[from] quick_xml::Error),

    /// Malformed attribute syntax.
    #[error("XML attribute error: {0}")]
    AttrError(#[from] quick_xml::events::attributes::AttrError),
}

// =============================================================================
// CSV Sink Errors
// =============================================================================

/// Errors while writing CSV output.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to create or flush an output file.
    #[error("Failed to write output file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the main error type returned by [`crate::transform::Converter`].
/// It wraps all lower-level errors and adds startup-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parameter configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// XML tokenization error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// CSV output error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Input path is not a readable file or directory.
    #[error("Input path is not a readable file or directory: {}", .0.display())]
    InputNotReadable(PathBuf),

    /// Output directory is missing or not writable.
    #[error("Output directory is not writable: {}", .0.display())]
    OutputNotWritable(PathBuf),

    /// Directory walk failed before any file was parsed.
    #[error("Failed to read input directory: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for XML tokenization.
pub type XmlResult<T> = Result<T, XmlError>;

/// Result type for CSV output.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
