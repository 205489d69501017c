//! # gexport2csv - Huawei GExport CM dumps to per-MO CSV files
//!
//! Converts the hierarchical GExport configuration XML (classes, objects,
//! parameters) into one flat CSV file per managed-object type, inferring
//! each type's column set from the data itself.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XML dump   │────▶│  Tokenizer  │────▶│  Transform  │────▶│ <MO>.csv    │
//! │ (GExport)   │     │ (quick-xml) │     │ (two-pass)  │     │ per MO type │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The first pass walks every input file and only grows the per-MO schemas
//! (column order = first occurrence); the second pass walks again and writes
//! rows against the closed schemas. A parameter-configuration file replaces
//! the first pass entirely.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gexport2csv::{Converter, ParseOptions};
//! use std::path::Path;
//!
//! let mut converter = Converter::new(ParseOptions {
//!     output_dir: "out".into(),
//!     ..ParseOptions::default()
//! })?;
//! let summary = converter.run(Path::new("GExport_RNC01_20171211060843.xml"))?;
//! eprintln!("{} rows written", summary.rows_written);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`parser`] - XML tokenizer adapter
//! - [`config`] - Parameter-configuration file loading
//! - [`transform`] - Schema inference, accumulation, pipeline
//! - [`sink`] - Per-MO CSV output streams

// Core modules
pub mod error;

// Tokenization
pub mod parser;

// Parameter configuration
pub mod config;

// Conversion engine
pub mod transform;

// CSV output
pub mod sink;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ConfigResult,
    PipelineError,
    PipelineResult,
    SinkError,
    SinkResult,
    XmlError,
    XmlResult,
};

// =============================================================================
// Re-exports - Tokenizer
// =============================================================================

pub use parser::{CmEvent, ObjectAttrs, XmlEventSource};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{load_parameter_config, parse_parameter_config};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use transform::{
    Accumulator,
    Converter,
    ExpansionMap,
    ParseOptions,
    ParserState,
    RunContext,
    RunSummary,
    Schema,
    SchemaRegistry,
    META_COLUMNS,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use sink::SinkPool;
