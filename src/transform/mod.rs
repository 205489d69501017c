//! Conversion engine.
//!
//! This module owns the schema-inference and row-emission core:
//! - Multivalue: flattened `key-value&key-value` parameter decoding
//! - Accumulator: per-instance attribute collection
//! - Schema: per-MO column order and expansion bookkeeping
//! - Context: per-file parse state
//! - Pipeline: the two-pass orchestrator

pub mod accumulator;
pub mod context;
pub mod multivalue;
pub mod pipeline;
pub mod schema;

pub use accumulator::Accumulator;
pub use context::{RunContext, META_COLUMNS};
pub use pipeline::*;
pub use schema::{ExpansionMap, Schema, SchemaRegistry};
