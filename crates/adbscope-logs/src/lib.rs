//! Logcat processing for adbscope
//!
//! This crate provides logcat line parsing, record storage, process name
//! resolution, filtering, and stream ingestion.

mod filter;
mod ingest;
mod parser;
mod registry;
mod store;
mod table;

pub use filter::{CompiledSpec, FilterEngine, FilterError};
pub use ingest::StreamIngestor;
pub use parser::LineParser;
pub use registry::{
    ProcessLookup, ProcessRegistry, ProcessTableSource, RefreshHandle, spawn_refresher,
};
pub use store::RecordStore;
pub use table::{RecordTable, ViewEvent};

// Re-export types used in our public API
pub use adbscope_types::{Column, FieldFilter, FilterField, FilterSpec, LogRecord, ProcessRecord};
