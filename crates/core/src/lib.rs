//! # docfill core
//!
//! Fills `.docx` report templates with company data.
//!
//! This crate owns the report semantics:
//! - building the [`FieldMapping`] from a registry record and user extras ([`mapping`])
//! - the `[NAME]` placeholder grammar ([`placeholder`])
//! - run-aware substitution of one paragraph, including hyperlink insertion ([`substitute`])
//! - walking a document's body, tables, headers and footers ([`walker`])
//! - orchestrating a full report run ([`ReportGenerator`])
//!
//! **No transport concerns**: HTTP clients live in `docfill-registry` and `docfill-generation`,
//! and the zip/XML container lives in `docfill-docx`.

pub mod config;
pub mod constants;
mod error;
pub mod hyperlink;
pub mod mapping;
pub mod placeholder;
mod report;
pub mod selftest;
pub mod substitute;
pub mod walker;

pub use config::ReportConfig;
pub use error::{ReportError, ReportResult};
pub use mapping::ReportExtras;
pub use report::{
    fill_template, generate_objective, ReportGenerator, ReportRequest, ReportSummary,
};
pub use substitute::{substitute_paragraph, Outcome, SpanningPlaceholderWarning};
pub use walker::{substitute_document, SubstitutionReport};

pub use docfill_types::{Cnpj, Field, FieldMapping};
