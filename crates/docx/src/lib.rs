//! WordprocessingML package support.
//!
//! This crate is responsible for translating between a `.docx` zip package and an editable
//! in-memory tree: the main document body plus every header and footer part, each holding
//! typed blocks and its own relationships. Placeholder semantics live in `docfill-core`; this
//! crate handles the file format only.
//!
//! Element names are matched by their conventional qualified form (`w:p`, `w:r`, `r:id`),
//! which is how Word and the common generators write them.

mod model;
mod package;
mod relationships;
pub mod xml;

pub use model::{
    Block, Hyperlink, Inline, Paragraph, RowItem, Run, RunContent, Table, TableCell, TableItem,
    TableRow,
};
pub use package::{Document, Package, StoryKind, StoryPart};
pub use relationships::{LinkRegistry, Relationship, Relationships, HYPERLINK_TYPE};

use std::path::PathBuf;

/// Errors returned by the document container.
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("failed to parse {part}: {reason}")]
    Parse { part: String, reason: String },

    #[error("package is missing part {0}")]
    MissingPart(String),

    #[error("failed to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}

pub type DocxResult<T> = std::result::Result<T, DocxError>;
