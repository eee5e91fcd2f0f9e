//! Applies paragraph substitution to a whole document.
//!
//! Visits, in document order, the body and then every header and footer part. Within a part,
//! table cells are descended into recursively, so nested tables of any depth are covered.

use crate::substitute::{substitute_paragraph, Outcome, SpanningPlaceholderWarning};
use docfill_docx::{Block, Document, LinkRegistry, Table};
use docfill_types::FieldMapping;

/// Totals for one substitution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    pub paragraphs_visited: usize,
    pub paragraphs_changed: usize,
    pub links_inserted: usize,
    pub warnings: Vec<SpanningPlaceholderWarning>,
}

impl SubstitutionReport {
    fn record(&mut self, outcome: Outcome) {
        self.paragraphs_visited += 1;
        if outcome.is_changed() {
            self.paragraphs_changed += 1;
        }
        match outcome {
            Outcome::LinksInserted(count) => self.links_inserted += count,
            Outcome::Rebuilt(warning) => self.warnings.push(warning),
            Outcome::Unchanged | Outcome::RunsRewritten(_) => {}
        }
    }
}

/// Substitutes `mapping` into the body, headers and footers of `document`.
pub fn substitute_document(document: &mut Document, mapping: &FieldMapping) -> SubstitutionReport {
    let mut report = SubstitutionReport::default();
    for part in document.story_parts_mut() {
        let before = report.paragraphs_changed;
        substitute_blocks(&mut part.blocks, mapping, &mut part.relationships, &mut report);
        tracing::debug!(
            "{}: {} paragraph(s) changed",
            part.path(),
            report.paragraphs_changed - before
        );
    }
    tracing::info!(
        "substituted placeholders in {} of {} paragraphs ({} hyperlinks, {} warnings)",
        report.paragraphs_changed,
        report.paragraphs_visited,
        report.links_inserted,
        report.warnings.len()
    );
    report
}

/// Substitutes into every paragraph reachable from `blocks`.
pub fn substitute_blocks(
    blocks: &mut [Block],
    mapping: &FieldMapping,
    links: &mut dyn LinkRegistry,
    report: &mut SubstitutionReport,
) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                report.record(substitute_paragraph(paragraph, mapping, links));
            }
            Block::Table(table) => substitute_table(table, mapping, links, report),
            Block::Other(_) => {}
        }
    }
}

fn substitute_table(
    table: &mut Table,
    mapping: &FieldMapping,
    links: &mut dyn LinkRegistry,
    report: &mut SubstitutionReport,
) {
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            substitute_blocks(&mut cell.blocks, mapping, links, report);
        }
    }
}
