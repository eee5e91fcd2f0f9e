//! Run-aware placeholder substitution for a single paragraph.
//!
//! A paragraph is an ordered list of runs, each with its own formatting. Substitution tries to
//! keep that formatting:
//!
//! 1. If the paragraph text contains a link token whose URL is set, the runs are rebuilt: the
//!    text between link tokens becomes plain unstyled runs and every link token becomes a
//!    hyperlink. Formatting of the original runs is lost in this case.
//! 2. Otherwise the text of each run is substituted in place, so every run keeps its formatting,
//!    breaks and other content.
//! 3. If a placeholder was split across runs (the template applied different formatting to
//!    parts of it), per-run substitution cannot resolve it. The paragraph is then rebuilt from
//!    the whole-text substitution as unstyled runs, and a [`SpanningPlaceholderWarning`] is
//!    returned.
//!
//! Rebuilds keep the paragraph's other children (properties, bookmarks, existing hyperlinks,
//! fields) at their place in the text.

use crate::hyperlink::build_hyperlink;
use crate::placeholder::{substitute_plain, tokens, LinkToken, TokenKind};
use docfill_docx::{Inline, LinkRegistry, Paragraph, Run};
use docfill_types::{FieldMapping, NonEmptyText};
use std::borrow::Cow;
use std::ops::Range;

/// Placeholders were split across runs, so the paragraph lost its run formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanningPlaceholderWarning {
    /// Names of the split placeholders, in document order.
    pub placeholders: Vec<String>,
    /// Paragraph text before substitution.
    pub text: String,
}

impl std::fmt::Display for SpanningPlaceholderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "placeholder(s) {} split across formatted runs; paragraph {:?} rebuilt without run formatting",
            self.placeholders.join(", "),
            self.text
        )
    }
}

/// What substitution did to a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    /// This many runs had their text replaced in place.
    RunsRewritten(usize),
    /// Runs were rebuilt around this many hyperlinks.
    LinksInserted(usize),
    Rebuilt(SpanningPlaceholderWarning),
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Outcome::Unchanged)
    }
}

/// Substitutes every placeholder in `paragraph`.
///
/// Hyperlink targets are registered in `links`, which must be the relationships of the part
/// that holds the paragraph.
pub fn substitute_paragraph(
    paragraph: &mut Paragraph,
    mapping: &FieldMapping,
    links: &mut dyn LinkRegistry,
) -> Outcome {
    let flattened = paragraph.text();
    if flattened.is_empty() {
        return Outcome::Unchanged;
    }
    let cuts = cut_points(&paragraph.anchor_offsets(), &flattened);

    let targets = link_targets(&flattened, mapping);
    if !targets.is_empty() {
        let inserted = rebuild_with_links(paragraph, &flattened, &cuts, mapping, &targets, links);
        tracing::debug!("inserted {} hyperlink(s) into {:?}", inserted, flattened);
        return Outcome::LinksInserted(inserted);
    }

    let mut rewritten: Vec<Run> = paragraph.runs().cloned().collect();
    let mut changed = 0;
    for run in &mut rewritten {
        let touched = run.rewrite_text(|text| match substitute_plain(text, mapping) {
            Cow::Owned(value) if value != text => Some(value),
            _ => None,
        });
        if touched {
            changed += 1;
        }
    }

    let per_run: String = rewritten.iter().map(Run::text).collect();
    let whole = substitute_plain(&flattened, mapping);
    if per_run != whole {
        let pieces: Vec<String> = paragraph.runs().flat_map(Run::text_pieces).collect();
        let warning = SpanningPlaceholderWarning {
            placeholders: spanning_placeholders(&pieces, &flattened),
            text: flattened.clone(),
        };
        tracing::warn!("{}", warning);
        let mut items = Vec::new();
        push_plain(&mut items, &flattened, 0..flattened.len(), &cuts, mapping);
        paragraph.replace_runs(items);
        return Outcome::Rebuilt(warning);
    }

    if changed == 0 {
        return Outcome::Unchanged;
    }
    for (run, rewritten) in paragraph.runs_mut().zip(rewritten) {
        *run = rewritten;
    }
    Outcome::RunsRewritten(changed)
}

/// Link tokens present in `text` whose URL field is set, in priority order.
fn link_targets(text: &str, mapping: &FieldMapping) -> Vec<(LinkToken, NonEmptyText)> {
    LinkToken::ALL
        .into_iter()
        .filter(|link| text.contains(&link.placeholder()))
        .filter_map(|link| {
            let target = NonEmptyText::new(mapping.get(link.url_field())).ok()?;
            Some((link, target))
        })
        .collect()
}

/// Offsets where a rebuilt paragraph must start a new run so that its non-run children keep
/// their place. A child sitting inside a token moves to the end of that token.
fn cut_points(anchors: &[usize], flattened: &str) -> Vec<usize> {
    let ranges: Vec<Range<usize>> = tokens(flattened).map(|token| token.range).collect();
    let mut cuts: Vec<usize> = anchors
        .iter()
        .map(|&anchor| {
            ranges
                .iter()
                .find(|range| range.start < anchor && anchor < range.end)
                .map_or(anchor, |range| range.end)
        })
        .filter(|&cut| 0 < cut && cut < flattened.len())
        .collect();
    cuts.dedup();
    cuts
}

/// Pushes the plain substitution of `flattened[range]` as unstyled runs, one per stretch
/// between `cuts`.
fn push_plain(
    items: &mut Vec<(usize, Inline)>,
    flattened: &str,
    range: Range<usize>,
    cuts: &[usize],
    mapping: &FieldMapping,
) {
    let mut start = range.start;
    let inner = cuts
        .iter()
        .copied()
        .filter(|&cut| range.start < cut && cut < range.end);
    for end in inner.chain(std::iter::once(range.end)) {
        let text = substitute_plain(&flattened[start..end], mapping);
        if !text.is_empty() {
            items.push((start, Inline::Run(Run::new(text.into_owned()))));
        }
        start = end;
    }
}

/// Replaces the runs of `paragraph` with plain segments and hyperlinks. Returns the number of
/// hyperlinks inserted.
fn rebuild_with_links(
    paragraph: &mut Paragraph,
    flattened: &str,
    cuts: &[usize],
    mapping: &FieldMapping,
    targets: &[(LinkToken, NonEmptyText)],
    links: &mut dyn LinkRegistry,
) -> usize {
    let mut items = Vec::new();
    let mut cursor = 0;
    let mut inserted = 0;
    for token in tokens(flattened) {
        let TokenKind::Link(link) = token.kind() else {
            continue;
        };
        let Some((_, target)) = targets.iter().find(|(active, _)| *active == link) else {
            continue;
        };

        push_plain(&mut items, flattened, cursor..token.range.start, cuts, mapping);
        let hyperlink = build_hyperlink(
            links,
            target,
            mapping.get(link.text_field()),
            link.fallback_label(),
        );
        items.push((token.range.start, Inline::Hyperlink(hyperlink)));
        inserted += 1;
        cursor = token.range.end;
    }
    push_plain(&mut items, flattened, cursor..flattened.len(), cuts, mapping);

    paragraph.replace_runs(items);
    inserted
}

/// Names of plain placeholders in `flattened` that cross a boundary between `pieces`.
fn spanning_placeholders(pieces: &[String], flattened: &str) -> Vec<String> {
    let boundaries: Vec<usize> = pieces
        .iter()
        .scan(0, |offset, text| {
            *offset += text.len();
            Some(*offset)
        })
        .collect();

    let mut names: Vec<String> = Vec::new();
    for token in tokens(flattened) {
        let crosses = boundaries
            .iter()
            .any(|&boundary| token.range.start < boundary && boundary < token.range.end);
        if crosses
            && matches!(token.kind(), TokenKind::Plain(_))
            && !names.iter().any(|name| name == token.name)
        {
            names.push(token.name.to_string());
        }
    }
    names
}
