//! Placeholder grammar.
//!
//! A placeholder is `[` + one or more of `A-Z`, `0-9`, `_` + `]`. Bracketed text using any
//! other character (lowercase, spaces, punctuation) is ordinary text.
//!
//! Tokens are classified against the field schema:
//! - [`TokenKind::Link`] for the reserved link tokens, which become hyperlinks
//! - [`TokenKind::Plain`] for every other schema field, replaced with its value
//! - [`TokenKind::Unknown`] for names outside the schema and for the link URL/text fields,
//!   which are left exactly as written

use crate::constants::{DRIVE_LINK_LABEL, PANEL_LINK_LABEL};
use docfill_types::{Field, FieldMapping};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z0-9_]+)\]").expect("placeholder pattern is valid"));

/// A placeholder occurrence inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The name between the brackets.
    pub name: &'a str,
    /// Byte range of the whole token, brackets included.
    pub range: Range<usize>,
}

impl Token<'_> {
    pub fn kind(&self) -> TokenKind {
        classify(self.name)
    }
}

/// Every placeholder in `text`, left to right.
pub fn tokens(text: &str) -> impl Iterator<Item = Token<'_>> {
    TOKEN_PATTERN.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(1)?;
        Some(Token {
            name: name.as_str(),
            range: whole.range(),
        })
    })
}

/// How a placeholder name is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain(Field),
    Link(LinkToken),
    Unknown,
}

pub fn classify(name: &str) -> TokenKind {
    if let Some(link) = LinkToken::from_name(name) {
        return TokenKind::Link(link);
    }
    match Field::from_name(name) {
        Some(field) if !field.is_link() => TokenKind::Plain(field),
        _ => TokenKind::Unknown,
    }
}

/// A placeholder that is replaced by a hyperlink rather than text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkToken {
    Drive,
    Panel,
}

impl LinkToken {
    /// Link tokens in priority order.
    pub const ALL: [LinkToken; 2] = [LinkToken::Drive, LinkToken::Panel];

    /// Field holding the link target.
    pub fn url_field(self) -> Field {
        match self {
            LinkToken::Drive => Field::LinkDrive,
            LinkToken::Panel => Field::LinkPainel,
        }
    }

    /// Field holding the display text.
    pub fn text_field(self) -> Field {
        match self {
            LinkToken::Drive => Field::LinkDriveText,
            LinkToken::Panel => Field::LinkPainelText,
        }
    }

    /// Display text used when the text field is empty.
    pub fn fallback_label(self) -> &'static str {
        match self {
            LinkToken::Drive => DRIVE_LINK_LABEL,
            LinkToken::Panel => PANEL_LINK_LABEL,
        }
    }

    pub fn name(self) -> &'static str {
        self.url_field().name()
    }

    pub fn from_name(name: &str) -> Option<LinkToken> {
        LinkToken::ALL.into_iter().find(|link| link.name() == name)
    }

    /// The token as written in a template, e.g. `[LINK_DRIVE]`.
    pub fn placeholder(self) -> String {
        placeholder(self.url_field())
    }
}

/// `[NAME]` for `field`.
pub fn placeholder(field: Field) -> String {
    format!("[{}]", field.name())
}

/// Replaces every plain placeholder in `text` with its value, in a single pass.
///
/// Inserted values are never scanned again, so a value containing `[CNPJ]` stays literal. Link
/// tokens and unknown tokens are left untouched. Empty values replace their token with nothing.
pub fn substitute_plain<'t>(text: &'t str, mapping: &FieldMapping) -> Cow<'t, str> {
    TOKEN_PATTERN.replace_all(text, |caps: &Captures| match caps.get(1) {
        Some(name) => match classify(name.as_str()) {
            TokenKind::Plain(field) => mapping.get(field).to_string(),
            TokenKind::Link(_) | TokenKind::Unknown => caps[0].to_string(),
        },
        None => caps[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.set(Field::NomeEmpresaCliente, "ACME LTDA");
        mapping.set(Field::Cnpj, "12345678000195");
        mapping.set(Field::LinkDrive, "https://x.test");
        mapping.set(Field::LinkDriveText, "Drive");
        mapping
    }

    #[test]
    fn test_tokens_use_uppercase_grammar_only() {
        let text = "[CNPJ] [cnpj] [Nome] [A-B] [] [DATA_2024] [ SPACE ]";
        let names: Vec<&str> = tokens(text).map(|token| token.name).collect();
        assert_eq!(names, ["CNPJ", "DATA_2024"]);
    }

    #[test]
    fn test_token_ranges_cover_brackets() {
        let text = "Empresa: [NOME_EMPRESA_CLIENTE].";
        let token = tokens(text).next().unwrap();
        assert_eq!(&text[token.range.clone()], "[NOME_EMPRESA_CLIENTE]");
        assert_eq!(token.range, 9..31);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("CNPJ"), TokenKind::Plain(Field::Cnpj));
        assert_eq!(classify("LINK_DRIVE"), TokenKind::Link(LinkToken::Drive));
        assert_eq!(classify("LINK_PAINEL"), TokenKind::Link(LinkToken::Panel));
        assert_eq!(classify("LINK_DRIVE_TEXT"), TokenKind::Unknown);
        assert_eq!(classify("NOT_IN_SCHEMA"), TokenKind::Unknown);
    }

    #[test]
    fn test_link_token_fields() {
        assert_eq!(LinkToken::ALL[0], LinkToken::Drive);
        assert_eq!(LinkToken::Drive.placeholder(), "[LINK_DRIVE]");
        assert_eq!(LinkToken::Panel.text_field(), Field::LinkPainelText);
        assert_eq!(LinkToken::Panel.fallback_label(), "Painel Administrativo");
    }

    #[test]
    fn test_substitute_plain_replaces_known_fields() {
        let result = substitute_plain("[NOME_EMPRESA_CLIENTE] ([CNPJ])", &mapping());
        assert_eq!(result, "ACME LTDA (12345678000195)");
    }

    #[test]
    fn test_substitute_plain_leaves_links_and_unknown_tokens() {
        let text = "[LINK_DRIVE] [LINK_DRIVE_TEXT] [OUTRO] [cnpj]";
        let result = substitute_plain(text, &mapping());
        assert_eq!(result, text);
    }

    #[test]
    fn test_substitute_plain_empty_value_removes_token() {
        assert_eq!(substitute_plain("Fantasia: [FANTASIA].", &mapping()), "Fantasia: .");
    }

    #[test]
    fn test_substitute_plain_does_not_recurse_into_values() {
        let mut mapping = mapping();
        mapping.set(Field::Demanda, "ver [CNPJ]");
        assert_eq!(substitute_plain("[DEMANDA]", &mapping), "ver [CNPJ]");
    }
}
