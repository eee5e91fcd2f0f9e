use crate::constants::LINK_COLOR;
use docfill_docx::xml::Element;
use docfill_docx::{Hyperlink, LinkRegistry, Run};
use docfill_types::NonEmptyText;

/// Builds a clickable link showing `display`, or `fallback` when `display` is blank.
///
/// The target is registered as an external relationship of the part that will hold the link.
/// URL syntax is not checked; callers normalise schemes beforehand.
pub fn build_hyperlink(
    links: &mut dyn LinkRegistry,
    target: &NonEmptyText,
    display: &str,
    fallback: &str,
) -> Hyperlink {
    let text = if display.trim().is_empty() {
        fallback
    } else {
        display
    };
    let relationship_id = links.register_external_link(target.as_str());
    Hyperlink::external(
        relationship_id,
        vec![Run::styled(link_run_properties(), text)],
    )
}

/// Blue, single underline.
fn link_run_properties() -> Element {
    Element::new("w:rPr")
        .with_child(Element::new("w:color").with_attribute("w:val", LINK_COLOR))
        .with_child(Element::new("w:u").with_attribute("w:val", "single"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_docx::Relationships;

    #[test]
    fn test_hyperlink_registers_target_and_styles_run() {
        let mut rels = Relationships::new();
        let target = NonEmptyText::new("https://x.test").unwrap();

        let link = build_hyperlink(&mut rels, &target, "Drive", "Link Drive");

        let id = link.relationship_id().unwrap().to_string();
        let relationship = rels.get(&id).unwrap();
        assert_eq!(relationship.target, "https://x.test");
        assert!(relationship.external);
        assert_eq!(link.text(), "Drive");

        let run = link.runs().next().unwrap();
        let properties = run.properties.as_ref().unwrap();
        let styles: Vec<(&str, Option<&str>)> = properties
            .child_elements()
            .map(|child| (child.name.as_str(), child.attribute("w:val")))
            .collect();
        assert_eq!(
            styles,
            [("w:color", Some("0000FF")), ("w:u", Some("single"))]
        );
    }

    #[test]
    fn test_blank_display_uses_fallback() {
        let mut rels = Relationships::new();
        let target = NonEmptyText::new("https://x.test").unwrap();
        let link = build_hyperlink(&mut rels, &target, "  ", "Link Drive");
        assert_eq!(link.text(), "Link Drive");
    }

    #[test]
    fn test_same_target_reuses_relationship() {
        let mut rels = Relationships::new();
        let target = NonEmptyText::new("https://x.test").unwrap();
        let first = build_hyperlink(&mut rels, &target, "a", "x");
        let second = build_hyperlink(&mut rels, &target, "b", "x");
        assert_eq!(first.relationship_id(), second.relationship_id());
        assert_eq!(rels.iter().count(), 1);
    }
}
