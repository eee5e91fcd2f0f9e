//! Package relationship parts (`*.rels`).

use crate::xml::{Element, Node, XmlDocument};
use crate::DocxResult;

const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of an external hyperlink.
pub const HYPERLINK_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

const RELATIONSHIP: &str = "Relationship";

/// Something that can hand out a relationship id for an external link target.
///
/// Every story part owns one; a hyperlink inserted into a paragraph must reference an id
/// registered in the part that contains the paragraph.
pub trait LinkRegistry {
    fn register_external_link(&mut self, target: &str) -> String;
}

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    document: XmlDocument,
    modified: bool,
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

impl Relationships {
    /// An empty relationships part.
    pub fn new() -> Self {
        let root = Element::new("Relationships").with_attribute("xmlns", RELATIONSHIPS_NAMESPACE);
        Self {
            document: XmlDocument::new(root),
            modified: false,
        }
    }

    pub fn parse(part: &str, bytes: &[u8]) -> DocxResult<Self> {
        Ok(Self {
            document: XmlDocument::parse(part, bytes)?,
            modified: false,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.document.to_bytes()
    }

    /// Whether entries were added since the part was loaded.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.document
            .root
            .child_elements()
            .filter(|element| element.name == RELATIONSHIP)
            .filter_map(|element| {
                Some(Relationship {
                    id: element.attribute("Id")?.to_string(),
                    rel_type: element.attribute("Type")?.to_string(),
                    target: element.attribute("Target")?.to_string(),
                    external: element.attribute("TargetMode") == Some("External"),
                })
            })
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.iter().find(|relationship| relationship.id == id)
    }

    /// Relationships whose type ends with `/{kind}`, e.g. `header` or `officeDocument`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = Relationship> + 'a {
        self.iter().filter(move |relationship| {
            relationship
                .rel_type
                .rsplit('/')
                .next()
                .is_some_and(|last| last == kind)
        })
    }

    fn next_id(&self) -> String {
        let highest = self
            .iter()
            .filter_map(|relationship| relationship.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", highest + 1)
    }
}

impl LinkRegistry for Relationships {
    /// Reuses an existing external hyperlink to the same target, otherwise adds one.
    fn register_external_link(&mut self, target: &str) -> String {
        if let Some(existing) = self.iter().find(|relationship| {
            relationship.external && relationship.rel_type == HYPERLINK_TYPE && relationship.target == target
        }) {
            return existing.id;
        }

        let id = self.next_id();
        let element = Element::new(RELATIONSHIP)
            .with_attribute("Id", id.as_str())
            .with_attribute("Type", HYPERLINK_TYPE)
            .with_attribute("Target", target)
            .with_attribute("TargetMode", "External");
        self.document.root.children.push(Node::Element(element));
        self.modified = true;
        id
    }
}
