//! Zip package I/O and the editable [`Document`].

use crate::model::{blocks_from_children, blocks_into_children, Block};
use crate::relationships::Relationships;
use crate::xml::{Node, XmlDocument};
use crate::{DocxError, DocxResult};
use std::io::{Read, Write};
use std::path::Path;

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const BODY: &str = "w:body";

/// The raw entries of a zip package, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self { entries }
    }

    /// Reads every entry of the zip archive at `path`.
    pub fn open(path: &Path) -> DocxResult<Self> {
        if !path.is_file() {
            return Err(DocxError::TemplateNotFound(path.to_path_buf()));
        }
        let parse_error = |reason: String| DocxError::Parse {
            part: path.display().to_string(),
            reason,
        };

        let file = std::fs::File::open(path).map_err(|e| parse_error(e.to_string()))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| parse_error(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| parse_error(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| parse_error(e.to_string()))?;
            entries.push((name, data));
        }
        Ok(Self { entries })
    }

    /// Writes the package as a zip archive at `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> DocxResult<()> {
        let write_error = |reason: String| DocxError::Write {
            path: path.to_path_buf(),
            reason,
        };

        let file = std::fs::File::create(path).map_err(|e| write_error(e.to_string()))?;
        let mut zip = zip::ZipWriter::new(file);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (name, data) in &self.entries {
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)
                .map_err(|e| write_error(e.to_string()))?;
            zip.write_all(data).map_err(|e| write_error(e.to_string()))?;
        }
        zip.finish().map_err(|e| write_error(e.to_string()))?;
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn set_entry(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(entry, _)| entry == name) {
            Some(existing) => existing.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }
}

/// What a story part holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryKind {
    Body,
    Header,
    Footer,
}

/// A part whose content is a sequence of blocks: the main document, a header or a footer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryPart {
    path: String,
    kind: StoryKind,
    declaration: bool,
    root: crate::xml::Element,
    /// Index of `w:body` among the root children, for the main document part.
    body_index: Option<usize>,
    pub blocks: Vec<Block>,
    pub relationships: Relationships,
}

impl StoryPart {
    fn load(package: &Package, path: &str, kind: StoryKind) -> DocxResult<Self> {
        let bytes = package
            .entry(path)
            .ok_or_else(|| DocxError::MissingPart(path.to_string()))?;
        let XmlDocument {
            declaration,
            mut root,
        } = XmlDocument::parse(path, bytes)?;

        let (blocks, body_index) = match kind {
            StoryKind::Body => {
                let found = root.children.iter_mut().enumerate().find_map(|(index, node)| {
                    match node {
                        Node::Element(element) if element.name == BODY => Some((index, element)),
                        _ => None,
                    }
                });
                let Some((index, body)) = found else {
                    return Err(DocxError::Parse {
                        part: path.to_string(),
                        reason: "main document has no w:body".into(),
                    });
                };
                (blocks_from_children(std::mem::take(&mut body.children)), Some(index))
            }
            StoryKind::Header | StoryKind::Footer => {
                (blocks_from_children(std::mem::take(&mut root.children)), None)
            }
        };

        let rels_path = relationships_path(path);
        let relationships = match package.entry(&rels_path) {
            Some(bytes) => Relationships::parse(&rels_path, bytes)?,
            None => Relationships::new(),
        };

        Ok(Self {
            path: path.to_string(),
            kind,
            declaration,
            root,
            body_index,
            blocks,
            relationships,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> StoryKind {
        self.kind
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut root = self.root.clone();
        let children = blocks_into_children(self.blocks.clone());
        match self.body_index {
            Some(index) => {
                if let Some(Node::Element(body)) = root.children.get_mut(index) {
                    body.children = children;
                }
            }
            None => root.children = children,
        }
        XmlDocument {
            declaration: self.declaration,
            root,
        }
        .to_bytes()
    }

    fn write_into(&self, package: &mut Package) {
        package.set_entry(&self.path, self.to_bytes());
        if self.relationships.is_modified() {
            package.set_entry(&relationships_path(&self.path), self.relationships.to_bytes());
        }
    }
}

/// An editable word-processing document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    package: Package,
    body: StoryPart,
    regions: Vec<StoryPart>,
}

impl Document {
    /// Loads the `.docx` file at `path`.
    pub fn open(path: &Path) -> DocxResult<Self> {
        tracing::info!("loading document {}", path.display());
        Self::from_package(Package::open(path)?)
    }

    /// Builds the editable tree from an in-memory package.
    ///
    /// Headers and footers are every header/footer part referenced from the main document,
    /// in relationship order.
    pub fn from_package(package: Package) -> DocxResult<Self> {
        let main_path = main_part_path(&package)?;
        let body = StoryPart::load(&package, &main_path, StoryKind::Body)?;

        let base = parent_dir(&main_path);
        let mut regions: Vec<StoryPart> = Vec::new();
        for (kind, name) in [(StoryKind::Header, "header"), (StoryKind::Footer, "footer")] {
            for relationship in body.relationships.of_kind(name) {
                if relationship.external {
                    continue;
                }
                let path = resolve_target(base, &relationship.target);
                if regions.iter().any(|region| region.path == path) {
                    continue;
                }
                regions.push(StoryPart::load(&package, &path, kind)?);
            }
        }
        tracing::debug!(
            "document {} has {} header/footer parts",
            main_path,
            regions.len()
        );

        Ok(Self {
            package,
            body,
            regions,
        })
    }

    pub fn body(&self) -> &StoryPart {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut StoryPart {
        &mut self.body
    }

    /// Header and footer parts.
    pub fn regions(&self) -> &[StoryPart] {
        &self.regions
    }

    /// The body followed by every header and footer.
    pub fn story_parts_mut(&mut self) -> impl Iterator<Item = &mut StoryPart> {
        std::iter::once(&mut self.body).chain(self.regions.iter_mut())
    }

    /// Serialises the edited tree back into a package.
    pub fn to_package(&self) -> Package {
        let mut package = self.package.clone();
        self.body.write_into(&mut package);
        for region in &self.regions {
            region.write_into(&mut package);
        }
        package
    }

    pub fn save(&self, path: &Path) -> DocxResult<()> {
        self.to_package().save(path)?;
        tracing::info!("saved document {}", path.display());
        Ok(())
    }
}

fn main_part_path(package: &Package) -> DocxResult<String> {
    let Some(bytes) = package.entry(PACKAGE_RELS) else {
        return if package.entry(DEFAULT_MAIN_PART).is_some() {
            Ok(DEFAULT_MAIN_PART.to_string())
        } else {
            Err(DocxError::MissingPart(PACKAGE_RELS.to_string()))
        };
    };
    let rels = Relationships::parse(PACKAGE_RELS, bytes)?;
    let main = rels
        .of_kind("officeDocument")
        .next()
        .ok_or_else(|| DocxError::MissingPart("officeDocument relationship".to_string()))?;
    Ok(resolve_target("", &main.target))
}

/// `word/document.xml` → `word/_rels/document.xml.rels`.
fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, name)) => format!("{}/_rels/{}.rels", dir, name),
        None => format!("_rels/{}.rels", part),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolves a relationship target against the directory of its source part.
fn resolve_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;
    use crate::LinkRegistry;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;
    const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
    const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="/word/footer1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/></Relationships>"#;
    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p><w:r><w:t>Body</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;
    const HEADER_XML: &str = r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Header</w:t></w:r></w:p></w:hdr>"#;
    const FOOTER_XML: &str = r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Footer</w:t></w:r></w:p></w:ftr>"#;

    fn sample_package() -> Package {
        Package::from_entries(vec![
            ("[Content_Types].xml".into(), CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels".into(), PACKAGE_RELS_XML.as_bytes().to_vec()),
            ("word/document.xml".into(), DOCUMENT_XML.as_bytes().to_vec()),
            (
                "word/_rels/document.xml.rels".into(),
                DOCUMENT_RELS_XML.as_bytes().to_vec(),
            ),
            ("word/header1.xml".into(), HEADER_XML.as_bytes().to_vec()),
            ("word/footer1.xml".into(), FOOTER_XML.as_bytes().to_vec()),
        ])
    }

    fn first_paragraph(part: &StoryPart) -> &Paragraph {
        part.blocks
            .iter()
            .find_map(|block| match block {
                Block::Paragraph(paragraph) => Some(paragraph),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_from_package_finds_body_and_regions_once() {
        let document = Document::from_package(sample_package()).unwrap();
        assert_eq!(document.body().path(), "word/document.xml");
        assert_eq!(document.body().blocks.len(), 2);
        assert_eq!(first_paragraph(document.body()).text(), "Body");

        let regions = document.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].kind(), StoryKind::Header);
        assert_eq!(regions[1].kind(), StoryKind::Footer);
        assert_eq!(first_paragraph(&regions[1]).text(), "Footer");
    }

    #[test]
    fn test_unchanged_document_keeps_other_entries() {
        let package = sample_package();
        let document = Document::from_package(package.clone()).unwrap();
        let written = document.to_package();
        assert_eq!(
            written.entry("[Content_Types].xml"),
            package.entry("[Content_Types].xml")
        );
        assert!(written.entry("word/_rels/header1.xml.rels").is_none());
        let reloaded = Document::from_package(written).unwrap();
        assert_eq!(reloaded.body().blocks, document.body().blocks);
    }

    #[test]
    fn test_edits_and_new_relationships_are_written() {
        let mut document = Document::from_package(sample_package()).unwrap();
        for part in document.story_parts_mut() {
            if part.kind() == StoryKind::Header {
                part.relationships.register_external_link("https://x.test");
                part.blocks.push(Block::Paragraph(Paragraph::from_texts(["added"])));
            }
        }

        let written = document.to_package();
        assert!(written.entry("word/_rels/header1.xml.rels").is_some());
        let reloaded = Document::from_package(written).unwrap();
        let header = &reloaded.regions()[0];
        assert_eq!(header.blocks.len(), 2);
        assert_eq!(
            header.relationships.get("rId1").unwrap().target,
            "https://x.test"
        );
    }

    #[test]
    fn test_missing_main_part_is_reported() {
        let package = Package::from_entries(vec![(
            "_rels/.rels".into(),
            PACKAGE_RELS_XML.as_bytes().to_vec(),
        )]);
        let err = Document::from_package(package).unwrap_err();
        assert!(matches!(err, DocxError::MissingPart(name) if name == "word/document.xml"));
    }

    #[test]
    fn test_open_missing_file_is_template_not_found() {
        let err = Document::open(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, DocxError::TemplateNotFound(_)));
    }

    #[test]
    fn test_zip_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.docx");
        sample_package().save(&path).unwrap();

        let document = Document::open(&path).unwrap();
        let out = dir.path().join("out.docx");
        document.save(&out).unwrap();
        let reopened = Document::open(&out).unwrap();
        assert_eq!(first_paragraph(reopened.body()).text(), "Body");
        assert_eq!(reopened.regions().len(), 2);
    }

    #[test]
    fn test_save_into_missing_directory_is_write_error() {
        let err = sample_package()
            .save(Path::new("/definitely/not/here/out.docx"))
            .unwrap_err();
        assert!(matches!(err, DocxError::Write { .. }));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word", "header1.xml"), "word/header1.xml");
        assert_eq!(resolve_target("word", "/word/footer1.xml"), "word/footer1.xml");
        assert_eq!(resolve_target("word/sub", "../media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_relationships_path() {
        assert_eq!(
            relationships_path("word/document.xml"),
            "word/_rels/document.xml.rels"
        );
        assert_eq!(relationships_path("doc.xml"), "_rels/doc.xml.rels");
    }
}
