//! End-to-end report generation: lookup, mapping, objective text, substitution, save.

use crate::config::ReportConfig;
use crate::mapping::{apply_extras, build_mapping, objective_source_text, ReportExtras};
use crate::walker::{substitute_document, SubstitutionReport};
use crate::{ReportError, ReportResult};
use chrono::NaiveDate;
use docfill_docx::Document;
use docfill_generation::{build_generator, MockProvider, ProviderKind, ProviderSettings};
use docfill_registry::{CompanyLookup, LookupRecord, RegistryClient, ReqwestTransport};
use docfill_types::{Cnpj, Field, FieldMapping};
use std::path::{Path, PathBuf};

/// One report to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub template: PathBuf,
    /// Company identifier as typed by the user; punctuation is allowed.
    pub cnpj: String,
    pub output: PathBuf,
    pub extras: ReportExtras,
    /// Provider for the objective text, or `None` to leave `[OBJETIVO_EMPRESA]` empty.
    pub objective: Option<ProviderKind>,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub output: PathBuf,
    pub cnpj: Cnpj,
    pub mapping: FieldMapping,
    pub substitution: SubstitutionReport,
}

/// Generates reports using `L` for company lookups.
pub struct ReportGenerator<L> {
    config: ReportConfig,
    lookup: L,
}

impl ReportGenerator<RegistryClient<ReqwestTransport>> {
    /// A generator backed by the public registry, as configured.
    pub fn from_config(config: ReportConfig) -> ReportResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.registry_timeout())?;
        let lookup = RegistryClient::new(
            config.registry.base_url.clone(),
            transport,
            config.retry_policy(),
        );
        Ok(Self::new(config, lookup))
    }
}

impl<L: CompanyLookup> ReportGenerator<L> {
    pub fn new(config: ReportConfig, lookup: L) -> Self {
        Self { config, lookup }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Looks the company up and builds the complete field mapping, objective included.
    pub fn prepare_mapping(
        &self,
        request: &ReportRequest,
        today: NaiveDate,
    ) -> ReportResult<(Cnpj, FieldMapping)> {
        let cnpj = Cnpj::parse(&request.cnpj)?;

        // Validate user input before spending a network round trip.
        let mut extras_only = FieldMapping::new();
        apply_extras(
            &mut extras_only,
            &request.extras,
            &self.config.assignee,
            &self.config.admin_panel_suffix,
            today,
        )?;

        tracing::info!("looking up company {}", cnpj);
        let record = self.lookup.lookup(&cnpj)?;
        let mut mapping = build_mapping(&record);
        for field in Field::ALL {
            if extras_only.is_set(field) {
                mapping.set(field, extras_only.get(field));
            }
        }

        if let Some(kind) = request.objective {
            let objective = self.objective(kind, &mapping, &record);
            mapping.set(Field::ObjetivoEmpresa, objective);
        }
        Ok((cnpj, mapping))
    }

    /// Runs the whole flow and writes the filled document to `request.output`.
    pub fn generate(&self, request: &ReportRequest, today: NaiveDate) -> ReportResult<ReportSummary> {
        if !request.template.is_file() {
            return Err(ReportError::Document(
                docfill_docx::DocxError::TemplateNotFound(request.template.clone()),
            ));
        }

        let (cnpj, mapping) = self.prepare_mapping(request, today)?;
        let substitution = fill_template(&request.template, &request.output, &mapping)?;

        Ok(ReportSummary {
            output: request.output.clone(),
            cnpj,
            mapping,
            substitution,
        })
    }

    /// Objective text from the requested provider, falling back to the local heuristic when the
    /// provider cannot be built or fails.
    fn objective(&self, kind: ProviderKind, mapping: &FieldMapping, record: &LookupRecord) -> String {
        let source_text = objective_source_text(mapping, record);
        generate_objective(kind, &self.config.provider_settings(), &source_text, mapping)
    }
}

/// Runs `kind` and falls back to [`MockProvider`] on any provider error.
pub fn generate_objective(
    kind: ProviderKind,
    settings: &ProviderSettings,
    source_text: &str,
    mapping: &FieldMapping,
) -> String {
    let generator = match build_generator(kind, settings) {
        Ok(generator) => generator,
        Err(e) => {
            tracing::warn!("cannot use {} provider ({}), using local heuristic", kind, e);
            return MockProvider.objective(source_text, mapping);
        }
    };
    match generator.generate(source_text, mapping) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} provider failed ({}), using local heuristic", kind, e);
            MockProvider.objective(source_text, mapping)
        }
    }
}

/// Loads `template`, substitutes `mapping` everywhere and saves the result to `output`.
pub fn fill_template(
    template: &Path,
    output: &Path,
    mapping: &FieldMapping,
) -> ReportResult<SubstitutionReport> {
    let mut document = Document::open(template)?;
    let report = substitute_document(&mut document, mapping);
    document.save(output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_docx::Package;
    use docfill_registry::LookupError;
    use serde_json::json;
    use std::cell::Cell;

    struct FixedLookup {
        record: serde_json::Value,
        calls: Cell<usize>,
    }

    impl FixedLookup {
        fn new(record: serde_json::Value) -> Self {
            Self {
                record,
                calls: Cell::new(0),
            }
        }
    }

    impl CompanyLookup for FixedLookup {
        fn lookup(&self, cnpj: &Cnpj) -> Result<LookupRecord, LookupError> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(cnpj.as_str(), "12345678000195");
            match &self.record {
                serde_json::Value::Object(map) => Ok(map.clone()),
                _ => Err(LookupError::Provider("not found".into())),
            }
        }
    }

    fn record() -> serde_json::Value {
        json!({
            "nome": "ACME LTDA",
            "cnpj": "12.345.678/0001-95",
            "atividade_principal": [{"text": "Comércio varejista"}],
            "porte": "ME",
            "situacao": "ATIVA"
        })
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/></Types>"#;

    const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/></Relationships>"#;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>[NOME_EMPRESA_CLIENTE]</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Texto sem campos </w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>CNPJ: [CNPJ]</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>[OBJETIVO_EMPRESA]</w:t></w:r></w:p><w:sectPr><w:footerReference w:type="default" r:id="rId1"/></w:sectPr></w:body></w:document>"#;

    const FOOTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:p><w:r><w:t xml:space="preserve">Arquivos: [LINK_DRIVE]</w:t></w:r></w:p></w:ftr>"#;

    fn write_template(dir: &Path) -> PathBuf {
        let package = Package::from_entries(vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels".to_string(), PACKAGE_RELS.as_bytes().to_vec()),
            ("word/document.xml".to_string(), DOCUMENT.as_bytes().to_vec()),
            ("word/_rels/document.xml.rels".to_string(), DOCUMENT_RELS.as_bytes().to_vec()),
            ("word/footer1.xml".to_string(), FOOTER.as_bytes().to_vec()),
        ]);
        let path = dir.join("template.docx");
        package.save(&path).unwrap();
        path
    }

    fn request(dir: &Path, template: PathBuf) -> ReportRequest {
        ReportRequest {
            template,
            cnpj: "12.345.678/0001-95".into(),
            output: dir.join("out.docx"),
            extras: ReportExtras {
                drive_url: Some("drive.test/pasta".into()),
                drive_text: Some("Pasta do projeto".into()),
                ..ReportExtras::default()
            },
            objective: Some(ProviderKind::Mock),
        }
    }

    fn paragraph_texts(document: &Document) -> Vec<String> {
        fn collect(blocks: &[docfill_docx::Block], out: &mut Vec<String>) {
            for block in blocks {
                match block {
                    docfill_docx::Block::Paragraph(p) => out.push(p.display_text()),
                    docfill_docx::Block::Table(table) => {
                        for row in table.rows() {
                            for cell in row.cells() {
                                collect(&cell.blocks, out);
                            }
                        }
                    }
                    docfill_docx::Block::Other(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&document.body().blocks, &mut out);
        for region in document.regions() {
            collect(&region.blocks, &mut out);
        }
        out
    }

    #[test]
    fn test_generate_fills_body_table_and_footer() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        let generator = ReportGenerator::new(ReportConfig::default(), FixedLookup::new(record()));

        let summary = generator.generate(&request(dir.path(), template), today()).unwrap();

        assert_eq!(summary.cnpj.as_str(), "12345678000195");
        assert_eq!(summary.substitution.paragraphs_visited, 5);
        assert_eq!(summary.substitution.paragraphs_changed, 4);
        assert_eq!(summary.substitution.links_inserted, 1);
        assert!(summary.substitution.warnings.is_empty());

        let output = Document::open(&summary.output).unwrap();
        let texts = paragraph_texts(&output);
        assert_eq!(texts[0], "ACME LTDA");
        assert_eq!(texts[1], "Texto sem campos ");
        assert_eq!(texts[2], "CNPJ: 12.345.678/0001-95");
        assert!(texts[3].starts_with("O objetivo da ACME LTDA é atuar em comércio varejista"));
        assert_eq!(texts[4], "Arquivos: Pasta do projeto");

        let footer = &output.regions()[0];
        let docfill_docx::Block::Paragraph(paragraph) = &footer.blocks[0] else {
            panic!("footer should start with a paragraph");
        };
        let link = paragraph.hyperlinks().next().unwrap();
        let target = footer
            .relationships
            .get(link.relationship_id().unwrap())
            .unwrap()
            .target;
        assert_eq!(target, "https://drive.test/pasta");
    }

    #[test]
    fn test_body_formatting_survives() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        let generator = ReportGenerator::new(ReportConfig::default(), FixedLookup::new(record()));

        let summary = generator.generate(&request(dir.path(), template), today()).unwrap();

        let output = Document::open(&summary.output).unwrap();
        let docfill_docx::Block::Paragraph(first) = &output.body().blocks[0] else {
            panic!("body should start with a paragraph");
        };
        let run = first.runs().next().unwrap();
        assert!(run.properties.is_some());
    }

    #[test]
    fn test_missing_template_fails_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = FixedLookup::new(record());
        let generator = ReportGenerator::new(ReportConfig::default(), lookup);

        let err = generator
            .generate(&request(dir.path(), dir.path().join("nope.docx")), today())
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::Document(docfill_docx::DocxError::TemplateNotFound(_))
        ));
        assert_eq!(generator.lookup.calls.get(), 0);
    }

    #[test]
    fn test_invalid_cnpj_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        let generator = ReportGenerator::new(ReportConfig::default(), FixedLookup::new(record()));
        let mut request = request(dir.path(), template);
        request.cnpj = "123".into();

        let err = generator.generate(&request, today()).unwrap_err();

        assert!(matches!(err, ReportError::InvalidInput(_)));
        assert_eq!(generator.lookup.calls.get(), 0);
    }

    #[test]
    fn test_lookup_failure_is_fatal() {
        let generator = ReportGenerator::new(
            ReportConfig::default(),
            FixedLookup::new(serde_json::Value::Null),
        );
        let request = ReportRequest {
            template: PathBuf::from("unused.docx"),
            cnpj: "12345678000195".into(),
            output: PathBuf::from("unused-out.docx"),
            extras: ReportExtras::default(),
            objective: None,
        };

        let err = generator.prepare_mapping(&request, today()).unwrap_err();
        assert!(matches!(err, ReportError::Lookup(LookupError::Provider(_))));
    }

    #[test]
    fn test_prepare_mapping_uses_configured_assignee() {
        let mut config = ReportConfig::default();
        config.assignee = "Maria".into();
        let generator = ReportGenerator::new(config, FixedLookup::new(record()));
        let request = ReportRequest {
            template: PathBuf::from("unused.docx"),
            cnpj: "12345678000195".into(),
            output: PathBuf::from("unused-out.docx"),
            extras: ReportExtras {
                domain: Some("acme.test".into()),
                ..ReportExtras::default()
            },
            objective: None,
        };

        let (_, mapping) = generator.prepare_mapping(&request, today()).unwrap();

        assert_eq!(mapping.get(Field::Responsavel), "Maria");
        assert_eq!(mapping.get(Field::LinkPainel), "https://acme.test/wp-admin");
        assert_eq!(mapping.get(Field::DataEmissao), "05/03/2024");
        assert_eq!(mapping.get(Field::ObjetivoEmpresa), "");
        assert_eq!(mapping.get(Field::NomeEmpresaCliente), "ACME LTDA");
    }

    #[test]
    fn test_remote_provider_without_credentials_falls_back() {
        let mut mapping = FieldMapping::new();
        mapping.set(Field::NomeEmpresaCliente, "ACME");
        mapping.set(Field::AtividadePrincipal, "Varejo");

        let text = generate_objective(
            ProviderKind::OpenAi,
            &ProviderSettings::default(),
            "Atividade principal: Varejo",
            &mapping,
        );

        assert!(text.starts_with("O objetivo da ACME é atuar em varejo"));
    }
}
