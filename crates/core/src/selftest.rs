//! Offline smoke checks for the `self-test` command.

use crate::substitute::{substitute_paragraph, Outcome};
use docfill_docx::{Paragraph, Relationships, Run};
use docfill_types::{Cnpj, Field, FieldMapping};

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Runs identifier normalisation and paragraph substitution against fixed inputs.
pub fn run_self_test() -> Vec<SelfTestCheck> {
    vec![
        check_cnpj_normalisation(),
        check_cnpj_rejection(),
        check_paragraph_substitution(),
    ]
}

fn check_cnpj_normalisation() -> SelfTestCheck {
    let detail = match Cnpj::parse("12.345.678/0001-95") {
        Ok(cnpj) => cnpj.to_string(),
        Err(e) => e.to_string(),
    };
    SelfTestCheck {
        name: "cnpj normalisation",
        passed: detail == "12345678000195",
        detail,
    }
}

fn check_cnpj_rejection() -> SelfTestCheck {
    let result = Cnpj::parse("12.345.678/0001");
    SelfTestCheck {
        name: "cnpj digit count",
        passed: result.is_err(),
        detail: match result {
            Ok(cnpj) => format!("accepted {}", cnpj),
            Err(e) => e.to_string(),
        },
    }
}

fn check_paragraph_substitution() -> SelfTestCheck {
    let mut mapping = FieldMapping::new();
    mapping.set(Field::NomeEmpresaCliente, "Empresa Teste LTDA");
    mapping.set(Field::Cnpj, "12345678000195");

    let mut paragraph = Paragraph::from_texts(["Cliente: [NOME_EMPRESA_CLIENTE]", " (CNPJ [CNPJ])"]);
    let mut rels = Relationships::new();
    let outcome = substitute_paragraph(&mut paragraph, &mapping, &mut rels);

    let texts: Vec<String> = paragraph.runs().map(Run::text).collect();
    let expected = ["Cliente: Empresa Teste LTDA", " (CNPJ 12345678000195)"];
    SelfTestCheck {
        name: "paragraph substitution",
        passed: outcome == Outcome::RunsRewritten(2) && texts == expected,
        detail: texts.concat(),
    }
}
