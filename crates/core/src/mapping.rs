//! Builds the report [`FieldMapping`] from a registry record and user-supplied extras.

use crate::constants::{
    ADDRESS_SEPARATOR, CONTACT_SEPARATOR, MAX_SOURCE_TEXT_CHARS, REPORT_DATE_FORMAT,
    SUMMARY_SEPARATOR,
};
use crate::{ReportError, ReportResult};
use chrono::NaiveDate;
use docfill_registry::LookupRecord;
use docfill_types::{Field, FieldMapping};
use serde_json::Value;

/// Registry key of the primary-activity list.
const PRIMARY_ACTIVITY_KEY: &str = "atividade_principal";

const ADDRESS_KEYS: [&str; 6] = ["logradouro", "numero", "bairro", "municipio", "uf", "cep"];

/// Maps a registry record onto the field schema.
///
/// Every field is present in the result. Missing and null keys become empty strings, other
/// non-string values are stringified. The objective, link and extension fields are left empty
/// for [`apply_extras`] and the objective generator to fill in.
pub fn build_mapping(record: &LookupRecord) -> FieldMapping {
    let get = |key: &str| safe_get(record, key);
    let activity = primary_activity(record);

    let mut mapping = FieldMapping::new();
    mapping.set(Field::NomeEmpresaCliente, get("nome"));
    mapping.set(Field::Fantasia, get("fantasia"));
    mapping.set(Field::Cnpj, get("cnpj"));
    mapping.set(Field::Telefone, get("telefone"));
    mapping.set(Field::Email, get("email"));
    mapping.set(Field::Abertura, get("abertura"));
    mapping.set(Field::Situacao, get("situacao"));
    mapping.set(Field::Porte, get("porte"));

    mapping.set(
        Field::ResumoEmpresaCliente,
        join_non_empty(
            [activity.clone(), get("porte"), get("situacao")],
            SUMMARY_SEPARATOR,
        ),
    );
    mapping.set(
        Field::Endereco,
        join_non_empty(ADDRESS_KEYS.map(get), ADDRESS_SEPARATOR),
    );
    mapping.set(
        Field::Contato,
        join_non_empty([get("telefone"), get("email")], CONTACT_SEPARATOR),
    );
    mapping.set(Field::AtividadePrincipal, activity);
    mapping
}

/// Trimmed string value of `key`; empty when missing or null.
fn safe_get(record: &LookupRecord, key: &str) -> String {
    record.get(key).map(stringify).unwrap_or_default()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

/// The `text` of the first entry of the primary-activity list.
///
/// Any other shape degrades to the stringified raw value.
fn primary_activity(record: &LookupRecord) -> String {
    let Some(raw) = record.get(PRIMARY_ACTIVITY_KEY) else {
        return String::new();
    };
    match raw {
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => first.get("text").map(stringify).unwrap_or_default(),
            Some(_) => stringify(raw),
            None => String::new(),
        },
        other => stringify(other),
    }
}

fn join_non_empty<I>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// User-supplied values that do not come from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportExtras {
    pub drive_url: Option<String>,
    pub drive_text: Option<String>,
    pub start_date: Option<String>,
    pub delivery_date: Option<String>,
    pub domain: Option<String>,
    pub demand: Option<String>,
    pub assignee: Option<String>,
}

/// Fills the link and extension fields.
///
/// Links get an `https://` scheme when none is given. Dates are validated and rendered as
/// `dd/mm/yyyy`; `DATA_EMISSAO` is `today`. The admin-panel link is derived from the domain.
pub fn apply_extras(
    mapping: &mut FieldMapping,
    extras: &ReportExtras,
    default_assignee: &str,
    admin_panel_suffix: &str,
    today: NaiveDate,
) -> ReportResult<()> {
    let given = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    if let Some(url) = given(&extras.drive_url) {
        mapping.set(Field::LinkDrive, normalize_url(&url));
        mapping.set(
            Field::LinkDriveText,
            given(&extras.drive_text).unwrap_or_default(),
        );
    }

    if let Some(date) = given(&extras.start_date) {
        mapping.set(Field::DataInicio, parse_date(&date)?);
    }
    if let Some(date) = given(&extras.delivery_date) {
        mapping.set(Field::DataEntrega, parse_date(&date)?);
    }
    mapping.set(
        Field::DataEmissao,
        today.format(REPORT_DATE_FORMAT).to_string(),
    );

    mapping.set(Field::Dominio, given(&extras.domain).unwrap_or_default());
    mapping.set(Field::Demanda, given(&extras.demand).unwrap_or_default());
    mapping.set(
        Field::Responsavel,
        given(&extras.assignee).unwrap_or_else(|| default_assignee.trim().to_string()),
    );

    derive_admin_panel(mapping, admin_panel_suffix);
    Ok(())
}

/// Sets `LINK_PAINEL` to the normalised domain plus `suffix`, or clears it when the domain is
/// empty.
pub fn derive_admin_panel(mapping: &mut FieldMapping, suffix: &str) {
    let domain = mapping.get(Field::Dominio).trim();
    let url = if domain.is_empty() {
        String::new()
    } else {
        format!(
            "{}/{}",
            normalize_url(domain).trim_end_matches('/'),
            suffix.trim().trim_start_matches('/')
        )
    };
    mapping.set(Field::LinkPainel, url);
}

/// Trims `raw` and prepends `https://` unless it already has an http(s) scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty() || lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Parses `YYYY-MM-DD` or `dd/mm/yyyy` and renders it as `dd/mm/yyyy`.
pub fn parse_date(raw: &str) -> ReportResult<String> {
    let raw = raw.trim();
    ["%Y-%m-%d", REPORT_DATE_FORMAT]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.format(REPORT_DATE_FORMAT).to_string())
        .ok_or_else(|| {
            ReportError::InvalidInput(format!(
                "invalid date {:?}: expected YYYY-MM-DD or dd/mm/yyyy",
                raw
            ))
        })
}

/// Facts handed to the objective generator.
///
/// The primary activity and summary lines when present, otherwise the raw record truncated
/// to a fixed number of characters.
pub fn objective_source_text(mapping: &FieldMapping, record: &LookupRecord) -> String {
    let mut lines = Vec::new();
    if mapping.is_set(Field::AtividadePrincipal) {
        lines.push(format!(
            "Atividade principal: {}",
            mapping.get(Field::AtividadePrincipal)
        ));
    }
    if mapping.is_set(Field::ResumoEmpresaCliente) {
        lines.push(format!("Resumo: {}", mapping.get(Field::ResumoEmpresaCliente)));
    }
    let text = lines.join("\n");
    if !text.trim().is_empty() {
        return text;
    }
    Value::Object(record.clone())
        .to_string()
        .chars()
        .take(MAX_SOURCE_TEXT_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> LookupRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_build_mapping_from_full_record() {
        let mapping = build_mapping(&record(json!({
            "nome": " ACME COMERCIO LTDA ",
            "fantasia": "ACME",
            "cnpj": "12.345.678/0001-95",
            "atividade_principal": [{"code": "47.89-0-99", "text": "Comércio varejista"}],
            "porte": "ME",
            "situacao": "ATIVA",
            "logradouro": "Rua A",
            "numero": 10,
            "bairro": null,
            "municipio": "São Paulo",
            "uf": "SP",
            "cep": "01000-000",
            "telefone": "(11) 5555-0000",
            "email": "contato@acme.test",
            "abertura": "01/02/2010"
        })));

        assert_eq!(mapping.get(Field::NomeEmpresaCliente), "ACME COMERCIO LTDA");
        assert_eq!(mapping.get(Field::AtividadePrincipal), "Comércio varejista");
        assert_eq!(
            mapping.get(Field::ResumoEmpresaCliente),
            "Comércio varejista | ME | ATIVA"
        );
        assert_eq!(
            mapping.get(Field::Endereco),
            "Rua A - 10 - São Paulo - SP - 01000-000"
        );
        assert_eq!(
            mapping.get(Field::Contato),
            "(11) 5555-0000 / contato@acme.test"
        );
        assert_eq!(mapping.get(Field::ObjetivoEmpresa), "");
        assert_eq!(mapping.get(Field::LinkDrive), "");
    }

    #[test]
    fn test_summary_skips_empty_constituents() {
        let mapping = build_mapping(&record(json!({
            "porte": "SMALL",
            "situacao": "",
            "atividade_principal": [{"text": "Retail"}]
        })));
        assert_eq!(mapping.get(Field::ResumoEmpresaCliente), "Retail | SMALL");
    }

    #[test]
    fn test_missing_keys_are_empty() {
        let mapping = build_mapping(&LookupRecord::new());
        for (field, value) in mapping.iter() {
            assert_eq!(value, "", "{} should be empty", field);
        }
    }

    #[test]
    fn test_primary_activity_degrades_to_raw_value() {
        let mapping = build_mapping(&record(json!({"atividade_principal": "Serviços"})));
        assert_eq!(mapping.get(Field::AtividadePrincipal), "Serviços");

        let mapping = build_mapping(&record(json!({"atividade_principal": [42]})));
        assert_eq!(mapping.get(Field::AtividadePrincipal), "[42]");

        let mapping = build_mapping(&record(json!({"atividade_principal": [{"code": "1"}]})));
        assert_eq!(mapping.get(Field::AtividadePrincipal), "");
    }

    #[test]
    fn test_apply_extras() {
        let mut mapping = FieldMapping::new();
        let extras = ReportExtras {
            drive_url: Some(" drive.google.com/x ".into()),
            drive_text: Some("".into()),
            start_date: Some("2024-01-31".into()),
            delivery_date: Some("15/02/2024".into()),
            domain: Some("acme.test/".into()),
            demand: Some("Nova loja".into()),
            assignee: None,
        };

        apply_extras(&mut mapping, &extras, "Equipe", "/wp-admin", today()).unwrap();

        assert_eq!(mapping.get(Field::LinkDrive), "https://drive.google.com/x");
        assert_eq!(mapping.get(Field::LinkDriveText), "");
        assert_eq!(mapping.get(Field::DataInicio), "31/01/2024");
        assert_eq!(mapping.get(Field::DataEntrega), "15/02/2024");
        assert_eq!(mapping.get(Field::DataEmissao), "05/03/2024");
        assert_eq!(mapping.get(Field::Dominio), "acme.test/");
        assert_eq!(mapping.get(Field::LinkPainel), "https://acme.test/wp-admin");
        assert_eq!(mapping.get(Field::Demanda), "Nova loja");
        assert_eq!(mapping.get(Field::Responsavel), "Equipe");
    }

    #[test]
    fn test_apply_extras_rejects_bad_dates() {
        let mut mapping = FieldMapping::new();
        let extras = ReportExtras {
            start_date: Some("31-01-2024".into()),
            ..ReportExtras::default()
        };
        let err = apply_extras(&mut mapping, &extras, "", "/wp-admin", today()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[test]
    fn test_admin_panel_left_empty_without_domain() {
        let mut mapping = FieldMapping::new();
        derive_admin_panel(&mut mapping, "/wp-admin");
        assert_eq!(mapping.get(Field::LinkPainel), "");

        mapping.set(Field::Dominio, "http://acme.test");
        derive_admin_panel(&mut mapping, "/wp-admin");
        assert_eq!(mapping.get(Field::LinkPainel), "http://acme.test/wp-admin");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("x.test"), "https://x.test");
        assert_eq!(normalize_url(" https://x.test "), "https://x.test");
        assert_eq!(normalize_url("HTTP://x.test"), "HTTP://x.test");
        assert_eq!(normalize_url("  "), "");
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert_eq!(parse_date("2024-02-29").unwrap(), "29/02/2024");
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("amanhã").is_err());
    }

    #[test]
    fn test_objective_source_text() {
        let mut mapping = FieldMapping::new();
        mapping.set(Field::AtividadePrincipal, "Varejo");
        mapping.set(Field::ResumoEmpresaCliente, "Varejo | ME");
        assert_eq!(
            objective_source_text(&mapping, &LookupRecord::new()),
            "Atividade principal: Varejo\nResumo: Varejo | ME"
        );
    }

    #[test]
    fn test_objective_source_text_falls_back_to_truncated_record() {
        let long = "x".repeat(5000);
        let record = record(json!({ "nome": long }));
        let text = objective_source_text(&FieldMapping::new(), &record);
        assert_eq!(text.chars().count(), MAX_SOURCE_TEXT_CHARS);
        assert!(text.starts_with("{\"nome\":\"xxx"));
    }
}
