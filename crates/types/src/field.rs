//! The closed set of template fields and the mapping that holds their values.
//!
//! Every placeholder a template may reference is a [`Field`] variant. A [`FieldMapping`] always
//! holds a value for every field; the empty string means "unset".

use serde::ser::SerializeMap;

/// A named template field. The placeholder for a field is its name in square brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    NomeEmpresaCliente,
    Fantasia,
    ResumoEmpresaCliente,
    Cnpj,
    Endereco,
    AtividadePrincipal,
    Telefone,
    Email,
    Contato,
    Abertura,
    Situacao,
    Porte,
    ObjetivoEmpresa,
    LinkDrive,
    LinkDriveText,
    LinkPainel,
    LinkPainelText,
    DataEmissao,
    DataInicio,
    DataEntrega,
    Dominio,
    Demanda,
    Responsavel,
}

impl Field {
    /// Number of fields in the schema.
    pub const COUNT: usize = 23;

    /// Every field, in schema order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::NomeEmpresaCliente,
        Field::Fantasia,
        Field::ResumoEmpresaCliente,
        Field::Cnpj,
        Field::Endereco,
        Field::AtividadePrincipal,
        Field::Telefone,
        Field::Email,
        Field::Contato,
        Field::Abertura,
        Field::Situacao,
        Field::Porte,
        Field::ObjetivoEmpresa,
        Field::LinkDrive,
        Field::LinkDriveText,
        Field::LinkPainel,
        Field::LinkPainelText,
        Field::DataEmissao,
        Field::DataInicio,
        Field::DataEntrega,
        Field::Dominio,
        Field::Demanda,
        Field::Responsavel,
    ];

    /// The placeholder name, as written between the brackets in a template.
    pub fn name(self) -> &'static str {
        match self {
            Field::NomeEmpresaCliente => "NOME_EMPRESA_CLIENTE",
            Field::Fantasia => "FANTASIA",
            Field::ResumoEmpresaCliente => "RESUMO_EMPRESA_CLIENTE",
            Field::Cnpj => "CNPJ",
            Field::Endereco => "ENDERECO",
            Field::AtividadePrincipal => "ATIVIDADE_PRINCIPAL",
            Field::Telefone => "TELEFONE",
            Field::Email => "EMAIL",
            Field::Contato => "CONTATO",
            Field::Abertura => "ABERTURA",
            Field::Situacao => "SITUACAO",
            Field::Porte => "PORTE",
            Field::ObjetivoEmpresa => "OBJETIVO_EMPRESA",
            Field::LinkDrive => "LINK_DRIVE",
            Field::LinkDriveText => "LINK_DRIVE_TEXT",
            Field::LinkPainel => "LINK_PAINEL",
            Field::LinkPainelText => "LINK_PAINEL_TEXT",
            Field::DataEmissao => "DATA_EMISSAO",
            Field::DataInicio => "DATA_INICIO",
            Field::DataEntrega => "DATA_ENTREGA",
            Field::Dominio => "DOMINIO",
            Field::Demanda => "DEMANDA",
            Field::Responsavel => "RESPONSAVEL",
        }
    }

    /// Looks a field up by its placeholder name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Link URL and display-text fields never take part in plain text substitution.
    pub fn is_link(self) -> bool {
        matches!(
            self,
            Field::LinkDrive | Field::LinkDriveText | Field::LinkPainel | Field::LinkPainelText
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder values for a single report, one entry per [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    values: [String; Field::COUNT],
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapping {
    /// Creates a mapping where every field is unset.
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| String::new()),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn is_set(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    /// Value for a placeholder name, or `None` when the name is outside the schema.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        Field::from_name(name).map(|field| self.get(field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }
}

impl serde::Serialize for FieldMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(Field::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}
