use crate::{GenerationError, ObjectiveGenerator};
use docfill_types::{Field, FieldMapping};

/// Deterministic local heuristic. Never fails, so it doubles as the fallback provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn objective(&self, source_text: &str, context: &FieldMapping) -> String {
        let name = context.get(Field::NomeEmpresaCliente).trim();
        let activity = context.get(Field::AtividadePrincipal).trim();

        if !activity.is_empty() {
            return format!(
                "O objetivo da {} é atuar em {}, oferecendo soluções e serviços relacionados a essa atividade, com foco em qualidade e atendimento ao cliente.",
                name,
                activity.to_lowercase()
            );
        }

        let first_sentence = source_text.split('.').next().unwrap_or("").trim();
        if !first_sentence.is_empty() {
            return format!("O objetivo da {} é {}.", name, first_sentence);
        }

        format!(
            "O objetivo da {} é oferecer produtos/serviços no seu segmento de atuação.",
            name
        )
    }
}

impl ObjectiveGenerator for MockProvider {
    fn generate(
        &self,
        source_text: &str,
        context: &FieldMapping,
    ) -> Result<String, GenerationError> {
        Ok(self.objective(source_text, context))
    }
}
