use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paciente da clínica
///
/// A exclusão é sempre lógica: o registro permanece com `ativo = false`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Paciente {
    pub id: Uuid,
    pub nome: String,
    /// CPF, único por paciente
    pub cpf: String,
    pub data_nascimento: NaiveDate,
    pub telefone: Option<String>,
    /// Número usado pelo serviço de lembretes via WhatsApp
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
    pub convenio: Option<String>,
    pub numero_carteirinha: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
