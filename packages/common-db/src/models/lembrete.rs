use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status possíveis de um lembrete de WhatsApp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatusLembrete {
    /// Aguardando envio pelo worker de WhatsApp
    Pendente,
    Enviado,
    Falhou,
    Cancelado,
}

impl std::fmt::Display for StatusLembrete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLembrete::Pendente => write!(f, "pendente"),
            StatusLembrete::Enviado => write!(f, "enviado"),
            StatusLembrete::Falhou => write!(f, "falhou"),
            StatusLembrete::Cancelado => write!(f, "cancelado"),
        }
    }
}

/// Registro de lembrete enviado (ou a enviar) via WhatsApp
///
/// O envio em si é feito pelo serviço externo de WhatsApp; esta API apenas
/// mantém a fila e o histórico de tentativas
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LembreteWhatsApp {
    pub id: Uuid,
    pub paciente_id: Uuid,
    pub consulta_id: Uuid,
    pub mensagem: String,
    pub data_envio_programada: DateTime<Utc>,
    pub data_enviado: Option<DateTime<Utc>>,
    pub status: StatusLembrete,
    pub tentativas: i64,
    pub erro: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
