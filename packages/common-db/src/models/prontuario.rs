use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prontuário médico de um atendimento
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prontuario {
    pub id: Uuid,
    pub paciente_id: Uuid,
    /// Consulta de origem, quando o registro nasce de um atendimento agendado
    pub consulta_id: Option<Uuid>,
    pub medico_id: Uuid,
    pub data: DateTime<Utc>,
    pub anamnese: Option<String>,
    pub diagnostico: Option<String>,
    pub prescricao: Option<String>,
    pub exames_solicitados: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
