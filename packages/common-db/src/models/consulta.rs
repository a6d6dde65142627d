use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipos de consulta oferecidos pela clínica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TipoConsulta {
    PrimeiraConsulta,
    Retorno,
    Exame,
}

impl std::fmt::Display for TipoConsulta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipoConsulta::PrimeiraConsulta => write!(f, "primeira_consulta"),
            TipoConsulta::Retorno => write!(f, "retorno"),
            TipoConsulta::Exame => write!(f, "exame"),
        }
    }
}

/// Status possíveis de uma consulta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatusConsulta {
    /// Agendamento inicial, pendente de confirmação
    Agendada,
    /// Confirmada pelo paciente
    Confirmada,
    /// Consulta concluída
    Realizada,
    /// Cancelada
    Cancelada,
}

impl StatusConsulta {
    /// Status que ocupam a agenda do médico para fins de conflito de horário
    pub fn ocupa_agenda(&self) -> bool {
        matches!(self, StatusConsulta::Agendada | StatusConsulta::Confirmada)
    }
}

impl std::fmt::Display for StatusConsulta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusConsulta::Agendada => write!(f, "agendada"),
            StatusConsulta::Confirmada => write!(f, "confirmada"),
            StatusConsulta::Realizada => write!(f, "realizada"),
            StatusConsulta::Cancelada => write!(f, "cancelada"),
        }
    }
}

/// Consulta agendada entre paciente e médico
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Consulta {
    pub id: Uuid,
    pub paciente_id: Uuid,
    pub medico_id: Uuid,
    pub data_hora: DateTime<Utc>,
    pub duracao_minutos: i64,
    pub tipo: TipoConsulta,
    pub status: StatusConsulta,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Consulta {
    /// Fim do intervalo ocupado pela consulta (intervalo semiaberto)
    pub fn data_hora_fim(&self) -> DateTime<Utc> {
        self.data_hora + Duration::minutes(self.duracao_minutos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ocupa_agenda() {
        assert!(StatusConsulta::Agendada.ocupa_agenda());
        assert!(StatusConsulta::Confirmada.ocupa_agenda());
        assert!(!StatusConsulta::Realizada.ocupa_agenda());
        assert!(!StatusConsulta::Cancelada.ocupa_agenda());
    }

    #[test]
    fn test_tipo_serde() {
        let json = serde_json::to_string(&TipoConsulta::PrimeiraConsulta).unwrap();
        assert_eq!(json, "\"primeira_consulta\"");
    }
}
