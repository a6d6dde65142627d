use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dias da semana para os horários de atendimento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DiaSemana {
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
    Domingo,
}

impl DiaSemana {
    /// Converte o dia da semana do calendário para o enum de agenda
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DiaSemana::Segunda,
            Weekday::Tue => DiaSemana::Terca,
            Weekday::Wed => DiaSemana::Quarta,
            Weekday::Thu => DiaSemana::Quinta,
            Weekday::Fri => DiaSemana::Sexta,
            Weekday::Sat => DiaSemana::Sabado,
            Weekday::Sun => DiaSemana::Domingo,
        }
    }
}

impl std::fmt::Display for DiaSemana {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiaSemana::Segunda => "segunda",
            DiaSemana::Terca => "terca",
            DiaSemana::Quarta => "quarta",
            DiaSemana::Quinta => "quinta",
            DiaSemana::Sexta => "sexta",
            DiaSemana::Sabado => "sabado",
            DiaSemana::Domingo => "domingo",
        };
        write!(f, "{}", s)
    }
}

/// Janela semanal recorrente de atendimento de um médico
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HorarioDisponivel {
    pub id: Uuid,
    pub medico_id: Uuid,
    pub dia_semana: DiaSemana,
    pub hora_inicio: NaiveTime,
    pub hora_fim: NaiveTime,
    pub ativo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono::Datelike;

    #[test]
    fn test_from_weekday() {
        // 2025-06-02 é uma segunda-feira
        let data = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(DiaSemana::from_weekday(data.weekday()), DiaSemana::Segunda);

        let domingo = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        assert_eq!(DiaSemana::from_weekday(domingo.weekday()), DiaSemana::Domingo);
    }
}
