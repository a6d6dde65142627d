//! Lógica pura de agenda: conflito de horários e geração de slots
//!
//! As consultas ocupam intervalos semiabertos `[inicio, fim)`. Toda a
//! aritmética de intervalos fica aqui, fora dos handlers, para ser testável
//! sem banco de dados

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use common_db::models::{Consulta, HorarioDisponivel};
use serde::Serialize;
use uuid::Uuid;

/// Duração padrão de um slot de agendamento, em minutos
pub const PASSO_SLOT_MINUTOS: i64 = 60;

/// Dois intervalos semiabertos `[a_inicio, a_fim)` e `[b_inicio, b_fim)` se sobrepõem?
pub fn intervalos_sobrepoem(
    a_inicio: DateTime<Utc>,
    a_fim: DateTime<Utc>,
    b_inicio: DateTime<Utc>,
    b_fim: DateTime<Utc>,
) -> bool {
    a_inicio < b_fim && b_inicio < a_fim
}

/// Verifica se o intervalo proposto conflita com alguma consulta existente
///
/// Só consultas agendadas ou confirmadas ocupam a agenda; `excluir` permite
/// ignorar a própria consulta durante um reagendamento
pub fn existe_conflito(
    inicio: DateTime<Utc>,
    fim: DateTime<Utc>,
    existentes: &[Consulta],
    excluir: Option<Uuid>,
) -> bool {
    existentes
        .iter()
        .filter(|c| Some(c.id) != excluir)
        .filter(|c| c.status.ocupa_agenda())
        .any(|c| intervalos_sobrepoem(inicio, fim, c.data_hora, c.data_hora_fim()))
}

/// Slot de agendamento em um dia específico
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub data: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fim: NaiveTime,
    pub disponivel: bool,
}

/// Gera os slots de um dia a partir das janelas semanais do médico
///
/// As janelas já devem estar filtradas pelo dia da semana. Um slot fica
/// indisponível quando seu início cai dentro do intervalo de uma consulta
/// ocupada
pub fn gerar_slots(
    data: NaiveDate,
    janelas: &[HorarioDisponivel],
    ocupadas: &[Consulta],
) -> Vec<Slot> {
    let passo = Duration::minutes(PASSO_SLOT_MINUTOS);
    let mut slots = Vec::new();

    for janela in janelas.iter().filter(|j| j.ativo) {
        let mut hora = janela.hora_inicio;
        while hora < janela.hora_fim {
            let inicio_dt = Utc.from_utc_datetime(&data.and_time(hora));
            let conflito = ocupadas
                .iter()
                .filter(|c| c.status.ocupa_agenda())
                .any(|c| inicio_dt >= c.data_hora && inicio_dt < c.data_hora_fim());

            let fim_naive = data.and_time(hora) + passo;
            slots.push(Slot {
                data,
                hora_inicio: hora,
                hora_fim: fim_naive.time(),
                disponivel: !conflito,
            });

            hora = fim_naive.time();
            // Janela termina à meia-noite: evita laço infinito no wrap do relógio
            if hora == NaiveTime::from_hms_opt(0, 0, 0).unwrap() {
                break;
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_db::models::{DiaSemana, StatusConsulta, TipoConsulta};

    fn dt(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn consulta(inicio: DateTime<Utc>, duracao: i64, status: StatusConsulta) -> Consulta {
        Consulta {
            id: Uuid::new_v4(),
            paciente_id: Uuid::new_v4(),
            medico_id: Uuid::new_v4(),
            data_hora: inicio,
            duracao_minutos: duracao,
            tipo: TipoConsulta::Retorno,
            status,
            observacoes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_sobreposicao_parcial() {
        assert!(intervalos_sobrepoem(dt(10, 0), dt(11, 0), dt(10, 30), dt(11, 30)));
        assert!(intervalos_sobrepoem(dt(10, 30), dt(11, 30), dt(10, 0), dt(11, 0)));
    }

    #[test]
    fn test_intervalos_adjacentes_nao_conflitam() {
        // Intervalos semiabertos: consulta terminando às 11h não conflita
        // com outra começando às 11h
        assert!(!intervalos_sobrepoem(dt(10, 0), dt(11, 0), dt(11, 0), dt(12, 0)));
    }

    #[test]
    fn test_intervalo_contido() {
        assert!(intervalos_sobrepoem(dt(9, 0), dt(12, 0), dt(10, 0), dt(11, 0)));
    }

    #[test]
    fn test_conflito_ignora_canceladas() {
        let existentes = vec![
            consulta(dt(10, 0), 60, StatusConsulta::Cancelada),
            consulta(dt(10, 0), 60, StatusConsulta::Realizada),
        ];
        assert!(!existe_conflito(dt(10, 0), dt(11, 0), &existentes, None));
    }

    #[test]
    fn test_conflito_com_agendada() {
        let existentes = vec![consulta(dt(10, 0), 60, StatusConsulta::Agendada)];
        assert!(existe_conflito(dt(10, 30), dt(11, 30), &existentes, None));
    }

    #[test]
    fn test_reagendamento_ignora_a_propria_consulta() {
        let c = consulta(dt(10, 0), 60, StatusConsulta::Confirmada);
        let id = c.id;
        let existentes = vec![c];
        assert!(!existe_conflito(dt(10, 0), dt(11, 0), &existentes, Some(id)));
    }

    #[test]
    fn test_geracao_de_slots() {
        let data = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let janela = HorarioDisponivel {
            id: Uuid::new_v4(),
            medico_id: Uuid::new_v4(),
            dia_semana: DiaSemana::Segunda,
            hora_inicio: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            hora_fim: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ativo: true,
        };
        let ocupadas = vec![consulta(dt(9, 0), 60, StatusConsulta::Confirmada)];

        let slots = gerar_slots(data, &[janela], &ocupadas);

        assert_eq!(slots.len(), 4);
        assert!(slots[0].disponivel); // 08:00
        assert!(!slots[1].disponivel); // 09:00 ocupado
        assert!(slots[2].disponivel); // 10:00
        assert!(slots[3].disponivel); // 11:00
    }

    #[test]
    fn test_janela_inativa_nao_gera_slots() {
        let data = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let janela = HorarioDisponivel {
            id: Uuid::new_v4(),
            medico_id: Uuid::new_v4(),
            dia_semana: DiaSemana::Segunda,
            hora_inicio: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            hora_fim: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ativo: false,
        };
        assert!(gerar_slots(data, &[janela], &[]).is_empty());
    }
}
