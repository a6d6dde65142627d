//! Agregações para o dashboard administrativo
//!
//! As séries diárias saem de um GROUP BY date() e são completadas com zeros
//! para cobrir todo o período pedido

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use common_db::models::StatusConsulta;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::{fim_do_dia, inicio_do_dia};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/estatisticas", get(estatisticas))
        .route("/metricas-rapidas", get(metricas_rapidas))
}

#[derive(Debug, Deserialize)]
struct EstatisticasParams {
    dias_grafico: Option<i64>,
}

#[derive(Debug, Serialize)]
struct EstatisticasGerais {
    total_pacientes: i64,
    total_medicos: i64,
    total_consultas_hoje: i64,
    total_consultas_mes: i64,
    consultas_pendentes: i64,
    consultas_realizadas_hoje: i64,
    faturamento_mes_centavos: i64,
    faturamento_hoje_centavos: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct ConsultaProxima {
    id: Uuid,
    data_hora: DateTime<Utc>,
    paciente_nome: String,
    medico_nome: String,
    tipo: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct PacienteRecente {
    id: Uuid,
    nome: String,
    data_cadastro: DateTime<Utc>,
    ultima_consulta: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct MedicoTop {
    id: Uuid,
    nome: String,
    especialidade: String,
    total_consultas: i64,
}

#[derive(Debug, Serialize)]
struct PontoConsultas {
    data: NaiveDate,
    total: i64,
    realizadas: i64,
    canceladas: i64,
}

#[derive(Debug, Serialize)]
struct PontoFaturamento {
    data: NaiveDate,
    valor_centavos: i64,
}

#[derive(Debug, Serialize)]
struct Dashboard {
    estatisticas: EstatisticasGerais,
    proximas_consultas: Vec<ConsultaProxima>,
    pacientes_recentes: Vec<PacienteRecente>,
    medicos_top: Vec<MedicoTop>,
    grafico_consultas: Vec<PontoConsultas>,
    grafico_faturamento: Vec<PontoFaturamento>,
}

async fn contar_consultas_no_dia(
    pool: &SqlitePool,
    dia: NaiveDate,
    status: Option<StatusConsulta>,
) -> Result<i64, ApiError> {
    let total = match status {
        Some(status) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM consultas WHERE data_hora >= ? AND data_hora <= ? AND status = ?",
            )
            .bind(inicio_do_dia(dia))
            .bind(fim_do_dia(dia))
            .bind(status)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM consultas WHERE data_hora >= ? AND data_hora <= ?",
            )
            .bind(inicio_do_dia(dia))
            .bind(fim_do_dia(dia))
            .fetch_one(pool)
            .await?
        }
    };
    Ok(total)
}

async fn faturamento_desde(
    pool: &SqlitePool,
    inicio: DateTime<Utc>,
    fim: Option<DateTime<Utc>>,
) -> Result<i64, ApiError> {
    let total: Option<i64> = match fim {
        Some(fim) => {
            sqlx::query_scalar(
                r#"
                SELECT SUM(valor_centavos) FROM pagamentos
                WHERE status = 'pago' AND data_pagamento >= ? AND data_pagamento <= ?
                "#,
            )
            .bind(inicio)
            .bind(fim)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar(
                "SELECT SUM(valor_centavos) FROM pagamentos WHERE status = 'pago' AND data_pagamento >= ?",
            )
            .bind(inicio)
            .fetch_one(pool)
            .await?
        }
    };
    Ok(total.unwrap_or(0))
}

/// Obter estatísticas gerais do dashboard
async fn estatisticas(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<EstatisticasParams>,
) -> Result<Json<Dashboard>, ApiError> {
    let dias_grafico = params.dias_grafico.unwrap_or(30).clamp(7, 365);
    let agora = Utc::now();
    let hoje = agora.date_naive();
    let inicio_mes = hoje.with_day(1).unwrap_or(hoje);
    let inicio_grafico = hoje - Duration::days(dias_grafico);

    let total_pacientes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pacientes")
        .fetch_one(&state.pool)
        .await?;
    let total_medicos: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'medico'")
            .fetch_one(&state.pool)
            .await?;

    let total_consultas_hoje = contar_consultas_no_dia(&state.pool, hoje, None).await?;
    let consultas_realizadas_hoje =
        contar_consultas_no_dia(&state.pool, hoje, Some(StatusConsulta::Realizada)).await?;

    let total_consultas_mes: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM consultas WHERE data_hora >= ?")
            .bind(inicio_do_dia(inicio_mes))
            .fetch_one(&state.pool)
            .await?;

    let consultas_pendentes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM consultas WHERE status IN ('agendada', 'confirmada')",
    )
    .fetch_one(&state.pool)
    .await?;

    let faturamento_hoje =
        faturamento_desde(&state.pool, inicio_do_dia(hoje), Some(fim_do_dia(hoje))).await?;
    let faturamento_mes = faturamento_desde(&state.pool, inicio_do_dia(inicio_mes), None).await?;

    let proximas_consultas: Vec<ConsultaProxima> = sqlx::query_as(
        r#"
        SELECT c.id, c.data_hora, p.nome AS paciente_nome, u.nome AS medico_nome, c.tipo
        FROM consultas c
        JOIN pacientes p ON p.id = c.paciente_id
        JOIN users u ON u.id = c.medico_id
        WHERE c.data_hora >= ? AND c.status IN ('agendada', 'confirmada')
        ORDER BY c.data_hora ASC
        LIMIT 5
        "#,
    )
    .bind(agora)
    .fetch_all(&state.pool)
    .await?;

    let pacientes_recentes: Vec<PacienteRecente> = sqlx::query_as(
        r#"
        SELECT p.id, p.nome, p.created_at AS data_cadastro,
               (SELECT MAX(c.data_hora) FROM consultas c WHERE c.paciente_id = p.id)
                   AS ultima_consulta
        FROM pacientes p
        ORDER BY p.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let medicos_top: Vec<MedicoTop> = sqlx::query_as(
        r#"
        SELECT u.id, u.nome, COALESCE(u.especialidade, 'Sem especialidade') AS especialidade,
               COUNT(c.id) AS total_consultas
        FROM users u
        JOIN consultas c ON c.medico_id = u.id
        WHERE u.role = 'medico' AND c.data_hora >= ?
        GROUP BY u.id, u.nome, u.especialidade
        ORDER BY COUNT(c.id) DESC
        LIMIT 5
        "#,
    )
    .bind(inicio_do_dia(inicio_grafico))
    .fetch_all(&state.pool)
    .await?;

    // Série diária de consultas
    let linhas_consultas: Vec<(String, StatusConsulta, i64)> = sqlx::query_as(
        r#"
        SELECT date(data_hora), status, COUNT(*)
        FROM consultas
        WHERE data_hora >= ?
        GROUP BY date(data_hora), status
        "#,
    )
    .bind(inicio_do_dia(inicio_grafico))
    .fetch_all(&state.pool)
    .await?;

    let mut consultas_por_dia: BTreeMap<NaiveDate, (i64, i64, i64)> = BTreeMap::new();
    for (dia, status, quantidade) in linhas_consultas {
        let Ok(dia) = dia.parse::<NaiveDate>() else {
            continue;
        };
        let entrada = consultas_por_dia.entry(dia).or_default();
        entrada.0 += quantidade;
        match status {
            StatusConsulta::Realizada => entrada.1 += quantidade,
            StatusConsulta::Cancelada => entrada.2 += quantidade,
            _ => {}
        }
    }

    // Série diária de faturamento (pagamentos quitados)
    let linhas_faturamento: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT date(data_pagamento), COALESCE(SUM(valor_centavos), 0)
        FROM pagamentos
        WHERE status = 'pago' AND data_pagamento >= ?
        GROUP BY date(data_pagamento)
        "#,
    )
    .bind(inicio_do_dia(inicio_grafico))
    .fetch_all(&state.pool)
    .await?;

    let faturamento_por_dia: BTreeMap<NaiveDate, i64> = linhas_faturamento
        .into_iter()
        .filter_map(|(dia, valor)| Some((dia.parse::<NaiveDate>().ok()?, valor)))
        .collect();

    let grafico_consultas = (0..dias_grafico)
        .map(|i| {
            let data = inicio_grafico + Duration::days(i);
            let (total, realizadas, canceladas) =
                consultas_por_dia.get(&data).copied().unwrap_or((0, 0, 0));
            PontoConsultas { data, total, realizadas, canceladas }
        })
        .collect();

    let grafico_faturamento = (0..dias_grafico)
        .map(|i| {
            let data = inicio_grafico + Duration::days(i);
            PontoFaturamento {
                data,
                valor_centavos: faturamento_por_dia.get(&data).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(Json(Dashboard {
        estatisticas: EstatisticasGerais {
            total_pacientes,
            total_medicos,
            total_consultas_hoje,
            total_consultas_mes,
            consultas_pendentes,
            consultas_realizadas_hoje,
            faturamento_mes_centavos: faturamento_mes,
            faturamento_hoje_centavos: faturamento_hoje,
        },
        proximas_consultas,
        pacientes_recentes,
        medicos_top,
        grafico_consultas,
        grafico_faturamento,
    }))
}

/// Métricas rápidas para widgets
async fn metricas_rapidas(
    State(state): State<AppState>,
    _user: UsuarioAtual,
) -> Result<Json<Value>, ApiError> {
    let hoje = Utc::now().date_naive();
    let inicio = inicio_do_dia(hoje);
    let fim = fim_do_dia(hoje);

    let consultas_hoje = contar_consultas_no_dia(&state.pool, hoje, None).await?;

    let pacientes_novos_hoje: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pacientes WHERE created_at >= ? AND created_at <= ?")
            .bind(inicio)
            .bind(fim)
            .fetch_one(&state.pool)
            .await?;

    let faturamento_hoje = faturamento_desde(&state.pool, inicio, Some(fim)).await?;

    let consultas_pendentes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM consultas WHERE status IN ('agendada', 'confirmada')",
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({
        "consultas_hoje": consultas_hoje,
        "pacientes_novos_hoje": pacientes_novos_hoje,
        "faturamento_hoje_centavos": faturamento_hoje,
        "consultas_pendentes": consultas_pendentes,
    })))
}
