//! Módulo financeiro: pagamentos, relatórios e inadimplência
//!
//! Valores sempre em centavos; as agregações são feitas no SQLite com
//! GROUP BY e completadas com zeros no lado Rust

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use common_db::models::{MetodoPagamento, Pagamento, StatusPagamento};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::pacientes::buscar_paciente_ativo;
use crate::routes::{fim_do_dia, inicio_do_dia, normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pagamentos", get(listar).post(criar))
        .route("/pagamentos/:id", get(obter).put(atualizar).delete(remover))
        .route("/pagamentos/:id/pagar", post(marcar_como_pago))
        .route("/relatorio", get(relatorio))
        .route("/inadimplencia", get(inadimplencia))
        .route("/grafico", get(grafico))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    paciente_id: Option<Uuid>,
    status: Option<StatusPagamento>,
    metodo: Option<MetodoPagamento>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PagamentoCreate {
    paciente_id: Uuid,
    medico_id: Option<Uuid>,
    consulta_id: Option<Uuid>,
    valor_centavos: i64,
    metodo: MetodoPagamento,
    #[serde(default = "status_padrao")]
    status: StatusPagamento,
    data_vencimento: Option<NaiveDate>,
    observacoes: Option<String>,
}

fn status_padrao() -> StatusPagamento {
    StatusPagamento::Pendente
}

#[derive(Debug, Deserialize)]
struct PagamentoUpdate {
    valor_centavos: Option<i64>,
    metodo: Option<MetodoPagamento>,
    status: Option<StatusPagamento>,
    data_vencimento: Option<NaiveDate>,
    observacoes: Option<String>,
}

/// Linha resumida de pagamento com nomes resolvidos
#[derive(Debug, Serialize, sqlx::FromRow)]
struct PagamentoResumo {
    id: Uuid,
    paciente_id: Uuid,
    medico_id: Option<Uuid>,
    valor_centavos: i64,
    metodo: MetodoPagamento,
    status: StatusPagamento,
    data_vencimento: Option<NaiveDate>,
    data_pagamento: Option<DateTime<Utc>>,
    paciente_nome: String,
    medico_nome: Option<String>,
    consulta_data: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct RelatorioFinanceiro {
    periodo_inicio: NaiveDate,
    periodo_fim: NaiveDate,
    total_recebido_centavos: i64,
    total_pendente_centavos: i64,
    total_cancelado_centavos: i64,
    total_geral_centavos: i64,
    quantidade_pagamentos: i64,
    pagamentos_por_metodo: BTreeMap<String, i64>,
    pagamentos_por_status: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
struct Inadimplencia {
    paciente_id: Uuid,
    paciente_nome: String,
    total_devendo_centavos: i64,
    quantidade_pendente: i64,
    ultimo_vencimento: NaiveDate,
    dias_atraso: i64,
}

#[derive(Debug, Serialize)]
struct InadimplenciaList {
    items: Vec<Inadimplencia>,
    total_centavos: i64,
    quantidade_pacientes: usize,
}

#[derive(Debug, Serialize)]
struct PontoGrafico {
    data: NaiveDate,
    recebido_centavos: i64,
    pendente_centavos: i64,
    total_centavos: i64,
}

async fn buscar_pagamento(pool: &SqlitePool, id: Uuid) -> Result<Pagamento, ApiError> {
    let pagamento: Option<Pagamento> = sqlx::query_as("SELECT * FROM pagamentos WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    pagamento.ok_or_else(|| ApiError::nao_encontrado("Pagamento não encontrado"))
}

/// Listar pagamentos com filtros e paginação
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<PagamentoResumo>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM pagamentos pg WHERE 1=1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT pg.id, pg.paciente_id, pg.medico_id, pg.valor_centavos, pg.metodo,
               pg.status, pg.data_vencimento, pg.data_pagamento,
               p.nome AS paciente_nome, u.nome AS medico_nome,
               c.data_hora AS consulta_data
        FROM pagamentos pg
        JOIN pacientes p ON p.id = pg.paciente_id
        LEFT JOIN users u ON u.id = pg.medico_id
        LEFT JOIN consultas c ON c.id = pg.consulta_id
        WHERE 1=1
        "#,
    );

    for builder in [&mut count_qb, &mut qb] {
        if let Some(paciente_id) = params.paciente_id {
            builder.push(" AND pg.paciente_id = ").push_bind(paciente_id);
        }
        if let Some(status) = params.status {
            builder.push(" AND pg.status = ").push_bind(status);
        }
        if let Some(metodo) = params.metodo {
            builder.push(" AND pg.metodo = ").push_bind(metodo);
        }
        if let Some(data_inicio) = params.data_inicio {
            builder.push(" AND pg.created_at >= ").push_bind(inicio_do_dia(data_inicio));
        }
        if let Some(data_fim) = params.data_fim {
            builder.push(" AND pg.created_at <= ").push_bind(fim_do_dia(data_fim));
        }
    }

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    qb.push(" ORDER BY pg.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let items: Vec<PagamentoResumo> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Registrar novo pagamento
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<PagamentoCreate>,
) -> Result<(StatusCode, Json<Pagamento>), ApiError> {
    if payload.valor_centavos <= 0 {
        return Err(ApiError::validacao("Valor deve ser maior que zero"));
    }

    buscar_paciente_ativo(&state.pool, payload.paciente_id).await?;

    if let Some(consulta_id) = payload.consulta_id {
        let consulta: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM consultas WHERE id = ?")
            .bind(consulta_id)
            .fetch_optional(&state.pool)
            .await?;
        if consulta.is_none() {
            return Err(ApiError::nao_encontrado("Consulta não encontrada"));
        }
    }

    let pagamento = Pagamento {
        id: Uuid::new_v4(),
        paciente_id: payload.paciente_id,
        medico_id: payload.medico_id,
        consulta_id: payload.consulta_id,
        valor_centavos: payload.valor_centavos,
        metodo: payload.metodo,
        status: payload.status,
        data_vencimento: payload.data_vencimento,
        data_pagamento: None,
        observacoes: payload.observacoes,
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO pagamentos
            (id, paciente_id, medico_id, consulta_id, valor_centavos, metodo, status,
             data_vencimento, data_pagamento, observacoes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pagamento.id)
    .bind(pagamento.paciente_id)
    .bind(pagamento.medico_id)
    .bind(pagamento.consulta_id)
    .bind(pagamento.valor_centavos)
    .bind(pagamento.metodo)
    .bind(pagamento.status)
    .bind(pagamento.data_vencimento)
    .bind(pagamento.data_pagamento)
    .bind(&pagamento.observacoes)
    .bind(pagamento.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(pagamento)))
}

/// Obter detalhes de um pagamento
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Pagamento>, ApiError> {
    Ok(Json(buscar_pagamento(&state.pool, id).await?))
}

/// Atualizar pagamento
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagamentoUpdate>,
) -> Result<Json<Pagamento>, ApiError> {
    let mut pagamento = buscar_pagamento(&state.pool, id).await?;

    if let Some(v) = payload.valor_centavos {
        if v <= 0 {
            return Err(ApiError::validacao("Valor deve ser maior que zero"));
        }
        pagamento.valor_centavos = v;
    }
    if let Some(v) = payload.metodo {
        pagamento.metodo = v;
    }
    if let Some(v) = payload.status {
        // Ao quitar, registra a data de pagamento se ainda não houver
        if v == StatusPagamento::Pago && pagamento.data_pagamento.is_none() {
            pagamento.data_pagamento = Some(Utc::now());
        }
        pagamento.status = v;
    }
    if let Some(v) = payload.data_vencimento {
        pagamento.data_vencimento = Some(v);
    }
    if let Some(v) = payload.observacoes {
        pagamento.observacoes = Some(v);
    }
    pagamento.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE pagamentos SET
            valor_centavos = ?, metodo = ?, status = ?, data_vencimento = ?,
            data_pagamento = ?, observacoes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(pagamento.valor_centavos)
    .bind(pagamento.metodo)
    .bind(pagamento.status)
    .bind(pagamento.data_vencimento)
    .bind(pagamento.data_pagamento)
    .bind(&pagamento.observacoes)
    .bind(pagamento.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(pagamento))
}

/// Excluir pagamento
async fn remover(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let resultado = sqlx::query("DELETE FROM pagamentos WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::nao_encontrado("Pagamento não encontrado"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Marcar pagamento como pago
async fn marcar_como_pago(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Pagamento>, ApiError> {
    let mut pagamento = buscar_pagamento(&state.pool, id).await?;

    pagamento.status = StatusPagamento::Pago;
    pagamento.data_pagamento = Some(Utc::now());
    pagamento.updated_at = Some(Utc::now());

    sqlx::query("UPDATE pagamentos SET status = ?, data_pagamento = ?, updated_at = ? WHERE id = ?")
        .bind(pagamento.status)
        .bind(pagamento.data_pagamento)
        .bind(pagamento.updated_at)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(pagamento))
}

#[derive(Debug, Deserialize)]
struct RelatorioParams {
    data_inicio: NaiveDate,
    data_fim: NaiveDate,
}

/// Obter relatório financeiro do período
async fn relatorio(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<RelatorioParams>,
) -> Result<Json<RelatorioFinanceiro>, ApiError> {
    let inicio = inicio_do_dia(params.data_inicio);
    let fim = fim_do_dia(params.data_fim);

    let por_status: Vec<(StatusPagamento, i64)> = sqlx::query_as(
        r#"
        SELECT status, COALESCE(SUM(valor_centavos), 0)
        FROM pagamentos
        WHERE created_at >= ? AND created_at <= ?
        GROUP BY status
        "#,
    )
    .bind(inicio)
    .bind(fim)
    .fetch_all(&state.pool)
    .await?;

    let por_metodo: Vec<(MetodoPagamento, i64)> = sqlx::query_as(
        r#"
        SELECT metodo, COALESCE(SUM(valor_centavos), 0)
        FROM pagamentos
        WHERE created_at >= ? AND created_at <= ?
        GROUP BY metodo
        "#,
    )
    .bind(inicio)
    .bind(fim)
    .fetch_all(&state.pool)
    .await?;

    let quantidade_pagamentos: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pagamentos WHERE created_at >= ? AND created_at <= ?")
            .bind(inicio)
            .bind(fim)
            .fetch_one(&state.pool)
            .await?;

    let total_por = |status: StatusPagamento| -> i64 {
        por_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, total)| *total)
            .unwrap_or(0)
    };

    let total_recebido = total_por(StatusPagamento::Pago);
    let total_pendente = total_por(StatusPagamento::Pendente);
    let total_cancelado = total_por(StatusPagamento::Cancelado);

    // Todos os métodos/status aparecem no relatório, mesmo zerados
    let mut pagamentos_por_metodo = BTreeMap::new();
    for metodo in MetodoPagamento::TODOS {
        let total = por_metodo
            .iter()
            .find(|(m, _)| *m == metodo)
            .map(|(_, total)| *total)
            .unwrap_or(0);
        pagamentos_por_metodo.insert(metodo.to_string(), total);
    }

    let mut pagamentos_por_status = BTreeMap::new();
    for status in StatusPagamento::TODOS {
        pagamentos_por_status.insert(status.to_string(), total_por(status));
    }

    Ok(Json(RelatorioFinanceiro {
        periodo_inicio: params.data_inicio,
        periodo_fim: params.data_fim,
        total_recebido_centavos: total_recebido,
        total_pendente_centavos: total_pendente,
        total_cancelado_centavos: total_cancelado,
        total_geral_centavos: total_recebido + total_pendente + total_cancelado,
        quantidade_pagamentos,
        pagamentos_por_metodo,
        pagamentos_por_status,
    }))
}

#[derive(Debug, Deserialize)]
struct InadimplenciaParams {
    dias_atraso_minimo: Option<i64>,
}

/// Obter lista de inadimplência agrupada por paciente
async fn inadimplencia(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<InadimplenciaParams>,
) -> Result<Json<InadimplenciaList>, ApiError> {
    let dias_minimo = params.dias_atraso_minimo.unwrap_or(1).max(0);
    let hoje = Utc::now().date_naive();
    let data_limite = hoje - Duration::days(dias_minimo);

    let linhas: Vec<(Uuid, String, i64, i64, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT pg.paciente_id, p.nome, SUM(pg.valor_centavos), COUNT(*),
               MAX(pg.data_vencimento)
        FROM pagamentos pg
        JOIN pacientes p ON p.id = pg.paciente_id
        WHERE pg.status = 'pendente'
          AND pg.data_vencimento IS NOT NULL
          AND pg.data_vencimento < ?
        GROUP BY pg.paciente_id, p.nome
        ORDER BY SUM(pg.valor_centavos) DESC
        "#,
    )
    .bind(data_limite)
    .fetch_all(&state.pool)
    .await?;

    let mut total_centavos = 0;
    let items: Vec<Inadimplencia> = linhas
        .into_iter()
        .map(|(paciente_id, paciente_nome, devendo, quantidade, ultimo_vencimento)| {
            total_centavos += devendo;
            Inadimplencia {
                paciente_id,
                paciente_nome,
                total_devendo_centavos: devendo,
                quantidade_pendente: quantidade,
                ultimo_vencimento,
                dias_atraso: (hoje - ultimo_vencimento).num_days(),
            }
        })
        .collect();

    let quantidade_pacientes = items.len();

    Ok(Json(InadimplenciaList { items, total_centavos, quantidade_pacientes }))
}

#[derive(Debug, Deserialize)]
struct GraficoParams {
    dias: Option<i64>,
}

/// Obter série diária de recebido/pendente para o gráfico financeiro
async fn grafico(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<GraficoParams>,
) -> Result<Json<Vec<PontoGrafico>>, ApiError> {
    let dias = params.dias.unwrap_or(30).clamp(7, 365);
    let hoje = Utc::now().date_naive();
    let data_inicio = hoje - Duration::days(dias);

    let linhas: Vec<(String, StatusPagamento, i64)> = sqlx::query_as(
        r#"
        SELECT date(created_at), status, COALESCE(SUM(valor_centavos), 0)
        FROM pagamentos
        WHERE created_at >= ? AND status IN ('pago', 'pendente')
        GROUP BY date(created_at), status
        "#,
    )
    .bind(inicio_do_dia(data_inicio))
    .fetch_all(&state.pool)
    .await?;

    let mut por_dia: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for (dia, status, total) in linhas {
        let Ok(dia) = dia.parse::<NaiveDate>() else {
            continue;
        };
        let entrada = por_dia.entry(dia).or_default();
        match status {
            StatusPagamento::Pago => entrada.0 = total,
            StatusPagamento::Pendente => entrada.1 = total,
            StatusPagamento::Cancelado => {}
        }
    }

    let serie = (0..dias)
        .map(|i| {
            let data = data_inicio + Duration::days(i);
            let (recebido, pendente) = por_dia.get(&data).copied().unwrap_or((0, 0));
            PontoGrafico {
                data,
                recebido_centavos: recebido,
                pendente_centavos: pendente,
                total_centavos: recebido + pendente,
            }
        })
        .collect();

    Ok(Json(serie))
}
