//! Despesas operacionais da clínica

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use common_db::models::{CategoriaDespesa, Despesa, StatusDespesa};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::{normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/:id", get(obter).put(atualizar).delete(remover))
        .route("/:id/status", patch(atualizar_status))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    categoria: Option<CategoriaDespesa>,
    status: Option<StatusDespesa>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct DespesaCreate {
    descricao: String,
    categoria: CategoriaDespesa,
    valor_centavos: i64,
    data_vencimento: Option<NaiveDate>,
    #[serde(default = "status_padrao")]
    status: StatusDespesa,
    fornecedor: Option<String>,
    observacoes: Option<String>,
}

fn status_padrao() -> StatusDespesa {
    StatusDespesa::Pendente
}

#[derive(Debug, Deserialize)]
struct DespesaUpdate {
    descricao: Option<String>,
    categoria: Option<CategoriaDespesa>,
    valor_centavos: Option<i64>,
    data_vencimento: Option<NaiveDate>,
    status: Option<StatusDespesa>,
    fornecedor: Option<String>,
    observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: StatusDespesa,
}

async fn buscar_despesa(pool: &SqlitePool, id: Uuid) -> Result<Despesa, ApiError> {
    let despesa: Option<Despesa> = sqlx::query_as("SELECT * FROM despesas WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    despesa.ok_or_else(|| ApiError::nao_encontrado("Despesa não encontrada"))
}

/// Listar despesas com filtros e paginação
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<Despesa>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM despesas WHERE 1=1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM despesas WHERE 1=1");

    for builder in [&mut count_qb, &mut qb] {
        if let Some(categoria) = params.categoria {
            builder.push(" AND categoria = ").push_bind(categoria);
        }
        if let Some(status) = params.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(data_inicio) = params.data_inicio {
            builder.push(" AND data_vencimento >= ").push_bind(data_inicio);
        }
        if let Some(data_fim) = params.data_fim {
            builder.push(" AND data_vencimento <= ").push_bind(data_fim);
        }
    }

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let items: Vec<Despesa> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Registrar nova despesa
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<DespesaCreate>,
) -> Result<(StatusCode, Json<Despesa>), ApiError> {
    if payload.descricao.trim().is_empty() {
        return Err(ApiError::validacao("Descrição é obrigatória"));
    }
    if payload.valor_centavos <= 0 {
        return Err(ApiError::validacao("Valor deve ser maior que zero"));
    }

    let despesa = Despesa {
        id: Uuid::new_v4(),
        descricao: payload.descricao,
        categoria: payload.categoria,
        valor_centavos: payload.valor_centavos,
        data_vencimento: payload.data_vencimento,
        data_pagamento: None,
        status: payload.status,
        observacoes: payload.observacoes,
        fornecedor: payload.fornecedor,
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO despesas
            (id, descricao, categoria, valor_centavos, data_vencimento, data_pagamento,
             status, observacoes, fornecedor, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(despesa.id)
    .bind(&despesa.descricao)
    .bind(despesa.categoria)
    .bind(despesa.valor_centavos)
    .bind(despesa.data_vencimento)
    .bind(despesa.data_pagamento)
    .bind(despesa.status)
    .bind(&despesa.observacoes)
    .bind(&despesa.fornecedor)
    .bind(despesa.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(despesa)))
}

/// Obter detalhes de uma despesa
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Despesa>, ApiError> {
    Ok(Json(buscar_despesa(&state.pool, id).await?))
}

/// Atualizar despesa
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<DespesaUpdate>,
) -> Result<Json<Despesa>, ApiError> {
    let mut despesa = buscar_despesa(&state.pool, id).await?;

    if let Some(v) = payload.descricao {
        if v.trim().is_empty() {
            return Err(ApiError::validacao("Descrição é obrigatória"));
        }
        despesa.descricao = v;
    }
    if let Some(v) = payload.categoria {
        despesa.categoria = v;
    }
    if let Some(v) = payload.valor_centavos {
        if v <= 0 {
            return Err(ApiError::validacao("Valor deve ser maior que zero"));
        }
        despesa.valor_centavos = v;
    }
    if let Some(v) = payload.data_vencimento {
        despesa.data_vencimento = Some(v);
    }
    if let Some(v) = payload.status {
        if v == StatusDespesa::Pago && despesa.data_pagamento.is_none() {
            despesa.data_pagamento = Some(Utc::now());
        }
        despesa.status = v;
    }
    if let Some(v) = payload.fornecedor {
        despesa.fornecedor = Some(v);
    }
    if let Some(v) = payload.observacoes {
        despesa.observacoes = Some(v);
    }
    despesa.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE despesas SET
            descricao = ?, categoria = ?, valor_centavos = ?, data_vencimento = ?,
            data_pagamento = ?, status = ?, observacoes = ?, fornecedor = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&despesa.descricao)
    .bind(despesa.categoria)
    .bind(despesa.valor_centavos)
    .bind(despesa.data_vencimento)
    .bind(despesa.data_pagamento)
    .bind(despesa.status)
    .bind(&despesa.observacoes)
    .bind(&despesa.fornecedor)
    .bind(despesa.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(despesa))
}

/// Excluir despesa
async fn remover(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let resultado = sqlx::query("DELETE FROM despesas WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::nao_encontrado("Despesa não encontrada"));
    }

    Ok(Json(json!({ "message": "Despesa excluída com sucesso" })))
}

/// Atualizar apenas o status da despesa; quitar registra a data de pagamento
async fn atualizar_status(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<Despesa>, ApiError> {
    let mut despesa = buscar_despesa(&state.pool, id).await?;

    despesa.status = payload.status;
    if payload.status == StatusDespesa::Pago {
        despesa.data_pagamento = Some(Utc::now());
    }
    despesa.updated_at = Some(Utc::now());

    sqlx::query("UPDATE despesas SET status = ?, data_pagamento = ?, updated_at = ? WHERE id = ?")
        .bind(despesa.status)
        .bind(despesa.data_pagamento)
        .bind(despesa.updated_at)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(despesa))
}
