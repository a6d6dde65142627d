//! Fila de lembretes de WhatsApp
//!
//! O envio em si é responsabilidade do serviço externo de WhatsApp; aqui a
//! API enfileira, consulta e cancela registros

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use common_db::models::{Consulta, LembreteWhatsApp, Paciente, StatusLembrete};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::{normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar))
        .route("/:id", get(obter).delete(cancelar))
        .route("/:id/reenviar", post(reenviar))
        .route("/enviar/:consulta_id", post(enviar_manual))
        .route("/consulta/:consulta_id", get(listar_por_consulta))
        .route("/paciente/:paciente_id", get(listar_por_paciente))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    status: Option<StatusLembrete>,
}

async fn buscar_lembrete(pool: &SqlitePool, id: Uuid) -> Result<LembreteWhatsApp, ApiError> {
    let lembrete: Option<LembreteWhatsApp> =
        sqlx::query_as("SELECT * FROM lembretes_whatsapp WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    lembrete.ok_or_else(|| ApiError::nao_encontrado("Lembrete não encontrado"))
}

/// Listar lembretes, opcionalmente filtrados por status
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<LembreteWhatsApp>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);

    let (total, items): (i64, Vec<LembreteWhatsApp>) = match params.status {
        Some(status) => {
            let total =
                sqlx::query_scalar("SELECT COUNT(*) FROM lembretes_whatsapp WHERE status = ?")
                    .bind(status)
                    .fetch_one(&state.pool)
                    .await?;
            let items = sqlx::query_as(
                r#"
                SELECT * FROM lembretes_whatsapp WHERE status = ?
                ORDER BY data_envio_programada DESC LIMIT ? OFFSET ?
                "#,
            )
            .bind(status)
            .bind(limit)
            .bind(skip)
            .fetch_all(&state.pool)
            .await?;
            (total, items)
        }
        None => {
            let total = sqlx::query_scalar("SELECT COUNT(*) FROM lembretes_whatsapp")
                .fetch_one(&state.pool)
                .await?;
            let items = sqlx::query_as(
                r#"
                SELECT * FROM lembretes_whatsapp
                ORDER BY data_envio_programada DESC LIMIT ? OFFSET ?
                "#,
            )
            .bind(limit)
            .bind(skip)
            .fetch_all(&state.pool)
            .await?;
            (total, items)
        }
    };

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Obter detalhes de um lembrete
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<LembreteWhatsApp>, ApiError> {
    Ok(Json(buscar_lembrete(&state.pool, id).await?))
}

/// Enfileirar manualmente um lembrete para uma consulta
async fn enviar_manual(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(consulta_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let consulta: Option<Consulta> = sqlx::query_as("SELECT * FROM consultas WHERE id = ?")
        .bind(consulta_id)
        .fetch_optional(&state.pool)
        .await?;
    let consulta = consulta.ok_or_else(|| ApiError::nao_encontrado("Consulta não encontrada"))?;

    let paciente: Option<Paciente> = sqlx::query_as("SELECT * FROM pacientes WHERE id = ?")
        .bind(consulta.paciente_id)
        .fetch_optional(&state.pool)
        .await?;
    let paciente = paciente.ok_or_else(|| ApiError::nao_encontrado("Paciente não encontrado"))?;

    let whatsapp = paciente
        .whatsapp
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| ApiError::validacao("Paciente não possui WhatsApp cadastrado"))?
        .to_string();

    // Evita duplicar lembretes da mesma consulta dentro de 24h
    let recente: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM lembretes_whatsapp
        WHERE consulta_id = ? AND status IN ('enviado', 'pendente')
          AND data_envio_programada >= ?
        "#,
    )
    .bind(consulta_id)
    .bind(Utc::now() - Duration::hours(24))
    .fetch_optional(&state.pool)
    .await?;

    if recente.is_some() {
        return Err(ApiError::validacao(
            "Já existe um lembrete enviado recentemente para esta consulta",
        ));
    }

    let mensagem = format!(
        "Olá {nome}! Lembramos que você tem uma consulta agendada para {data}. Por favor, confirme sua presença.",
        nome = paciente.nome,
        data = consulta.data_hora.format("%d/%m/%Y às %H:%M"),
    );

    let lembrete = LembreteWhatsApp {
        id: Uuid::new_v4(),
        paciente_id: consulta.paciente_id,
        consulta_id,
        mensagem,
        data_envio_programada: Utc::now(),
        data_enviado: None,
        status: StatusLembrete::Pendente,
        tentativas: 0,
        erro: None,
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO lembretes_whatsapp
            (id, paciente_id, consulta_id, mensagem, data_envio_programada,
             data_enviado, status, tentativas, erro, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(lembrete.id)
    .bind(lembrete.paciente_id)
    .bind(lembrete.consulta_id)
    .bind(&lembrete.mensagem)
    .bind(lembrete.data_envio_programada)
    .bind(lembrete.data_enviado)
    .bind(lembrete.status)
    .bind(lembrete.tentativas)
    .bind(&lembrete.erro)
    .bind(lembrete.created_at)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({
        "message": "Lembrete será enviado em breve",
        "lembrete_id": lembrete.id,
        "consulta_id": consulta_id,
        "paciente": paciente.nome,
        "whatsapp": whatsapp,
    })))
}

/// Reenfileirar um lembrete que falhou
async fn reenviar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let lembrete = buscar_lembrete(&state.pool, id).await?;

    if lembrete.status != StatusLembrete::Falhou {
        return Err(ApiError::validacao(format!(
            "Apenas lembretes com status 'falhou' podem ser reenviados. Status atual: {}",
            lembrete.status
        )));
    }

    let tentativas = lembrete.tentativas + 1;

    sqlx::query(
        "UPDATE lembretes_whatsapp SET status = 'pendente', tentativas = ?, updated_at = ? WHERE id = ?",
    )
    .bind(tentativas)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({
        "message": "Lembrete será reenviado em breve",
        "lembrete_id": id,
        "tentativas": tentativas,
    })))
}

/// Listar lembretes de uma consulta
async fn listar_por_consulta(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(consulta_id): Path<Uuid>,
) -> Result<Json<Vec<LembreteWhatsApp>>, ApiError> {
    let lembretes: Vec<LembreteWhatsApp> = sqlx::query_as(
        "SELECT * FROM lembretes_whatsapp WHERE consulta_id = ? ORDER BY data_envio_programada DESC",
    )
    .bind(consulta_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(lembretes))
}

/// Listar lembretes de um paciente
async fn listar_por_paciente(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(paciente_id): Path<Uuid>,
) -> Result<Json<Vec<LembreteWhatsApp>>, ApiError> {
    let lembretes: Vec<LembreteWhatsApp> = sqlx::query_as(
        "SELECT * FROM lembretes_whatsapp WHERE paciente_id = ? ORDER BY data_envio_programada DESC",
    )
    .bind(paciente_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(lembretes))
}

/// Cancelar um lembrete ainda pendente
async fn cancelar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let lembrete = buscar_lembrete(&state.pool, id).await?;

    if lembrete.status != StatusLembrete::Pendente {
        return Err(ApiError::validacao(
            "Apenas lembretes pendentes podem ser cancelados",
        ));
    }

    sqlx::query("UPDATE lembretes_whatsapp SET status = 'cancelado', updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "Lembrete cancelado com sucesso" })))
}
