//! Cadastro de médicos e seus horários de atendimento
//!
//! Médicos são usuários com `role = medico`; email e CRM são únicos

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveTime, Utc};
use common_db::models::{DiaSemana, HorarioDisponivel, User, UserRole};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_senha, UsuarioAtual};
use crate::error::ApiError;
use crate::routes::{normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/:id", get(obter).put(atualizar))
        .route("/:id/horarios", get(listar_horarios).put(substituir_horarios))
        .route("/:id/completo", get(completo))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    especialidade: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct MedicoCreate {
    #[validate(email(message = "email inválido"))]
    email: String,
    #[validate(length(min = 6, message = "senha deve ter ao menos 6 caracteres"))]
    password: String,
    #[validate(length(min = 1, message = "nome é obrigatório"))]
    nome: String,
    #[validate(length(min = 1, message = "CRM é obrigatório"))]
    crm: String,
    especialidade: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct MedicoUpdate {
    #[validate(email(message = "email inválido"))]
    email: Option<String>,
    #[validate(length(min = 6, message = "senha deve ter ao menos 6 caracteres"))]
    password: Option<String>,
    #[validate(length(min = 1, message = "nome é obrigatório"))]
    nome: Option<String>,
    crm: Option<String>,
    especialidade: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JanelaHorario {
    dia_semana: DiaSemana,
    hora_inicio: NaiveTime,
    hora_fim: NaiveTime,
    #[serde(default = "ativo_padrao")]
    ativo: bool,
}

fn ativo_padrao() -> bool {
    true
}

/// Carrega um usuário com papel de médico ou devolve 404
pub(crate) async fn buscar_medico(pool: &SqlitePool, id: Uuid) -> Result<User, ApiError> {
    let medico: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE id = ? AND role = 'medico'")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    medico.ok_or_else(|| ApiError::nao_encontrado("Médico não encontrado"))
}

/// Listar médicos com filtro por especialidade
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<User>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);
    let filtro = params
        .especialidade
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("%{}%", s.trim().to_lowercase()));

    let (total, items): (i64, Vec<User>) = match &filtro {
        Some(filtro) => {
            let total = sqlx::query_scalar(
                "SELECT COUNT(*) FROM users WHERE role = 'medico' AND LOWER(especialidade) LIKE ?",
            )
            .bind(filtro)
            .fetch_one(&state.pool)
            .await?;
            let items = sqlx::query_as(
                r#"
                SELECT * FROM users
                WHERE role = 'medico' AND LOWER(especialidade) LIKE ?
                ORDER BY nome ASC LIMIT ? OFFSET ?
                "#,
            )
            .bind(filtro)
            .bind(limit)
            .bind(skip)
            .fetch_all(&state.pool)
            .await?;
            (total, items)
        }
        None => {
            let total = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'medico'")
                .fetch_one(&state.pool)
                .await?;
            let items = sqlx::query_as(
                "SELECT * FROM users WHERE role = 'medico' ORDER BY nome ASC LIMIT ? OFFSET ?",
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

/// Cadastrar novo médico
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<MedicoCreate>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.validate()?;

    let email_existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;
    if email_existente.is_some() {
        return Err(ApiError::validacao("Email já cadastrado"));
    }

    let crm_existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE crm = ?")
        .bind(&payload.crm)
        .fetch_optional(&state.pool)
        .await?;
    if crm_existente.is_some() {
        return Err(ApiError::validacao("CRM já cadastrado"));
    }

    let medico = User {
        id: Uuid::new_v4(),
        email: payload.email,
        senha_hash: hash_senha(&payload.password)?,
        nome: payload.nome,
        role: UserRole::Medico,
        crm: Some(payload.crm),
        especialidade: payload.especialidade,
        ativo: true,
        created_at: Utc::now(),
        updated_at: None,
    };

    inserir_user(&state.pool, &medico).await?;

    Ok((StatusCode::CREATED, Json(medico)))
}

pub(crate) async fn inserir_user(pool: &SqlitePool, u: &User) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, senha_hash, nome, role, crm, especialidade, ativo, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(u.id)
    .bind(&u.email)
    .bind(&u.senha_hash)
    .bind(&u.nome)
    .bind(u.role)
    .bind(&u.crm)
    .bind(&u.especialidade)
    .bind(u.ativo)
    .bind(u.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Obter detalhes de um médico
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(buscar_medico(&state.pool, id).await?))
}

/// Atualizar dados de um médico
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<MedicoUpdate>,
) -> Result<Json<User>, ApiError> {
    payload.validate()?;

    let mut medico = buscar_medico(&state.pool, id).await?;

    if let Some(email) = &payload.email {
        if email != &medico.email {
            let existente: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            if existente.is_some() {
                return Err(ApiError::validacao("Email já cadastrado"));
            }
        }
    }

    if let Some(crm) = &payload.crm {
        if Some(crm) != medico.crm.as_ref() {
            let existente: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE crm = ? AND id != ?")
                    .bind(crm)
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            if existente.is_some() {
                return Err(ApiError::validacao("CRM já cadastrado"));
            }
        }
    }

    if let Some(v) = payload.email {
        medico.email = v;
    }
    if let Some(v) = payload.nome {
        medico.nome = v;
    }
    if let Some(v) = payload.crm {
        medico.crm = Some(v);
    }
    if let Some(v) = payload.especialidade {
        medico.especialidade = Some(v);
    }
    if let Some(senha) = payload.password {
        medico.senha_hash = hash_senha(&senha)?;
    }
    medico.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE users SET
            email = ?, senha_hash = ?, nome = ?, crm = ?, especialidade = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&medico.email)
    .bind(&medico.senha_hash)
    .bind(&medico.nome)
    .bind(&medico.crm)
    .bind(&medico.especialidade)
    .bind(medico.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(medico))
}

async fn horarios_do_medico(
    pool: &SqlitePool,
    medico_id: Uuid,
) -> Result<Vec<HorarioDisponivel>, ApiError> {
    let horarios: Vec<HorarioDisponivel> = sqlx::query_as(
        "SELECT * FROM horarios_disponiveis WHERE medico_id = ? ORDER BY dia_semana, hora_inicio",
    )
    .bind(medico_id)
    .fetch_all(pool)
    .await?;
    Ok(horarios)
}

/// Obter horários de atendimento de um médico
async fn listar_horarios(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HorarioDisponivel>>, ApiError> {
    buscar_medico(&state.pool, id).await?;
    Ok(Json(horarios_do_medico(&state.pool, id).await?))
}

/// Substituir a grade semanal de atendimento de um médico
async fn substituir_horarios(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(janelas): Json<Vec<JanelaHorario>>,
) -> Result<Json<Vec<HorarioDisponivel>>, ApiError> {
    buscar_medico(&state.pool, id).await?;

    for janela in &janelas {
        if janela.hora_inicio >= janela.hora_fim {
            return Err(ApiError::validacao(
                "Hora de início deve ser anterior à hora de fim",
            ));
        }
    }

    let mut tx = state.pool.begin().await.map_err(ApiError::from)?;

    sqlx::query("DELETE FROM horarios_disponiveis WHERE medico_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for janela in &janelas {
        sqlx::query(
            r#"
            INSERT INTO horarios_disponiveis (id, medico_id, dia_semana, hora_inicio, hora_fim, ativo)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(janela.dia_semana)
        .bind(janela.hora_inicio)
        .bind(janela.hora_fim)
        .bind(janela.ativo)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(ApiError::from)?;

    Ok(Json(horarios_do_medico(&state.pool, id).await?))
}

/// Obter médico com seus horários de atendimento
async fn completo(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let medico = buscar_medico(&state.pool, id).await?;
    let horarios = horarios_do_medico(&state.pool, id).await?;

    Ok(Json(json!({
        "id": medico.id,
        "nome": medico.nome,
        "email": medico.email,
        "crm": medico.crm,
        "especialidade": medico.especialidade,
        "ativo": medico.ativo,
        "created_at": medico.created_at,
        "horarios": horarios,
    })))
}
