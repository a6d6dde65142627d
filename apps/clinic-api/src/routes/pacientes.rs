//! CRUD de pacientes
//!
//! A exclusão é sempre lógica (`ativo = false`); CPF e email são únicos
//! entre pacientes ativos ou não

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use common_db::models::{Consulta, Paciente, Pagamento, Prontuario};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;
use validator::Validate;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::{normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/:id", get(obter).put(atualizar).delete(remover))
        .route("/:id/historico", get(historico))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    /// Termo de busca aplicado a nome, CPF, telefone e email
    search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct PacienteCreate {
    #[validate(length(min = 1, message = "nome é obrigatório"))]
    nome: String,
    #[validate(length(min = 11, max = 14, message = "CPF inválido"))]
    cpf: String,
    data_nascimento: NaiveDate,
    telefone: Option<String>,
    whatsapp: Option<String>,
    #[validate(email(message = "email inválido"))]
    email: Option<String>,
    endereco: Option<String>,
    cidade: Option<String>,
    estado: Option<String>,
    cep: Option<String>,
    convenio: Option<String>,
    numero_carteirinha: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct PacienteUpdate {
    #[validate(length(min = 1, message = "nome é obrigatório"))]
    nome: Option<String>,
    #[validate(length(min = 11, max = 14, message = "CPF inválido"))]
    cpf: Option<String>,
    data_nascimento: Option<NaiveDate>,
    telefone: Option<String>,
    whatsapp: Option<String>,
    #[validate(email(message = "email inválido"))]
    email: Option<String>,
    endereco: Option<String>,
    cidade: Option<String>,
    estado: Option<String>,
    cep: Option<String>,
    convenio: Option<String>,
    numero_carteirinha: Option<String>,
}

/// Carrega um paciente ativo ou devolve 404
pub(crate) async fn buscar_paciente_ativo(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Paciente, ApiError> {
    let paciente: Option<Paciente> =
        sqlx::query_as("SELECT * FROM pacientes WHERE id = ? AND ativo = 1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    paciente.ok_or_else(|| ApiError::nao_encontrado("Paciente não encontrado"))
}

/// Listar pacientes com paginação e busca
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<Paciente>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);
    let termo = params
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("%{}%", s.trim().to_lowercase()));

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM pacientes WHERE ativo = 1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM pacientes WHERE ativo = 1");

    if let Some(termo) = &termo {
        for builder in [&mut count_qb, &mut qb] {
            builder
                .push(" AND (LOWER(nome) LIKE ")
                .push_bind(termo.clone())
                .push(" OR LOWER(cpf) LIKE ")
                .push_bind(termo.clone())
                .push(" OR LOWER(telefone) LIKE ")
                .push_bind(termo.clone())
                .push(" OR LOWER(email) LIKE ")
                .push_bind(termo.clone())
                .push(")");
        }
    }

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    qb.push(" ORDER BY nome ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let items: Vec<Paciente> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Criar novo paciente
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<PacienteCreate>,
) -> Result<(StatusCode, Json<Paciente>), ApiError> {
    payload.validate()?;

    // Verificar se CPF já existe
    let cpf_existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM pacientes WHERE cpf = ?")
        .bind(&payload.cpf)
        .fetch_optional(&state.pool)
        .await?;
    if cpf_existente.is_some() {
        return Err(ApiError::validacao("CPF já cadastrado"));
    }

    // Verificar se email já existe
    if let Some(email) = &payload.email {
        let email_existente: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM pacientes WHERE email = ?")
                .bind(email)
                .fetch_optional(&state.pool)
                .await?;
        if email_existente.is_some() {
            return Err(ApiError::validacao("Email já cadastrado"));
        }
    }

    let paciente = Paciente {
        id: Uuid::new_v4(),
        nome: payload.nome,
        cpf: payload.cpf,
        data_nascimento: payload.data_nascimento,
        telefone: payload.telefone,
        whatsapp: payload.whatsapp,
        email: payload.email,
        endereco: payload.endereco,
        cidade: payload.cidade,
        estado: payload.estado,
        cep: payload.cep,
        convenio: payload.convenio,
        numero_carteirinha: payload.numero_carteirinha,
        ativo: true,
        created_at: Utc::now(),
        updated_at: None,
    };

    inserir_paciente(&state.pool, &paciente).await?;

    Ok((StatusCode::CREATED, Json(paciente)))
}

pub(crate) async fn inserir_paciente(pool: &SqlitePool, p: &Paciente) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO pacientes
            (id, nome, cpf, data_nascimento, telefone, whatsapp, email, endereco,
             cidade, estado, cep, convenio, numero_carteirinha, ativo, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(p.id)
    .bind(&p.nome)
    .bind(&p.cpf)
    .bind(p.data_nascimento)
    .bind(&p.telefone)
    .bind(&p.whatsapp)
    .bind(&p.email)
    .bind(&p.endereco)
    .bind(&p.cidade)
    .bind(&p.estado)
    .bind(&p.cep)
    .bind(&p.convenio)
    .bind(&p.numero_carteirinha)
    .bind(p.ativo)
    .bind(p.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Obter detalhes de um paciente
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Paciente>, ApiError> {
    Ok(Json(buscar_paciente_ativo(&state.pool, id).await?))
}

/// Atualizar dados de um paciente
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<PacienteUpdate>,
) -> Result<Json<Paciente>, ApiError> {
    payload.validate()?;

    let mut paciente = buscar_paciente_ativo(&state.pool, id).await?;

    // Verificar se CPF já existe (se foi alterado)
    if let Some(cpf) = &payload.cpf {
        if cpf != &paciente.cpf {
            let existente: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM pacientes WHERE cpf = ? AND id != ?")
                    .bind(cpf)
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            if existente.is_some() {
                return Err(ApiError::validacao("CPF já cadastrado"));
            }
        }
    }

    // Verificar se email já existe (se foi alterado)
    if let Some(email) = &payload.email {
        if Some(email) != paciente.email.as_ref() {
            let existente: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM pacientes WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            if existente.is_some() {
                return Err(ApiError::validacao("Email já cadastrado"));
            }
        }
    }

    // Atualizar apenas os campos fornecidos
    if let Some(v) = payload.nome {
        paciente.nome = v;
    }
    if let Some(v) = payload.cpf {
        paciente.cpf = v;
    }
    if let Some(v) = payload.data_nascimento {
        paciente.data_nascimento = v;
    }
    if let Some(v) = payload.telefone {
        paciente.telefone = Some(v);
    }
    if let Some(v) = payload.whatsapp {
        paciente.whatsapp = Some(v);
    }
    if let Some(v) = payload.email {
        paciente.email = Some(v);
    }
    if let Some(v) = payload.endereco {
        paciente.endereco = Some(v);
    }
    if let Some(v) = payload.cidade {
        paciente.cidade = Some(v);
    }
    if let Some(v) = payload.estado {
        paciente.estado = Some(v);
    }
    if let Some(v) = payload.cep {
        paciente.cep = Some(v);
    }
    if let Some(v) = payload.convenio {
        paciente.convenio = Some(v);
    }
    if let Some(v) = payload.numero_carteirinha {
        paciente.numero_carteirinha = Some(v);
    }
    paciente.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE pacientes SET
            nome = ?, cpf = ?, data_nascimento = ?, telefone = ?, whatsapp = ?,
            email = ?, endereco = ?, cidade = ?, estado = ?, cep = ?, convenio = ?,
            numero_carteirinha = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&paciente.nome)
    .bind(&paciente.cpf)
    .bind(paciente.data_nascimento)
    .bind(&paciente.telefone)
    .bind(&paciente.whatsapp)
    .bind(&paciente.email)
    .bind(&paciente.endereco)
    .bind(&paciente.cidade)
    .bind(&paciente.estado)
    .bind(&paciente.cep)
    .bind(&paciente.convenio)
    .bind(&paciente.numero_carteirinha)
    .bind(paciente.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(paciente))
}

/// Desativar um paciente (exclusão lógica)
async fn remover(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let resultado = sqlx::query("UPDATE pacientes SET ativo = 0 WHERE id = ? AND ativo = 1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::nao_encontrado("Paciente não encontrado"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Obter histórico completo do paciente: consultas, prontuários e pagamentos
async fn historico(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let paciente = buscar_paciente_ativo(&state.pool, id).await?;

    let consultas: Vec<Consulta> =
        sqlx::query_as("SELECT * FROM consultas WHERE paciente_id = ? ORDER BY data_hora DESC")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    let prontuarios: Vec<Prontuario> =
        sqlx::query_as("SELECT * FROM prontuarios WHERE paciente_id = ? ORDER BY data DESC")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    let pagamentos: Vec<Pagamento> =
        sqlx::query_as("SELECT * FROM pagamentos WHERE paciente_id = ? ORDER BY created_at DESC")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(json!({
        "paciente": paciente,
        "consultas": consultas,
        "prontuarios": prontuarios,
        "pagamentos": pagamentos,
    })))
}
