//! Agendamento de consultas
//!
//! O conflito de horário considera apenas consultas agendadas ou confirmadas
//! do mesmo médico; a aritmética de intervalos vive em [`crate::agenda`]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use common_db::models::{Consulta, DiaSemana, HorarioDisponivel, StatusConsulta, TipoConsulta, User};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::agenda::{existe_conflito, gerar_slots};
use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::medicos::buscar_medico;
use crate::routes::pacientes::buscar_paciente_ativo;
use crate::routes::{fim_do_dia, inicio_do_dia, normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/:id", get(obter).put(atualizar).delete(cancelar))
        .route("/agenda/:medico_id", get(agenda_medico))
        .route("/horarios-disponiveis/", get(horarios_disponiveis))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
    medico_id: Option<Uuid>,
    status: Option<StatusConsulta>,
}

#[derive(Debug, Deserialize)]
struct ConsultaCreate {
    paciente_id: Uuid,
    medico_id: Uuid,
    data_hora: DateTime<Utc>,
    duracao_minutos: Option<i64>,
    tipo: Option<TipoConsulta>,
    observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConsultaUpdate {
    data_hora: Option<DateTime<Utc>>,
    duracao_minutos: Option<i64>,
    tipo: Option<TipoConsulta>,
    status: Option<StatusConsulta>,
    observacoes: Option<String>,
}

/// Linha resumida de consulta para listagens
#[derive(Debug, Serialize, sqlx::FromRow)]
struct ConsultaResumo {
    id: Uuid,
    data_hora: DateTime<Utc>,
    paciente_nome: String,
    medico_nome: String,
    status: StatusConsulta,
    tipo: TipoConsulta,
}

#[derive(Debug, Serialize)]
struct HorarioAgenda {
    data: NaiveDate,
    hora_inicio: NaiveTime,
    hora_fim: NaiveTime,
    medico_id: Uuid,
    medico_nome: String,
    disponivel: bool,
}

#[derive(Debug, Serialize)]
struct AgendaMedico {
    medico_id: Uuid,
    medico_nome: String,
    especialidade: Option<String>,
    consultas: Vec<Consulta>,
    horarios_disponiveis: Vec<HorarioAgenda>,
}

#[derive(Debug, Deserialize)]
struct AgendaParams {
    data: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SlotsParams {
    medico_id: Uuid,
    data: NaiveDate,
}

async fn buscar_consulta(pool: &SqlitePool, id: Uuid) -> Result<Consulta, ApiError> {
    let consulta: Option<Consulta> = sqlx::query_as("SELECT * FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    consulta.ok_or_else(|| ApiError::nao_encontrado("Consulta não encontrada"))
}

/// Consultas que ocupam a agenda do médico em torno do intervalo candidato
async fn consultas_ocupadas(
    pool: &SqlitePool,
    medico_id: Uuid,
    inicio: DateTime<Utc>,
    fim: DateTime<Utc>,
) -> Result<Vec<Consulta>, ApiError> {
    // Margem de um dia cobre qualquer duração plausível de consulta
    let consultas: Vec<Consulta> = sqlx::query_as(
        r#"
        SELECT * FROM consultas
        WHERE medico_id = ?
          AND status IN ('agendada', 'confirmada')
          AND data_hora >= ?
          AND data_hora < ?
        "#,
    )
    .bind(medico_id)
    .bind(inicio - Duration::days(1))
    .bind(fim)
    .fetch_all(pool)
    .await?;
    Ok(consultas)
}

/// Listar consultas com filtros e paginação
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<ConsultaResumo>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM consultas c WHERE 1=1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT c.id, c.data_hora, c.status, c.tipo,
               p.nome AS paciente_nome, u.nome AS medico_nome
        FROM consultas c
        JOIN pacientes p ON p.id = c.paciente_id
        JOIN users u ON u.id = c.medico_id
        WHERE 1=1
        "#,
    );

    for builder in [&mut count_qb, &mut qb] {
        if let Some(data_inicio) = params.data_inicio {
            builder
                .push(" AND c.data_hora >= ")
                .push_bind(inicio_do_dia(data_inicio));
        }
        if let Some(data_fim) = params.data_fim {
            builder
                .push(" AND c.data_hora <= ")
                .push_bind(fim_do_dia(data_fim));
        }
        if let Some(medico_id) = params.medico_id {
            builder.push(" AND c.medico_id = ").push_bind(medico_id);
        }
        if let Some(status) = params.status {
            builder.push(" AND c.status = ").push_bind(status);
        }
    }

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    qb.push(" ORDER BY c.data_hora ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let items: Vec<ConsultaResumo> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Agendar nova consulta
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<ConsultaCreate>,
) -> Result<(StatusCode, Json<Consulta>), ApiError> {
    buscar_paciente_ativo(&state.pool, payload.paciente_id).await?;
    buscar_medico(&state.pool, payload.medico_id).await?;

    let duracao = payload.duracao_minutos.unwrap_or(60);
    if duracao <= 0 {
        return Err(ApiError::validacao("Duração da consulta deve ser positiva"));
    }

    let inicio = payload.data_hora;
    let fim = inicio + Duration::minutes(duracao);

    let ocupadas = consultas_ocupadas(&state.pool, payload.medico_id, inicio, fim).await?;
    if existe_conflito(inicio, fim, &ocupadas, None) {
        return Err(ApiError::validacao("Horário já ocupado por outra consulta"));
    }

    let consulta = Consulta {
        id: Uuid::new_v4(),
        paciente_id: payload.paciente_id,
        medico_id: payload.medico_id,
        data_hora: inicio,
        duracao_minutos: duracao,
        tipo: payload.tipo.unwrap_or(TipoConsulta::PrimeiraConsulta),
        status: StatusConsulta::Agendada,
        observacoes: payload.observacoes,
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO consultas
            (id, paciente_id, medico_id, data_hora, duracao_minutos, tipo, status,
             observacoes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(consulta.id)
    .bind(consulta.paciente_id)
    .bind(consulta.medico_id)
    .bind(consulta.data_hora)
    .bind(consulta.duracao_minutos)
    .bind(consulta.tipo)
    .bind(consulta.status)
    .bind(&consulta.observacoes)
    .bind(consulta.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(consulta)))
}

/// Obter detalhes de uma consulta
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<Consulta>, ApiError> {
    Ok(Json(buscar_consulta(&state.pool, id).await?))
}

/// Atualizar consulta, revalidando o conflito em reagendamentos
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConsultaUpdate>,
) -> Result<Json<Consulta>, ApiError> {
    let mut consulta = buscar_consulta(&state.pool, id).await?;

    let novo_inicio = payload.data_hora.unwrap_or(consulta.data_hora);
    let nova_duracao = payload.duracao_minutos.unwrap_or(consulta.duracao_minutos);
    if nova_duracao <= 0 {
        return Err(ApiError::validacao("Duração da consulta deve ser positiva"));
    }

    let reagendada = novo_inicio != consulta.data_hora || nova_duracao != consulta.duracao_minutos;
    if reagendada {
        let novo_fim = novo_inicio + Duration::minutes(nova_duracao);
        let ocupadas =
            consultas_ocupadas(&state.pool, consulta.medico_id, novo_inicio, novo_fim).await?;
        if existe_conflito(novo_inicio, novo_fim, &ocupadas, Some(id)) {
            return Err(ApiError::validacao("Horário já ocupado por outra consulta"));
        }
    }

    consulta.data_hora = novo_inicio;
    consulta.duracao_minutos = nova_duracao;
    if let Some(tipo) = payload.tipo {
        consulta.tipo = tipo;
    }
    if let Some(status) = payload.status {
        consulta.status = status;
    }
    if let Some(observacoes) = payload.observacoes {
        consulta.observacoes = Some(observacoes);
    }
    consulta.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE consultas SET
            data_hora = ?, duracao_minutos = ?, tipo = ?, status = ?,
            observacoes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(consulta.data_hora)
    .bind(consulta.duracao_minutos)
    .bind(consulta.tipo)
    .bind(consulta.status)
    .bind(&consulta.observacoes)
    .bind(consulta.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(consulta))
}

/// Cancelar consulta
async fn cancelar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let resultado = sqlx::query("UPDATE consultas SET status = 'cancelada', updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::nao_encontrado("Consulta não encontrada"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Janelas semanais ativas do médico para um dia da semana
async fn janelas_do_dia(
    pool: &SqlitePool,
    medico_id: Uuid,
    dia: DiaSemana,
) -> Result<Vec<HorarioDisponivel>, ApiError> {
    let janelas: Vec<HorarioDisponivel> = sqlx::query_as(
        "SELECT * FROM horarios_disponiveis WHERE medico_id = ? AND dia_semana = ? AND ativo = 1",
    )
    .bind(medico_id)
    .bind(dia)
    .fetch_all(pool)
    .await?;
    Ok(janelas)
}

/// Obter agenda de um médico em uma data (padrão: hoje)
async fn agenda_medico(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(medico_id): Path<Uuid>,
    Query(params): Query<AgendaParams>,
) -> Result<Json<AgendaMedico>, ApiError> {
    let data = params.data.unwrap_or_else(|| Utc::now().date_naive());
    let medico: User = buscar_medico(&state.pool, medico_id).await?;

    let consultas: Vec<Consulta> = sqlx::query_as(
        r#"
        SELECT * FROM consultas
        WHERE medico_id = ? AND data_hora >= ? AND data_hora <= ?
        ORDER BY data_hora ASC
        "#,
    )
    .bind(medico_id)
    .bind(inicio_do_dia(data))
    .bind(fim_do_dia(data))
    .fetch_all(&state.pool)
    .await?;

    let dia = DiaSemana::from_weekday(data.weekday());
    let janelas = janelas_do_dia(&state.pool, medico_id, dia).await?;

    let horarios_disponiveis = janelas
        .iter()
        .map(|j| HorarioAgenda {
            data,
            hora_inicio: j.hora_inicio,
            hora_fim: j.hora_fim,
            medico_id,
            medico_nome: medico.nome.clone(),
            disponivel: true,
        })
        .collect();

    Ok(Json(AgendaMedico {
        medico_id,
        medico_nome: medico.nome,
        especialidade: medico.especialidade,
        consultas,
        horarios_disponiveis,
    }))
}

/// Obter os slots de agendamento de um médico em uma data
async fn horarios_disponiveis(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<SlotsParams>,
) -> Result<Json<Vec<HorarioAgenda>>, ApiError> {
    let medico: User = buscar_medico(&state.pool, params.medico_id).await?;

    let dia = DiaSemana::from_weekday(params.data.weekday());
    let janelas = janelas_do_dia(&state.pool, params.medico_id, dia).await?;

    let ocupadas: Vec<Consulta> = sqlx::query_as(
        r#"
        SELECT * FROM consultas
        WHERE medico_id = ? AND data_hora >= ? AND data_hora <= ?
          AND status IN ('agendada', 'confirmada')
        "#,
    )
    .bind(params.medico_id)
    .bind(inicio_do_dia(params.data))
    .bind(fim_do_dia(params.data))
    .fetch_all(&state.pool)
    .await?;

    let slots = gerar_slots(params.data, &janelas, &ocupadas);

    let resposta = slots
        .into_iter()
        .map(|s| HorarioAgenda {
            data: s.data,
            hora_inicio: s.hora_inicio,
            hora_fim: s.hora_fim,
            medico_id: params.medico_id,
            medico_nome: medico.nome.clone(),
            disponivel: s.disponivel,
        })
        .collect();

    Ok(Json(resposta))
}
