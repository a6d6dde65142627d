//! Prontuários médicos

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use common_db::models::Prontuario;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::auth::UsuarioAtual;
use crate::error::ApiError;
use crate::routes::medicos::buscar_medico;
use crate::routes::pacientes::buscar_paciente_ativo;
use crate::routes::{fim_do_dia, inicio_do_dia, normalizar_paginacao, Pagina};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listar).post(criar))
        .route("/:id", get(obter).put(atualizar).delete(remover))
        .route("/:id/html", get(obter_html))
        .route("/paciente/:paciente_id", get(listar_por_paciente))
        .route("/templates/default", get(template_padrao))
}

#[derive(Debug, Deserialize)]
struct ListarParams {
    skip: Option<i64>,
    limit: Option<i64>,
    paciente_id: Option<Uuid>,
    medico_id: Option<Uuid>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ProntuarioCreate {
    paciente_id: Uuid,
    consulta_id: Option<Uuid>,
    medico_id: Uuid,
    data: DateTime<Utc>,
    anamnese: Option<String>,
    diagnostico: Option<String>,
    prescricao: Option<String>,
    exames_solicitados: Option<String>,
    observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProntuarioUpdate {
    data: Option<DateTime<Utc>>,
    anamnese: Option<String>,
    diagnostico: Option<String>,
    prescricao: Option<String>,
    exames_solicitados: Option<String>,
    observacoes: Option<String>,
}

/// Linha resumida para o histórico de um paciente
#[derive(Debug, Serialize, sqlx::FromRow)]
struct ProntuarioResumo {
    id: Uuid,
    data: DateTime<Utc>,
    medico_nome: String,
    diagnostico: Option<String>,
    consulta_id: Option<Uuid>,
}

/// Prontuário com nomes resolvidos para exibição
#[derive(Debug, Serialize, sqlx::FromRow)]
struct ProntuarioCompleto {
    id: Uuid,
    paciente_id: Uuid,
    consulta_id: Option<Uuid>,
    medico_id: Uuid,
    data: DateTime<Utc>,
    anamnese: Option<String>,
    diagnostico: Option<String>,
    prescricao: Option<String>,
    exames_solicitados: Option<String>,
    observacoes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    paciente_nome: String,
    medico_nome: String,
    consulta_data: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ProntuarioTemplate {
    anamnese_template: String,
    diagnostico_template: String,
    prescricao_template: String,
    observacoes_template: String,
}

async fn buscar_prontuario(pool: &SqlitePool, id: Uuid) -> Result<Prontuario, ApiError> {
    let prontuario: Option<Prontuario> = sqlx::query_as("SELECT * FROM prontuarios WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    prontuario.ok_or_else(|| ApiError::nao_encontrado("Prontuário não encontrado"))
}

async fn buscar_prontuario_completo(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<ProntuarioCompleto, ApiError> {
    let prontuario: Option<ProntuarioCompleto> = sqlx::query_as(
        r#"
        SELECT pr.*, p.nome AS paciente_nome, u.nome AS medico_nome,
               c.data_hora AS consulta_data
        FROM prontuarios pr
        JOIN pacientes p ON p.id = pr.paciente_id
        JOIN users u ON u.id = pr.medico_id
        LEFT JOIN consultas c ON c.id = pr.consulta_id
        WHERE pr.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    prontuario.ok_or_else(|| ApiError::nao_encontrado("Prontuário não encontrado"))
}

/// Listar prontuários com filtros e paginação
async fn listar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Query(params): Query<ListarParams>,
) -> Result<Json<Pagina<Prontuario>>, ApiError> {
    let (skip, limit) = normalizar_paginacao(params.skip, params.limit);

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM prontuarios WHERE 1=1");
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM prontuarios WHERE 1=1");

    for builder in [&mut count_qb, &mut qb] {
        if let Some(paciente_id) = params.paciente_id {
            builder.push(" AND paciente_id = ").push_bind(paciente_id);
        }
        if let Some(medico_id) = params.medico_id {
            builder.push(" AND medico_id = ").push_bind(medico_id);
        }
        if let Some(data_inicio) = params.data_inicio {
            builder.push(" AND data >= ").push_bind(inicio_do_dia(data_inicio));
        }
        if let Some(data_fim) = params.data_fim {
            builder.push(" AND data <= ").push_bind(fim_do_dia(data_fim));
        }
    }

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    qb.push(" ORDER BY data DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let items: Vec<Prontuario> = qb.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(Pagina { items, total, skip, limit }))
}

/// Listar prontuários de um paciente específico
async fn listar_por_paciente(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(paciente_id): Path<Uuid>,
) -> Result<Json<Vec<ProntuarioResumo>>, ApiError> {
    buscar_paciente_ativo(&state.pool, paciente_id).await?;

    let resumos: Vec<ProntuarioResumo> = sqlx::query_as(
        r#"
        SELECT pr.id, pr.data, u.nome AS medico_nome, pr.diagnostico, pr.consulta_id
        FROM prontuarios pr
        JOIN users u ON u.id = pr.medico_id
        WHERE pr.paciente_id = ?
        ORDER BY pr.data DESC
        "#,
    )
    .bind(paciente_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(resumos))
}

/// Criar novo prontuário
async fn criar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Json(payload): Json<ProntuarioCreate>,
) -> Result<(StatusCode, Json<Prontuario>), ApiError> {
    buscar_paciente_ativo(&state.pool, payload.paciente_id).await?;
    buscar_medico(&state.pool, payload.medico_id).await?;

    if let Some(consulta_id) = payload.consulta_id {
        let consulta: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM consultas WHERE id = ?")
            .bind(consulta_id)
            .fetch_optional(&state.pool)
            .await?;
        if consulta.is_none() {
            return Err(ApiError::nao_encontrado("Consulta não encontrada"));
        }
    }

    let prontuario = Prontuario {
        id: Uuid::new_v4(),
        paciente_id: payload.paciente_id,
        consulta_id: payload.consulta_id,
        medico_id: payload.medico_id,
        data: payload.data,
        anamnese: payload.anamnese,
        diagnostico: payload.diagnostico,
        prescricao: payload.prescricao,
        exames_solicitados: payload.exames_solicitados,
        observacoes: payload.observacoes,
        created_at: Utc::now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO prontuarios
            (id, paciente_id, consulta_id, medico_id, data, anamnese, diagnostico,
             prescricao, exames_solicitados, observacoes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(prontuario.id)
    .bind(prontuario.paciente_id)
    .bind(prontuario.consulta_id)
    .bind(prontuario.medico_id)
    .bind(prontuario.data)
    .bind(&prontuario.anamnese)
    .bind(&prontuario.diagnostico)
    .bind(&prontuario.prescricao)
    .bind(&prontuario.exames_solicitados)
    .bind(&prontuario.observacoes)
    .bind(prontuario.created_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(prontuario)))
}

/// Obter detalhes de um prontuário com nomes resolvidos
async fn obter(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Json<ProntuarioCompleto>, ApiError> {
    Ok(Json(buscar_prontuario_completo(&state.pool, id).await?))
}

/// Atualizar prontuário
async fn atualizar(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProntuarioUpdate>,
) -> Result<Json<Prontuario>, ApiError> {
    let mut prontuario = buscar_prontuario(&state.pool, id).await?;

    if let Some(v) = payload.data {
        prontuario.data = v;
    }
    if let Some(v) = payload.anamnese {
        prontuario.anamnese = Some(v);
    }
    if let Some(v) = payload.diagnostico {
        prontuario.diagnostico = Some(v);
    }
    if let Some(v) = payload.prescricao {
        prontuario.prescricao = Some(v);
    }
    if let Some(v) = payload.exames_solicitados {
        prontuario.exames_solicitados = Some(v);
    }
    if let Some(v) = payload.observacoes {
        prontuario.observacoes = Some(v);
    }
    prontuario.updated_at = Some(Utc::now());

    sqlx::query(
        r#"
        UPDATE prontuarios SET
            data = ?, anamnese = ?, diagnostico = ?, prescricao = ?,
            exames_solicitados = ?, observacoes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(prontuario.data)
    .bind(&prontuario.anamnese)
    .bind(&prontuario.diagnostico)
    .bind(&prontuario.prescricao)
    .bind(&prontuario.exames_solicitados)
    .bind(&prontuario.observacoes)
    .bind(prontuario.updated_at)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(prontuario))
}

/// Excluir prontuário
async fn remover(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let resultado = sqlx::query("DELETE FROM prontuarios WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::nao_encontrado("Prontuário não encontrado"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn secao_html(titulo: &str, conteudo: &Option<String>) -> String {
    match conteudo {
        Some(texto) if !texto.is_empty() => format!(
            r#"<div class="section"><h3>{}</h3><p>{}</p></div>"#,
            titulo, texto
        ),
        _ => String::new(),
    }
}

/// Obter prontuário em formato HTML para visualização e impressão
async fn obter_html(
    State(state): State<AppState>,
    _user: UsuarioAtual,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let p = buscar_prontuario_completo(&state.pool, id).await?;

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Prontuário - {paciente}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ border-bottom: 2px solid #333; padding-bottom: 10px; margin-bottom: 20px; }}
        .section {{ margin-bottom: 20px; }}
        .section h3 {{ color: #333; border-bottom: 1px solid #ccc; padding-bottom: 5px; }}
        .section p {{ margin: 10px 0; line-height: 1.6; white-space: pre-wrap; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Prontuário Médico</h1>
        <p><strong>Paciente:</strong> {paciente}</p>
        <p><strong>Médico:</strong> Dr(a). {medico}</p>
        <p><strong>Data:</strong> {data}</p>
    </div>
    {anamnese}
    {diagnostico}
    {prescricao}
    {exames}
    {observacoes}
    <div class="footer">
        <p>Prontuário gerado em {gerado_em}</p>
    </div>
</body>
</html>"#,
        paciente = p.paciente_nome,
        medico = p.medico_nome,
        data = p.data.format("%d/%m/%Y %H:%M"),
        anamnese = secao_html("Anamnese", &p.anamnese),
        diagnostico = secao_html("Diagnóstico", &p.diagnostico),
        prescricao = secao_html("Prescrição", &p.prescricao),
        exames = secao_html("Exames Solicitados", &p.exames_solicitados),
        observacoes = secao_html("Observações", &p.observacoes),
        gerado_em = p.created_at.format("%d/%m/%Y %H:%M"),
    );

    Ok(Html(html))
}

/// Obter template padrão para prontuários
async fn template_padrao(_user: UsuarioAtual) -> Json<ProntuarioTemplate> {
    Json(ProntuarioTemplate {
        anamnese_template: "Queixa Principal:\nHistória da Doença Atual:\nAntecedentes Pessoais:\nAntecedentes Familiares:\nMedicamentos em Uso:\nAlergias:\nExame Físico:".to_string(),
        diagnostico_template: "Diagnóstico Principal:\nDiagnósticos Secundários:\nCID-10:".to_string(),
        prescricao_template: "Medicamentos:\n- \n- \n- \n\nOrientações:\n- \n- \n- ".to_string(),
        observacoes_template: "Observações Gerais:\nRetorno em: ___ dias\nPróxima consulta: __/__/____".to_string(),
    })
}
