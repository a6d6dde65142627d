//! Tipos de erro da API e mapeamento para respostas HTTP

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_db::error::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Erros expostos pelos handlers da API
///
/// Mapeamento uniforme: autenticação → 401, entidade ausente → 404,
/// validação/conflito → 400, restante → 500
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NaoAutorizado(String),

    #[error("{0}")]
    NaoEncontrado(String),

    #[error("{0}")]
    Validacao(String),

    #[error("Erro interno do servidor")]
    Interno(#[from] anyhow::Error),
}

impl ApiError {
    pub fn nao_encontrado(msg: impl Into<String>) -> Self {
        ApiError::NaoEncontrado(msg.into())
    }

    pub fn validacao(msg: impl Into<String>) -> Self {
        ApiError::Validacao(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NaoAutorizado(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::NaoEncontrado(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Validacao(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Interno(e) => {
                error!("Erro interno: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                )
            }
        };

        let body = Json(json!({ "detail": detail }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        match DbError::from(error) {
            DbError::NotFound(msg) => ApiError::NaoEncontrado(msg),
            DbError::ConstraintViolation(msg) => ApiError::Validacao(msg),
            outro => ApiError::Interno(anyhow::Error::new(outro)),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound(msg) => ApiError::NaoEncontrado(msg),
            DbError::ConstraintViolation(msg) => ApiError::Validacao(msg),
            outro => ApiError::Interno(anyhow::Error::new(outro)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validacao(format!("Dados inválidos: {}", errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_por_variante() {
        let resp = ApiError::NaoAutorizado("sem token".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = ApiError::nao_encontrado("Paciente não encontrado").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::validacao("CPF já cadastrado").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_row_not_found_vira_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::NaoEncontrado(_)));
    }
}
