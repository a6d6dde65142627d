//! Roteador da API e utilidades compartilhadas pelos handlers

use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod consultas;
pub mod dashboard;
pub mod despesas;
pub mod financeiro;
pub mod lembretes;
pub mod medicos;
pub mod pacientes;
pub mod prontuarios;

/// Resposta paginada padrão das listagens
#[derive(Debug, Serialize)]
pub struct Pagina<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Normaliza os parâmetros de paginação: skip >= 0, 1 <= limit <= 1000
pub(crate) fn normalizar_paginacao(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (skip.unwrap_or(0).max(0), limit.unwrap_or(100).clamp(1, 1000))
}

/// Primeiro instante do dia, em UTC
pub(crate) fn inicio_do_dia(data: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&data.and_hms_opt(0, 0, 0).expect("hora válida"))
}

/// Último instante do dia considerado nos filtros, em UTC
pub(crate) fn fim_do_dia(data: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&data.and_hms_opt(23, 59, 59).expect("hora válida"))
}

/// Monta a aplicação completa com camadas de CORS, compressão e trace
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(raiz))
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(ConcurrencyLimitLayer::new(512))
        .with_state(state)
}

/// Rotas versionadas da API
fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/pacientes", pacientes::router())
        .nest("/consultas", consultas::router())
        .nest("/medicos", medicos::router())
        .nest("/prontuarios", prontuarios::router())
        .nest("/financeiro", financeiro::router())
        .nest("/despesas", despesas::router())
        .nest("/lembretes", lembretes::router())
        .nest("/dashboard", dashboard::router())
}

async fn raiz() -> Json<Value> {
    Json(json!({
        "message": "Sistema de Gerenciamento de Clínica Médica",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizar_paginacao() {
        assert_eq!(normalizar_paginacao(None, None), (0, 100));
        assert_eq!(normalizar_paginacao(Some(-5), Some(0)), (0, 1));
        assert_eq!(normalizar_paginacao(Some(10), Some(5000)), (10, 1000));
    }

    #[test]
    fn test_limites_do_dia() {
        let data = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(inicio_do_dia(data) < fim_do_dia(data));
        assert_eq!(inicio_do_dia(data).to_rfc3339(), "2025-06-02T00:00:00+00:00");
    }
}
