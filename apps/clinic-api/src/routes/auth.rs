//! Endpoints de autenticação: login e dados do usuário atual

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use common_db::models::User;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{criar_token, verificar_senha, UsuarioAtual};
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    /// Email ou nome de usuário
    username: String,
    password: String,
}

/// Endpoint para login e obtenção de token JWT
async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    // Tenta localizar por email e, em seguida, por nome
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE (email = ? OR nome = ?) AND ativo = 1")
            .bind(&form.username)
            .bind(&form.username)
            .fetch_optional(&state.pool)
            .await?;

    let user = user
        .filter(|u| verificar_senha(&form.password, &u.senha_hash))
        .ok_or_else(|| ApiError::NaoAutorizado("Email/usuário ou senha incorretos".to_string()))?;

    let access_token = criar_token(user.id, &state.config)?;

    Ok(Json(json!({
        "access_token": access_token,
        "token_type": "bearer",
        "user": user,
    })))
}

/// Endpoint para obter dados do usuário atual
async fn me(UsuarioAtual(user): UsuarioAtual) -> Json<User> {
    Json(user)
}
