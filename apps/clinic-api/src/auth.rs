//! Autenticação: emissão e validação de tokens JWT e hashing de senhas
//!
//! Tokens HS256 com `sub` = id do usuário. Senhas são armazenadas com
//! argon2id e salt aleatório

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common_db::models::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;

/// Claims do token de acesso
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Id do usuário autenticado
    pub sub: String,
    /// Expiração (timestamp UNIX)
    pub exp: i64,
}

/// Emite um token de acesso para o usuário
pub fn criar_token(user_id: Uuid, config: &Config) -> Result<String, ApiError> {
    let exp = Utc::now() + Duration::minutes(config.token_ttl_minutos);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Interno(anyhow::Error::new(e)))
}

/// Valida a assinatura e a expiração de um token, devolvendo os claims
pub fn decodificar_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::NaoAutorizado("Não foi possível validar as credenciais".to_string()))
}

/// Gera o hash argon2id de uma senha
pub fn hash_senha(senha: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(senha.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Interno(anyhow::anyhow!("Falha ao gerar hash de senha: {}", e)))
}

/// Verifica uma senha contra o hash armazenado
pub fn verificar_senha(senha: &str, senha_hash: &str) -> bool {
    match PasswordHash::new(senha_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(senha.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Extractor do usuário autenticado
///
/// Lê o header `Authorization: Bearer <token>`, valida o JWT e carrega o
/// usuário ativo correspondente. Qualquer falha resulta em 401
pub struct UsuarioAtual(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for UsuarioAtual {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credenciais_invalidas =
            || ApiError::NaoAutorizado("Não foi possível validar as credenciais".to_string());

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(credenciais_invalidas)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(credenciais_invalidas)?;

        let claims = decodificar_token(token, &state.config.jwt_secret)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| credenciais_invalidas())?;

        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE id = ? AND ativo = 1")
                .bind(user_id)
                .fetch_optional(&state.pool)
                .await?;

        user.map(UsuarioAtual).ok_or_else(credenciais_invalidas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ida_e_volta() {
        let config = Config::default();
        let user_id = Uuid::new_v4();

        let token = criar_token(user_id, &config).unwrap();
        let claims = decodificar_token(&token, &config.jwt_secret).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_token_com_segredo_errado() {
        let config = Config::default();
        let token = criar_token(Uuid::new_v4(), &config).unwrap();

        let resultado = decodificar_token(&token, "outro-segredo");
        assert!(matches!(resultado, Err(ApiError::NaoAutorizado(_))));
    }

    #[test]
    fn test_hash_e_verificacao_de_senha() {
        let hash = hash_senha("senha-secreta").unwrap();
        assert_ne!(hash, "senha-secreta");
        assert!(verificar_senha("senha-secreta", &hash));
        assert!(!verificar_senha("senha-errada", &hash));
    }

    #[test]
    fn test_hash_invalido_nao_verifica() {
        assert!(!verificar_senha("qualquer", "não-é-um-hash"));
    }
}
