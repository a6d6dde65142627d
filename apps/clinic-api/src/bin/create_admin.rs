//! Cria (ou atualiza a senha de) o usuário administrador
//!
//! Email e senha podem ser sobrescritos via CLINIC_ADMIN_EMAIL e
//! CLINIC_ADMIN_SENHA

use anyhow::{Context, Result};
use chrono::Utc;
use clinic_api::auth::hash_senha;
use clinic_api::Config;
use common_db::{init_db_pool, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let email = std::env::var("CLINIC_ADMIN_EMAIL").unwrap_or_else(|_| "admin@clinica.com".to_string());
    let senha = std::env::var("CLINIC_ADMIN_SENHA").unwrap_or_else(|_| "admin".to_string());

    let pool = init_db_pool(&DbConfig {
        db_path: config.database_path.clone(),
        max_connections: 1,
    })
    .await?;

    let senha_hash = hash_senha(&senha).map_err(|e| anyhow::anyhow!("{}", e))?;

    let existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&pool)
        .await
        .context("Falha ao consultar usuário admin")?;

    match existente {
        Some((id,)) => {
            sqlx::query("UPDATE users SET senha_hash = ?, ativo = 1, updated_at = ? WHERE id = ?")
                .bind(&senha_hash)
                .bind(Utc::now())
                .bind(id)
                .execute(&pool)
                .await
                .context("Falha ao atualizar senha do admin")?;
            info!("Admin já existia, senha atualizada: {}", email);
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO users (id, email, senha_hash, nome, role, crm, especialidade, ativo, created_at)
                VALUES (?, ?, ?, 'Administrador', 'admin', NULL, NULL, 1, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&email)
            .bind(&senha_hash)
            .bind(Utc::now())
            .execute(&pool)
            .await
            .context("Falha ao criar usuário admin")?;
            info!("Admin criado com sucesso: {}", email);
        }
    }

    Ok(())
}
