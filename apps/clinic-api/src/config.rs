//! Configuração da aplicação via variáveis de ambiente

use std::env;

/// Configurações carregadas do ambiente, com padrões de desenvolvimento
#[derive(Debug, Clone)]
pub struct Config {
    /// Caminho do arquivo SQLite
    pub database_path: String,
    /// Endereço de escuta do servidor HTTP
    pub bind_addr: String,
    /// Segredo para assinatura dos tokens JWT
    pub jwt_secret: String,
    /// Validade do token de acesso em minutos
    pub token_ttl_minutos: i64,
    /// Número máximo de conexões no pool
    pub db_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "data/clinica.db".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
            jwt_secret: "troque-este-segredo-em-producao".to_string(),
            token_ttl_minutos: 30,
            db_max_connections: 5,
        }
    }
}

impl Config {
    /// Carrega a configuração a partir do ambiente
    pub fn from_env() -> Self {
        let padrao = Config::default();
        Self {
            database_path: env::var("CLINIC_DATABASE_PATH").unwrap_or(padrao.database_path),
            bind_addr: env::var("CLINIC_BIND_ADDR").unwrap_or(padrao.bind_addr),
            jwt_secret: env::var("CLINIC_JWT_SECRET").unwrap_or(padrao.jwt_secret),
            token_ttl_minutos: env::var("CLINIC_TOKEN_TTL_MINUTOS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(padrao.token_ttl_minutos),
            db_max_connections: env::var("CLINIC_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(padrao.db_max_connections),
        }
    }
}
