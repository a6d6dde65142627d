use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Papéis possíveis de um usuário do sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Medico,
    Recepcionista,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Medico => write!(f, "medico"),
            UserRole::Recepcionista => write!(f, "recepcionista"),
        }
    }
}

/// Usuário do sistema (admin, médico ou recepcionista)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Hash argon2id da senha; nunca serializado em respostas
    #[serde(skip_serializing)]
    pub senha_hash: String,
    pub nome: String,
    pub role: UserRole,
    /// Registro no conselho de medicina, apenas para médicos
    pub crm: Option<String>,
    pub especialidade: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(UserRole::Medico.to_string(), "medico");
        assert_eq!(UserRole::Recepcionista.to_string(), "recepcionista");
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: UserRole = serde_json::from_str("\"medico\"").unwrap();
        assert_eq!(role, UserRole::Medico);
    }
}
