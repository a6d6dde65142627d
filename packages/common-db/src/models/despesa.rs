use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categorias de despesa operacional
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CategoriaDespesa {
    Aluguel,
    Salarios,
    Equipamentos,
    Medicamentos,
    Limpeza,
    Energia,
    Agua,
    Telefone,
    Internet,
    Manutencao,
    Outros,
}

impl std::fmt::Display for CategoriaDespesa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CategoriaDespesa::Aluguel => "aluguel",
            CategoriaDespesa::Salarios => "salarios",
            CategoriaDespesa::Equipamentos => "equipamentos",
            CategoriaDespesa::Medicamentos => "medicamentos",
            CategoriaDespesa::Limpeza => "limpeza",
            CategoriaDespesa::Energia => "energia",
            CategoriaDespesa::Agua => "agua",
            CategoriaDespesa::Telefone => "telefone",
            CategoriaDespesa::Internet => "internet",
            CategoriaDespesa::Manutencao => "manutencao",
            CategoriaDespesa::Outros => "outros",
        };
        write!(f, "{}", s)
    }
}

/// Status possíveis de uma despesa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatusDespesa {
    Pendente,
    Pago,
    Cancelado,
}

impl std::fmt::Display for StatusDespesa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusDespesa::Pendente => write!(f, "pendente"),
            StatusDespesa::Pago => write!(f, "pago"),
            StatusDespesa::Cancelado => write!(f, "cancelado"),
        }
    }
}

/// Despesa operacional da clínica
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Despesa {
    pub id: Uuid,
    pub descricao: String,
    pub categoria: CategoriaDespesa,
    pub valor_centavos: i64,
    pub data_vencimento: Option<NaiveDate>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub status: StatusDespesa,
    pub observacoes: Option<String>,
    pub fornecedor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
