use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Métodos de pagamento aceitos pela clínica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MetodoPagamento {
    Dinheiro,
    CartaoCredito,
    CartaoDebito,
    Pix,
    Transferencia,
    Convenio,
}

impl MetodoPagamento {
    /// Todos os métodos, na ordem usada pelos relatórios
    pub const TODOS: [MetodoPagamento; 6] = [
        MetodoPagamento::Dinheiro,
        MetodoPagamento::CartaoCredito,
        MetodoPagamento::CartaoDebito,
        MetodoPagamento::Pix,
        MetodoPagamento::Transferencia,
        MetodoPagamento::Convenio,
    ];
}

impl std::fmt::Display for MetodoPagamento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetodoPagamento::Dinheiro => write!(f, "dinheiro"),
            MetodoPagamento::CartaoCredito => write!(f, "cartao_credito"),
            MetodoPagamento::CartaoDebito => write!(f, "cartao_debito"),
            MetodoPagamento::Pix => write!(f, "pix"),
            MetodoPagamento::Transferencia => write!(f, "transferencia"),
            MetodoPagamento::Convenio => write!(f, "convenio"),
        }
    }
}

/// Status possíveis de um pagamento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatusPagamento {
    Pendente,
    Pago,
    Cancelado,
}

impl StatusPagamento {
    pub const TODOS: [StatusPagamento; 3] = [
        StatusPagamento::Pendente,
        StatusPagamento::Pago,
        StatusPagamento::Cancelado,
    ];
}

impl std::fmt::Display for StatusPagamento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusPagamento::Pendente => write!(f, "pendente"),
            StatusPagamento::Pago => write!(f, "pago"),
            StatusPagamento::Cancelado => write!(f, "cancelado"),
        }
    }
}

/// Pagamento de um atendimento ou serviço
///
/// Valores sempre em centavos para evitar erros de arredondamento
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pagamento {
    pub id: Uuid,
    pub paciente_id: Uuid,
    pub medico_id: Option<Uuid>,
    pub consulta_id: Option<Uuid>,
    pub valor_centavos: i64,
    pub metodo: MetodoPagamento,
    pub status: StatusPagamento,
    pub data_vencimento: Option<NaiveDate>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
