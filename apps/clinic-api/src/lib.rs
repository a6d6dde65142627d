//! Clinic API - Backend REST do sistema de gerenciamento de clínica médica
//!
//! Expõe a API versionada em `/api/v1` com autenticação JWT, cadastro de
//! pacientes e médicos, agendamento de consultas, prontuários, financeiro,
//! despesas, fila de lembretes de WhatsApp e dashboard.

pub mod agenda;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::app;
pub use state::AppState;
