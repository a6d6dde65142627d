//! Modelos de dados compartilhados entre aplicações
//!
//! Este módulo define as estruturas de dados principais usadas pelo ecossistema da clínica

mod consulta;
mod despesa;
mod horario;
mod lembrete;
mod paciente;
mod pagamento;
mod prontuario;
mod user;

pub use consulta::{Consulta, StatusConsulta, TipoConsulta};
pub use despesa::{CategoriaDespesa, Despesa, StatusDespesa};
pub use horario::{DiaSemana, HorarioDisponivel};
pub use lembrete::{LembreteWhatsApp, StatusLembrete};
pub use paciente::Paciente;
pub use pagamento::{MetodoPagamento, Pagamento, StatusPagamento};
pub use prontuario::Prontuario;
pub use user::{User, UserRole};
