//! Popula o banco com dados de demonstração
//!
//! Idempotente: usuários são identificados por email, pacientes por CPF;
//! registros existentes não são recriados

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use clinic_api::auth::hash_senha;
use clinic_api::Config;
use common_db::models::{DiaSemana, UserRole};
use common_db::{init_db_pool, DbConfig};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

struct UsuarioSeed {
    email: &'static str,
    senha: &'static str,
    nome: &'static str,
    role: UserRole,
    crm: Option<&'static str>,
    especialidade: Option<&'static str>,
}

struct PacienteSeed {
    nome: &'static str,
    cpf: &'static str,
    data_nascimento: (i32, u32, u32),
    telefone: &'static str,
    whatsapp: &'static str,
    email: &'static str,
    endereco: &'static str,
    cidade: &'static str,
    convenio: &'static str,
}

const USUARIOS: &[UsuarioSeed] = &[
    UsuarioSeed {
        email: "admin@clinica.com",
        senha: "admin",
        nome: "Administrador",
        role: UserRole::Admin,
        crm: None,
        especialidade: None,
    },
    UsuarioSeed {
        email: "recepcao@clinica.com",
        senha: "recepcao",
        nome: "Maria Santos",
        role: UserRole::Recepcionista,
        crm: None,
        especialidade: None,
    },
    UsuarioSeed {
        email: "joao.silva@clinica.com",
        senha: "medico",
        nome: "Dr. João Silva",
        role: UserRole::Medico,
        crm: Some("654321"),
        especialidade: Some("Cardiologia"),
    },
    UsuarioSeed {
        email: "maria.santos@clinica.com",
        senha: "medico",
        nome: "Dra. Maria Santos",
        role: UserRole::Medico,
        crm: Some("789012"),
        especialidade: Some("Dermatologia"),
    },
    UsuarioSeed {
        email: "pedro.costa@clinica.com",
        senha: "medico",
        nome: "Dr. Pedro Costa",
        role: UserRole::Medico,
        crm: Some("345678"),
        especialidade: Some("Ortopedia"),
    },
];

const PACIENTES: &[PacienteSeed] = &[
    PacienteSeed {
        nome: "Ana Silva",
        cpf: "12345678900",
        data_nascimento: (1990, 5, 15),
        telefone: "(11) 99999-4444",
        whatsapp: "5511999994444",
        email: "ana.silva@email.com",
        endereco: "Rua A, 123",
        cidade: "São Paulo",
        convenio: "Unimed",
    },
    PacienteSeed {
        nome: "Carlos Oliveira",
        cpf: "98765432100",
        data_nascimento: (1985, 8, 22),
        telefone: "(11) 99999-5555",
        whatsapp: "5511999995555",
        email: "carlos.oliveira@email.com",
        endereco: "Rua B, 456",
        cidade: "São Paulo",
        convenio: "Bradesco Saúde",
    },
    PacienteSeed {
        nome: "Mariana Costa",
        cpf: "45678912300",
        data_nascimento: (1992, 12, 10),
        telefone: "(11) 99999-6666",
        whatsapp: "5511999996666",
        email: "mariana.costa@email.com",
        endereco: "Rua C, 789",
        cidade: "São Paulo",
        convenio: "SulAmérica",
    },
];

async fn garantir_usuario(pool: &SqlitePool, u: &UsuarioSeed) -> Result<Uuid> {
    let existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(u.email)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existente {
        info!("Usuário já existe: {}", u.email);
        return Ok(id);
    }

    let id = Uuid::new_v4();
    let senha_hash = hash_senha(u.senha).map_err(|e| anyhow::anyhow!("{}", e))?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, senha_hash, nome, role, crm, especialidade, ativo, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(id)
    .bind(u.email)
    .bind(&senha_hash)
    .bind(u.nome)
    .bind(u.role)
    .bind(u.crm)
    .bind(u.especialidade)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("Falha ao criar usuário {}", u.email))?;

    info!("Usuário criado: {}", u.email);
    Ok(id)
}

async fn garantir_paciente(pool: &SqlitePool, p: &PacienteSeed) -> Result<Uuid> {
    let existente: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM pacientes WHERE cpf = ?")
        .bind(p.cpf)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existente {
        info!("Paciente já existe: {}", p.nome);
        return Ok(id);
    }

    let id = Uuid::new_v4();
    let (ano, mes, dia) = p.data_nascimento;
    let nascimento = NaiveDate::from_ymd_opt(ano, mes, dia)
        .with_context(|| format!("Data de nascimento inválida para {}", p.nome))?;

    sqlx::query(
        r#"
        INSERT INTO pacientes
            (id, nome, cpf, data_nascimento, telefone, whatsapp, email, endereco,
             cidade, estado, cep, convenio, numero_carteirinha, ativo, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'SP', NULL, ?, NULL, 1, ?)
        "#,
    )
    .bind(id)
    .bind(p.nome)
    .bind(p.cpf)
    .bind(nascimento)
    .bind(p.telefone)
    .bind(p.whatsapp)
    .bind(p.email)
    .bind(p.endereco)
    .bind(p.cidade)
    .bind(p.convenio)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("Falha ao criar paciente {}", p.nome))?;

    info!("Paciente criado: {}", p.nome);
    Ok(id)
}

async fn garantir_horarios(pool: &SqlitePool, medico_id: Uuid) -> Result<()> {
    let existentes: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM horarios_disponiveis WHERE medico_id = ?")
            .bind(medico_id)
            .fetch_one(pool)
            .await?;
    if existentes > 0 {
        return Ok(());
    }

    // Segunda a sexta, 08:00-12:00 e 14:00-18:00
    let dias = [
        DiaSemana::Segunda,
        DiaSemana::Terca,
        DiaSemana::Quarta,
        DiaSemana::Quinta,
        DiaSemana::Sexta,
    ];
    let janelas = [
        (NaiveTime::from_hms_opt(8, 0, 0).unwrap(), NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
        (NaiveTime::from_hms_opt(14, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
    ];

    for dia in dias {
        for (inicio, fim) in janelas {
            sqlx::query(
                r#"
                INSERT INTO horarios_disponiveis (id, medico_id, dia_semana, hora_inicio, hora_fim, ativo)
                VALUES (?, ?, ?, ?, ?, 1)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(medico_id)
            .bind(dia)
            .bind(inicio)
            .bind(fim)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

async fn criar_consulta_demo(
    pool: &SqlitePool,
    paciente_id: Uuid,
    medico_id: Uuid,
    data_hora: DateTime<Utc>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO consultas
            (id, paciente_id, medico_id, data_hora, duracao_minutos, tipo, status, observacoes, created_at)
        VALUES (?, ?, ?, ?, 60, 'primeira_consulta', 'agendada', NULL, ?)
        "#,
    )
    .bind(id)
    .bind(paciente_id)
    .bind(medico_id)
    .bind(data_hora)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(id)
}

async fn criar_pagamento_demo(
    pool: &SqlitePool,
    paciente_id: Uuid,
    medico_id: Uuid,
    consulta_id: Uuid,
    valor_centavos: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pagamentos
            (id, paciente_id, medico_id, consulta_id, valor_centavos, metodo, status,
             data_vencimento, data_pagamento, observacoes, created_at)
        VALUES (?, ?, ?, ?, ?, 'pix', 'pendente', ?, NULL, NULL, ?)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(paciente_id)
    .bind(medico_id)
    .bind(consulta_id)
    .bind(valor_centavos)
    .bind((Utc::now() + Duration::days(7)).date_naive())
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

async fn criar_despesa_demo(pool: &SqlitePool) -> Result<()> {
    let existentes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM despesas")
        .fetch_one(pool)
        .await?;
    if existentes > 0 {
        return Ok(());
    }

    let despesas: [(&str, &str, i64); 3] = [
        ("Aluguel do consultório", "aluguel", 450_000),
        ("Material de limpeza", "limpeza", 25_000),
        ("Conta de energia", "energia", 38_000),
    ];

    for (descricao, categoria, valor_centavos) in despesas {
        sqlx::query(
            r#"
            INSERT INTO despesas
                (id, descricao, categoria, valor_centavos, data_vencimento, data_pagamento,
                 status, observacoes, fornecedor, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, 'pendente', NULL, NULL, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(descricao)
        .bind(categoria)
        .bind(valor_centavos)
        .bind((Utc::now() + Duration::days(10)).date_naive())
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let pool = init_db_pool(&DbConfig {
        db_path: config.database_path.clone(),
        max_connections: 1,
    })
    .await?;

    let mut medicos = Vec::new();
    for usuario in USUARIOS {
        let id = garantir_usuario(&pool, usuario).await?;
        if usuario.role == UserRole::Medico {
            medicos.push(id);
        }
    }

    for medico_id in &medicos {
        garantir_horarios(&pool, *medico_id).await?;
    }

    let mut pacientes = Vec::new();
    for paciente in PACIENTES {
        pacientes.push(garantir_paciente(&pool, paciente).await?);
    }

    // Algumas consultas futuras com pagamento pendente, uma por paciente
    let consultas_existentes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consultas")
        .fetch_one(&pool)
        .await?;
    if consultas_existentes == 0 {
        for (i, paciente_id) in pacientes.iter().enumerate() {
            let medico_id = medicos[i % medicos.len()];
            let data_hora = (Utc::now() + Duration::days(i as i64 + 1))
                .date_naive()
                .and_hms_opt(9 + i as u32, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt))
                .context("Horário de demonstração inválido")?;

            let consulta_id = criar_consulta_demo(&pool, *paciente_id, medico_id, data_hora).await?;
            criar_pagamento_demo(&pool, *paciente_id, medico_id, consulta_id, 25_000).await?;
        }
    }

    criar_despesa_demo(&pool).await?;

    info!("Dados de demonstração criados com sucesso");
    Ok(())
}
