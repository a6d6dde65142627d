//! Sistema de migrações para banco de dados
//!
//! Este módulo gerencia as migrações do banco de dados SQLite

use anyhow::{Context, Result};
use sqlx::{Executor, SqlitePool};
use tracing::{error, info};

/// Lista de migrações SQL a serem aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_initial_schema.sql
    r#"
    -- Usuários do sistema (admin, médicos, recepcionistas)
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        senha_hash TEXT NOT NULL,
        nome TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'recepcionista' CHECK (role IN ('admin', 'medico', 'recepcionista')),
        crm TEXT UNIQUE,
        especialidade TEXT,
        ativo BOOLEAN NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP
    );

    -- Pacientes da clínica
    CREATE TABLE IF NOT EXISTS pacientes (
        id BLOB PRIMARY KEY NOT NULL,
        nome TEXT NOT NULL,
        cpf TEXT NOT NULL UNIQUE,
        data_nascimento DATE NOT NULL,
        telefone TEXT,
        whatsapp TEXT,
        email TEXT,
        endereco TEXT,
        cidade TEXT,
        estado TEXT,
        cep TEXT,
        convenio TEXT,
        numero_carteirinha TEXT,
        ativo BOOLEAN NOT NULL DEFAULT 1,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP
    );

    -- Consultas agendadas
    CREATE TABLE IF NOT EXISTS consultas (
        id BLOB PRIMARY KEY NOT NULL,
        paciente_id BLOB NOT NULL,
        medico_id BLOB NOT NULL,
        data_hora TIMESTAMP NOT NULL,
        duracao_minutos INTEGER NOT NULL DEFAULT 60,
        tipo TEXT NOT NULL DEFAULT 'primeira_consulta' CHECK (tipo IN ('primeira_consulta', 'retorno', 'exame')),
        status TEXT NOT NULL DEFAULT 'agendada' CHECK (status IN ('agendada', 'confirmada', 'realizada', 'cancelada')),
        observacoes TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP,
        FOREIGN KEY (paciente_id) REFERENCES pacientes (id),
        FOREIGN KEY (medico_id) REFERENCES users (id)
    );

    -- Prontuários médicos
    CREATE TABLE IF NOT EXISTS prontuarios (
        id BLOB PRIMARY KEY NOT NULL,
        paciente_id BLOB NOT NULL,
        consulta_id BLOB,
        medico_id BLOB NOT NULL,
        data TIMESTAMP NOT NULL,
        anamnese TEXT,
        diagnostico TEXT,
        prescricao TEXT,
        exames_solicitados TEXT,
        observacoes TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP,
        FOREIGN KEY (paciente_id) REFERENCES pacientes (id),
        FOREIGN KEY (consulta_id) REFERENCES consultas (id),
        FOREIGN KEY (medico_id) REFERENCES users (id)
    );

    -- Pagamentos (valores em centavos para evitar arredondamento)
    CREATE TABLE IF NOT EXISTS pagamentos (
        id BLOB PRIMARY KEY NOT NULL,
        paciente_id BLOB NOT NULL,
        medico_id BLOB,
        consulta_id BLOB,
        valor_centavos INTEGER NOT NULL,
        metodo TEXT NOT NULL CHECK (metodo IN ('dinheiro', 'cartao_credito', 'cartao_debito', 'pix', 'transferencia', 'convenio')),
        status TEXT NOT NULL DEFAULT 'pendente' CHECK (status IN ('pendente', 'pago', 'cancelado')),
        data_vencimento DATE,
        data_pagamento TIMESTAMP,
        observacoes TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP,
        FOREIGN KEY (paciente_id) REFERENCES pacientes (id),
        FOREIGN KEY (medico_id) REFERENCES users (id),
        FOREIGN KEY (consulta_id) REFERENCES consultas (id)
    );

    -- Horários de atendimento semanais dos médicos
    CREATE TABLE IF NOT EXISTS horarios_disponiveis (
        id BLOB PRIMARY KEY NOT NULL,
        medico_id BLOB NOT NULL,
        dia_semana TEXT NOT NULL CHECK (dia_semana IN ('segunda', 'terca', 'quarta', 'quinta', 'sexta', 'sabado', 'domingo')),
        hora_inicio TIME NOT NULL,
        hora_fim TIME NOT NULL,
        ativo BOOLEAN NOT NULL DEFAULT 1,
        FOREIGN KEY (medico_id) REFERENCES users (id)
    );

    -- Lembretes enviados via WhatsApp
    CREATE TABLE IF NOT EXISTS lembretes_whatsapp (
        id BLOB PRIMARY KEY NOT NULL,
        paciente_id BLOB NOT NULL,
        consulta_id BLOB NOT NULL,
        mensagem TEXT NOT NULL,
        data_envio_programada TIMESTAMP NOT NULL,
        data_enviado TIMESTAMP,
        status TEXT NOT NULL DEFAULT 'pendente' CHECK (status IN ('pendente', 'enviado', 'falhou', 'cancelado')),
        tentativas INTEGER NOT NULL DEFAULT 0,
        erro TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP,
        FOREIGN KEY (paciente_id) REFERENCES pacientes (id),
        FOREIGN KEY (consulta_id) REFERENCES consultas (id)
    );

    -- Índices para otimização
    CREATE INDEX IF NOT EXISTS idx_pacientes_cpf ON pacientes (cpf);
    CREATE INDEX IF NOT EXISTS idx_consultas_paciente_id ON consultas (paciente_id);
    CREATE INDEX IF NOT EXISTS idx_consultas_medico_id ON consultas (medico_id);
    CREATE INDEX IF NOT EXISTS idx_consultas_data_hora ON consultas (data_hora);
    CREATE INDEX IF NOT EXISTS idx_consultas_status ON consultas (status);
    CREATE INDEX IF NOT EXISTS idx_prontuarios_paciente_id ON prontuarios (paciente_id);
    CREATE INDEX IF NOT EXISTS idx_pagamentos_paciente_id ON pagamentos (paciente_id);
    CREATE INDEX IF NOT EXISTS idx_pagamentos_status ON pagamentos (status);
    CREATE INDEX IF NOT EXISTS idx_horarios_medico_id ON horarios_disponiveis (medico_id);
    CREATE INDEX IF NOT EXISTS idx_lembretes_consulta_id ON lembretes_whatsapp (consulta_id);
    CREATE INDEX IF NOT EXISTS idx_lembretes_status ON lembretes_whatsapp (status);
    "#,
    // 002_despesas.sql
    r#"
    -- Despesas operacionais da clínica
    CREATE TABLE IF NOT EXISTS despesas (
        id BLOB PRIMARY KEY NOT NULL,
        descricao TEXT NOT NULL,
        categoria TEXT NOT NULL CHECK (categoria IN ('aluguel', 'salarios', 'equipamentos', 'medicamentos', 'limpeza', 'energia', 'agua', 'telefone', 'internet', 'manutencao', 'outros')),
        valor_centavos INTEGER NOT NULL,
        data_vencimento DATE,
        data_pagamento TIMESTAMP,
        status TEXT NOT NULL DEFAULT 'pendente' CHECK (status IN ('pendente', 'pago', 'cancelado')),
        observacoes TEXT,
        fornecedor TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_despesas_categoria ON despesas (categoria);
    CREATE INDEX IF NOT EXISTS idx_despesas_status ON despesas (status);
    CREATE INDEX IF NOT EXISTS idx_despesas_data_vencimento ON despesas (data_vencimento);
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    // Obter a versão atual do banco de dados
    let mut version: i64 = 0;
    match sqlx::query_scalar("PRAGMA user_version").fetch_one(pool).await {
        Ok(v) => version = v,
        Err(e) => {
            error!("Erro ao obter versão do banco: {}", e);
            // Continuar mesmo assim, pois pode ser a primeira execução
        }
    }

    info!("Versão atual do banco: {}", version);

    // Aplicar cada migração pendente sequencialmente
    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        // Pular migrações já aplicadas
        if migration_version <= version {
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        // Executar em uma transação para garantir atomicidade
        let mut transaction = pool
            .begin()
            .await
            .with_context(|| format!("Falha ao iniciar transação para migração {}", migration_version))?;

        // Execução não-preparada: o lote pode conter vários comandos SQL
        (&mut *transaction)
            .execute(*migration_sql)
            .await
            .with_context(|| format!("Falha ao executar migração {}", migration_version))?;

        // Atualizar versão do banco
        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao atualizar versão para {}", migration_version))?;

        transaction
            .commit()
            .await
            .with_context(|| format!("Falha ao confirmar transação para migração {}", migration_version))?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::SqlitePool;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_migrations() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migrations.db");

        let conn_options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(conn_options).await?;

        run_migrations(&pool).await?;

        // Verificar versão do banco
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await?;
        assert_eq!(version, MIGRATIONS.len() as i64);

        // Verificar se tabelas foram criadas
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&pool)
        .await?;

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"pacientes".to_string()));
        assert!(tables.contains(&"consultas".to_string()));
        assert!(tables.contains(&"prontuarios".to_string()));
        assert!(tables.contains(&"pagamentos".to_string()));
        assert!(tables.contains(&"despesas".to_string()));
        assert!(tables.contains(&"lembretes_whatsapp".to_string()));
        assert!(tables.contains(&"horarios_disponiveis".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_migrations_idempotentes() -> Result<()> {
        let pool = SqlitePool::connect(":memory:").await?;

        run_migrations(&pool).await?;
        // Segunda execução não deve reaplicar nada
        run_migrations(&pool).await?;

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await?;
        assert_eq!(version, MIGRATIONS.len() as i64);

        Ok(())
    }
}
