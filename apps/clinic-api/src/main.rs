use anyhow::{Context, Result};
use clinic_api::{app, AppState, Config};
use common_db::{init_db_pool, DbConfig};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clinic_api=info,common_db=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let db_config = DbConfig {
        db_path: config.database_path.clone(),
        max_connections: config.db_max_connections,
    };
    let pool = init_db_pool(&db_config).await?;

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Endereço de escuta inválido: {}", config.bind_addr))?;

    info!("Clinic API ouvindo em http://{}", addr);

    let state = AppState::new(pool, config);

    axum::Server::bind(&addr)
        .serve(app(state).into_make_service())
        .await
        .context("Servidor HTTP encerrou com erro")?;

    Ok(())
}
