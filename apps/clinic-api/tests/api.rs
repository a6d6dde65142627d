//! Testes de ponta a ponta da API sobre um banco em memória

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use clinic_api::auth::{criar_token, hash_senha};
use clinic_api::{app, AppState, Config};
use common_db::{init_db_pool, DbConfig};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

async fn servidor_de_teste() -> (Router, String, SqlitePool) {
    let pool = init_db_pool(&DbConfig::in_memory())
        .await
        .expect("banco em memória");
    let config = Config::default();

    // Usuário administrador para autenticar as requisições
    let admin_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, senha_hash, nome, role, crm, especialidade, ativo, created_at)
        VALUES (?, 'admin@clinica.com', ?, 'Administrador', 'admin', NULL, NULL, 1, ?)
        "#,
    )
    .bind(admin_id)
    .bind(hash_senha("admin").unwrap())
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let token = criar_token(admin_id, &config).unwrap();
    let state = AppState::new(pool.clone(), config);

    (app(state), token, pool)
}

fn requisicao(metodo: &str, uri: &str, token: &str, corpo: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(metodo)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match corpo {
        Some(corpo) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(corpo.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn corpo_json(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn criar_medico(app: &Router, token: &str, email: &str, crm: &str) -> Uuid {
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/medicos",
            token,
            Some(json!({
                "email": email,
                "password": "medico",
                "nome": "Dr. João Silva",
                "crm": crm,
                "especialidade": "Cardiologia",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let corpo = corpo_json(response).await;
    corpo["id"].as_str().unwrap().parse().unwrap()
}

async fn criar_paciente(app: &Router, token: &str, cpf: &str) -> Uuid {
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/pacientes",
            token,
            Some(json!({
                "nome": "Ana Silva",
                "cpf": cpf,
                "data_nascimento": "1990-05-15",
                "telefone": "(11) 99999-4444",
                "whatsapp": "5511999994444",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let corpo = corpo_json(response).await;
    corpo["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = servidor_de_teste().await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["status"], "healthy");
}

#[tokio::test]
async fn test_rota_protegida_sem_token() {
    let (app, _, _) = servidor_de_teste().await;

    let response = app
        .oneshot(Request::get("/api/v1/pacientes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_login_e_me() {
    let (app, _, _) = servidor_de_teste().await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "admin@clinica.com", "password": "admin" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["token_type"], "bearer");
    let token = corpo["access_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(requisicao("GET", "/api/v1/auth/me", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["email"], "admin@clinica.com");
    // O hash da senha nunca aparece na resposta
    assert!(corpo.get("senha_hash").is_none());
}

#[tokio::test]
async fn test_login_com_senha_errada() {
    let (app, _, _) = servidor_de_teste().await;

    let response = app
        .oneshot(
            Request::post("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "admin@clinica.com", "password": "errada" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["detail"], "Email/usuário ou senha incorretos");
}

#[tokio::test]
async fn test_crud_de_paciente() {
    let (app, token, _) = servidor_de_teste().await;

    let id = criar_paciente(&app, &token, "12345678900").await;

    // CPF duplicado
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/pacientes",
            &token,
            Some(json!({
                "nome": "Outra Pessoa",
                "cpf": "12345678900",
                "data_nascimento": "1980-01-01",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["detail"], "CPF já cadastrado");

    // Atualização parcial
    let response = app
        .clone()
        .oneshot(requisicao(
            "PUT",
            &format!("/api/v1/pacientes/{}", id),
            &token,
            Some(json!({ "cidade": "Campinas" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["cidade"], "Campinas");
    assert_eq!(corpo["nome"], "Ana Silva");

    // Exclusão lógica
    let response = app
        .clone()
        .oneshot(requisicao(
            "DELETE",
            &format!("/api/v1/pacientes/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(requisicao(
            "GET",
            &format!("/api/v1/pacientes/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_busca_de_pacientes() {
    let (app, token, _) = servidor_de_teste().await;

    criar_paciente(&app, &token, "12345678900").await;

    let response = app
        .clone()
        .oneshot(requisicao("GET", "/api/v1/pacientes?search=ana", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["total"], 1);

    let response = app
        .oneshot(requisicao(
            "GET",
            "/api/v1/pacientes?search=inexistente",
            &token,
            None,
        ))
        .await
        .unwrap();
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["total"], 0);
}

#[tokio::test]
async fn test_conflito_de_agendamento() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    let agendar = |data_hora: &str| {
        requisicao(
            "POST",
            "/api/v1/consultas",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data_hora": data_hora,
                "duracao_minutos": 60,
            })),
        )
    };

    let response = app.clone().oneshot(agendar("2026-09-01T10:00:00Z")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Sobreposição parcial com a consulta existente
    let response = app.clone().oneshot(agendar("2026-09-01T10:30:00Z")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["detail"], "Horário já ocupado por outra consulta");

    // Intervalos adjacentes não conflitam
    let response = app.clone().oneshot(agendar("2026-09-01T11:00:00Z")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancelamento_libera_horario() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    let corpo_consulta = json!({
        "paciente_id": paciente_id,
        "medico_id": medico_id,
        "data_hora": "2026-09-01T10:00:00Z",
    });

    let response = app
        .clone()
        .oneshot(requisicao("POST", "/api/v1/consultas", &token, Some(corpo_consulta.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let consulta = corpo_json(response).await;
    let consulta_id = consulta["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(requisicao(
            "DELETE",
            &format!("/api/v1/consultas/{}", consulta_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Mesmo horário volta a estar livre
    let response = app
        .oneshot(requisicao("POST", "/api/v1/consultas", &token, Some(corpo_consulta)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_horarios_do_medico_e_slots() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;

    // Grade semanal: terça, 08:00 às 10:00
    let response = app
        .clone()
        .oneshot(requisicao(
            "PUT",
            &format!("/api/v1/medicos/{}/horarios", medico_id),
            &token,
            Some(json!([
                { "dia_semana": "terca", "hora_inicio": "08:00:00", "hora_fim": "10:00:00" }
            ])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 2026-09-01 é uma terça-feira
    let response = app
        .clone()
        .oneshot(requisicao(
            "GET",
            &format!(
                "/api/v1/consultas/horarios-disponiveis/?medico_id={}&data=2026-09-01",
                medico_id
            ),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let slots = corpo_json(response).await;
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|s| s["disponivel"] == true));

    // Ocupa o primeiro slot
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/consultas",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data_hora": "2026-09-01T08:00:00Z",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(requisicao(
            "GET",
            &format!(
                "/api/v1/consultas/horarios-disponiveis/?medico_id={}&data=2026-09-01",
                medico_id
            ),
            &token,
            None,
        ))
        .await
        .unwrap();
    let slots = corpo_json(response).await;
    let slots = slots.as_array().unwrap();
    assert_eq!(slots[0]["disponivel"], false);
    assert_eq!(slots[1]["disponivel"], true);
}

#[tokio::test]
async fn test_grade_com_horario_invalido() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;

    let response = app
        .oneshot(requisicao(
            "PUT",
            &format!("/api/v1/medicos/{}/horarios", medico_id),
            &token,
            Some(json!([
                { "dia_semana": "terca", "hora_inicio": "10:00:00", "hora_fim": "08:00:00" }
            ])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fluxo_financeiro() {
    let (app, token, _) = servidor_de_teste().await;

    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/financeiro/pagamentos",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "valor_centavos": 25000,
                "metodo": "pix",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let pagamento = corpo_json(response).await;
    assert_eq!(pagamento["status"], "pendente");
    let pagamento_id = pagamento["id"].as_str().unwrap();

    // Quitação
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            &format!("/api/v1/financeiro/pagamentos/{}/pagar", pagamento_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pago = corpo_json(response).await;
    assert_eq!(pago["status"], "pago");
    assert!(!pago["data_pagamento"].is_null());

    // O relatório do dia reflete o pagamento quitado
    let hoje = Utc::now().date_naive();
    let response = app
        .oneshot(requisicao(
            "GET",
            &format!(
                "/api/v1/financeiro/relatorio?data_inicio={}&data_fim={}",
                hoje, hoje
            ),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let relatorio = corpo_json(response).await;
    assert_eq!(relatorio["total_recebido_centavos"], 25000);
    assert_eq!(relatorio["quantidade_pagamentos"], 1);
    assert_eq!(relatorio["pagamentos_por_metodo"]["pix"], 25000);
}

#[tokio::test]
async fn test_despesa_quitada_recebe_data_pagamento() {
    let (app, token, _) = servidor_de_teste().await;

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/despesas",
            &token,
            Some(json!({
                "descricao": "Aluguel do consultório",
                "categoria": "aluguel",
                "valor_centavos": 450000,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let despesa = corpo_json(response).await;
    let despesa_id = despesa["id"].as_str().unwrap();
    assert!(despesa["data_pagamento"].is_null());

    let response = app
        .oneshot(requisicao(
            "PATCH",
            &format!("/api/v1/despesas/{}/status", despesa_id),
            &token,
            Some(json!({ "status": "pago" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quitada = corpo_json(response).await;
    assert_eq!(quitada["status"], "pago");
    assert!(!quitada["data_pagamento"].is_null());
}

#[tokio::test]
async fn test_lembrete_exige_whatsapp() {
    let (app, token, pool) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;

    // Paciente sem WhatsApp cadastrado
    let paciente_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO pacientes (id, nome, cpf, data_nascimento, ativo, created_at)
        VALUES (?, 'Carlos Oliveira', '98765432100', '1985-08-22', 1, ?)
        "#,
    )
    .bind(paciente_id)
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/consultas",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data_hora": "2026-09-01T10:00:00Z",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let consulta = corpo_json(response).await;
    let consulta_id = consulta["id"].as_str().unwrap();

    let response = app
        .oneshot(requisicao(
            "POST",
            &format!("/api/v1/lembretes/enviar/{}", consulta_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["detail"], "Paciente não possui WhatsApp cadastrado");
}

#[tokio::test]
async fn test_lembrete_enfileirado_e_duplicado() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/consultas",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data_hora": "2026-09-01T10:00:00Z",
            })),
        ))
        .await
        .unwrap();
    let consulta = corpo_json(response).await;
    let consulta_id = consulta["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            &format!("/api/v1/lembretes/enviar/{}", consulta_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    let lembrete_id = corpo["lembrete_id"].as_str().unwrap().to_string();

    // Segundo lembrete dentro de 24h é recusado
    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            &format!("/api/v1/lembretes/enviar/{}", consulta_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // O lembrete pendente pode ser cancelado
    let response = app
        .oneshot(requisicao(
            "DELETE",
            &format!("/api/v1/lembretes/{}", lembrete_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_estatisticas() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    app.clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/consultas",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data_hora": "2026-09-01T10:00:00Z",
            })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(requisicao("GET", "/api/v1/dashboard/estatisticas", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["estatisticas"]["total_pacientes"], 1);
    assert_eq!(corpo["estatisticas"]["total_medicos"], 1);
    assert_eq!(corpo["estatisticas"]["consultas_pendentes"], 1);
    assert_eq!(corpo["grafico_consultas"].as_array().unwrap().len(), 30);

    let response = app
        .oneshot(requisicao("GET", "/api/v1/dashboard/metricas-rapidas", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["consultas_pendentes"], 1);
}

#[tokio::test]
async fn test_prontuario_e_historico() {
    let (app, token, _) = servidor_de_teste().await;

    let medico_id = criar_medico(&app, &token, "joao@clinica.com", "123456").await;
    let paciente_id = criar_paciente(&app, &token, "12345678900").await;

    let response = app
        .clone()
        .oneshot(requisicao(
            "POST",
            "/api/v1/prontuarios",
            &token,
            Some(json!({
                "paciente_id": paciente_id,
                "medico_id": medico_id,
                "data": "2026-08-20T14:00:00Z",
                "anamnese": "Paciente relata dor torácica.",
                "diagnostico": "Angina estável",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let prontuario = corpo_json(response).await;
    let prontuario_id = prontuario["id"].as_str().unwrap();

    // Versão HTML para impressão
    let response = app
        .clone()
        .oneshot(requisicao(
            "GET",
            &format!("/api/v1/prontuarios/{}/html", prontuario_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Angina estável"));
    assert!(html.contains("Ana Silva"));

    // Histórico do paciente inclui o prontuário
    let response = app
        .oneshot(requisicao(
            "GET",
            &format!("/api/v1/pacientes/{}/historico", paciente_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let corpo = corpo_json(response).await;
    assert_eq!(corpo["prontuarios"].as_array().unwrap().len(), 1);
}
