//! # Quizdeck 웹 서버 진입점
//!
//! 노트로 객관식 퀴즈를 만들고, 풀고, 채점하는 API 서버입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성 + 마이그레이션
//! 4. AI 모델 클라이언트 생성
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작

use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use quizdeck::{config::Config, routes::*, services::ai::OpenAiClient};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 계속 진행
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizdeck=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Quizdeck server on {}:{}", config.host, config.port);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    let ai = OpenAiClient::new(
        config.ai_base_url.clone(),
        config.ai_model.clone(),
        config.ai_timeout_secs,
    )?;
    tracing::info!(model = %config.ai_model, base_url = %config.ai_base_url, "AI client ready");

    let state = AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        access_token_ttl_minutes: config.access_token_ttl_minutes,
        ai: Arc::new(ai),
    };

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me));

    let api_routes = Router::new()
        .merge(auth_routes)
        .route("/settings/api-key", get(get_api_key).put(put_api_key))
        .route("/quizzes", get(list_quizzes).post(create_quiz))
        .route("/quizzes/delete", post(delete_quizzes))
        .route("/quizzes/{id}", get(get_quiz))
        .route("/quizzes/{id}/advance", post(advance_question))
        .route("/quizzes/{id}/retreat", post(retreat_question))
        .route("/quizzes/{id}/complete", post(complete_quiz))
        .route("/quizzes/{id}/results", get(get_results))
        .route("/quizzes/{id}/reset", post(reset_quiz))
        .route("/health", get(health_check))
        .with_state(state);

    // 개발 환경 기준으로 모든 출처를 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
