//! # 퀴즈(Quiz) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET  /api/v1/quizzes`            → 내 퀴즈 목록
//! - `POST /api/v1/quizzes`            → 노트로 새 퀴즈 생성 (AI 호출)
//! - `POST /api/v1/quizzes/delete`     → 여러 퀴즈 일괄 삭제
//! - `GET  /api/v1/quizzes/{id}`       → 퀴즈 한 건 (문제 + 진행 상태)
//! - `POST /api/v1/quizzes/{id}/reset` → 결과 삭제 + 진행 상태 초기화
//!
//! 퀴즈 핸들러는 사용자를 `Option<AuthUser>`로 받습니다.
//! 토큰이 없다고 바로 401을 내지 않고, 권한 검사(services::guard)가
//! NotFound → Unauthenticated → Unauthorized 순서로 판단합니다.

// Arc: 여러 스레드가 같은 값을 공유하는 참조 카운트 포인터 (AI 클라이언트 공유용)
use std::sync::Arc;

use axum::{
    extract::{Path, State}, // Path: URL 경로 파라미터, State: 공유 상태 추출기
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::{self, ai::QuizAi},
};

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// SqlitePool과 Arc는 clone해도 같은 대상을 가리킵니다.
// #[derive(Clone)]: Axum은 요청마다 상태를 clone하므로 Clone이 필수입니다.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 커넥션 풀
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// 액세스 토큰 유효 시간(분)
    pub access_token_ttl_minutes: i64,
    /// dyn QuizAi: 트레이트 객체. 실행 시점에 실제 구현(OpenAI 클라이언트 등)이 정해집니다.
    /// 퀴즈 생성/피드백 모델. 테스트에서는 가짜 구현으로 교체됩니다.
    pub ai: Arc<dyn QuizAi>,
}

/// `GET /quizzes` → `{ "quizzes": [...] }`
pub async fn list_quizzes(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<Json<Value>, AppError> {
    // user.as_ref(): Option<AuthUser> → Option<&AuthUser> (소유권을 넘기지 않고 빌려줌)
    let quizzes = services::quizzes::list_quizzes(&state.pool, user.as_ref()).await?;
    Ok(Json(json!({ "quizzes": quizzes })))
}

/// `POST /quizzes`
///
/// 모델 호출이 끝날 때까지 응답하지 않으므로 수 초가 걸릴 수 있습니다.
///
/// # 반환값
/// - `Ok((201, Json<Quiz>))`: 생성된 퀴즈
/// - `Err(AppError::Validation)`: 노트가 비었거나 문제/선택지 수가 범위를 벗어남
/// - `Err(AppError::MissingApiKey)`: API 키 미등록
/// - `Err(AppError::ExternalService)`: 모델 호출 실패 또는 형식이 맞지 않는 응답
pub async fn create_quiz(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<(StatusCode, Json<Quiz>), AppError> {
    let quiz =
        services::quizzes::create_quiz(&state.pool, state.ai.as_ref(), user.as_ref(), req).await?;
    // (StatusCode, Json) 튜플: 상태 코드와 본문을 함께 반환
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// `GET /quizzes/{id}`
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = services::quizzes::get_quiz(&state.pool, &id, user.as_ref()).await?;
    Ok(Json(quiz))
}

/// `POST /quizzes/delete` → `{ "deleted": n }`
///
/// 하나라도 권한이 없으면 아무것도 삭제하지 않습니다.
pub async fn delete_quizzes(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(req): Json<DeleteQuizzesRequest>,
) -> Result<Json<Value>, AppError> {
    let deleted = services::quizzes::delete_quizzes(&state.pool, &req.ids, user.as_ref()).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// `POST /quizzes/{id}/reset` → 204
///
/// 결과 삭제와 진행 상태 초기화가 한 트랜잭션으로 처리됩니다.
pub async fn reset_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
) -> Result<StatusCode, AppError> {
    services::quizzes::reset_quiz(&state.pool, &id, user.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT) // 204: 본문 없이 성공
}
