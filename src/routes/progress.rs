//! # 퀴즈 풀이 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/quizzes/{id}/advance`  → 답안 기록 후 다음 문제로
//! - `POST /api/v1/quizzes/{id}/retreat`  → 이전 문제로
//! - `POST /api/v1/quizzes/{id}/complete` → 마지막 답안 기록 + 채점 + 피드백
//! - `GET  /api/v1/quizzes/{id}/results`  → 결과 화면 (완료 전에는 404)
//!
//! advance/retreat 응답에는 서버가 확정한 `progress`가 들어 있어
//! 클라이언트 미러가 예측값을 이 값으로 교체합니다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::quizzes::AppState,
    services,
};

/// `POST /quizzes/{id}/advance` → `{ progress, answer }`
///
/// # 매개변수
/// - `Path(id)`: URL 경로의 `{id}` 부분 (퀴즈 ID)
/// - `user: Option<AuthUser>`: 토큰이 없어도 핸들러는 실행됩니다.
///   None이면 서비스 계층의 권한 검사가 Unauthenticated를 반환합니다
///   (퀴즈가 없으면 404가 먼저 나가도록 순서를 지키기 위함).
/// - `Json(req)`: 선택한 선택지 ID와 선택적 `expected_version`
pub async fn advance_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let response = services::progress::advance_question(
        &state.pool,
        &id,
        user.as_ref(),
        &req.selected_option_id,
        req.expected_version,
    )
    .await?; // ?: 서비스 에러(Conflict, AlreadyCompleted 등)는 그대로 HTTP 응답으로 변환
    Ok(Json(response))
}

/// `POST /quizzes/{id}/retreat` → `{ progress, question_id }`
///
/// 본문은 생략할 수 있습니다 (`expected_version` 없이 마지막 쓰기 우선).
pub async fn retreat_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
    req: Option<Json<RetreatRequest>>,
) -> Result<Json<RetreatResponse>, AppError> {
    // Option<Json<T>>: 본문이 없으면 None. and_then으로 Json을 풀어 버전만 꺼냅니다.
    let expected_version = req.and_then(|Json(req)| req.expected_version);
    let response =
        services::progress::retreat_question(&state.pool, &id, user.as_ref(), expected_version)
            .await?;
    Ok(Json(response))
}

/// `POST /quizzes/{id}/complete` → `{ "result_id": ... }`
///
/// 모델 피드백을 기다리므로 수 초가 걸릴 수 있습니다.
/// 실패하면 퀴즈는 완료 전 상태 그대로 남아 다시 시도할 수 있습니다.
pub async fn complete_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<Value>, AppError> {
    let result_id = services::scoring::complete_quiz(
        &state.pool,
        state.ai.as_ref(), // Arc<dyn QuizAi> → &dyn QuizAi
        &id,
        user.as_ref(),
        &req.selected_option_id,
    )
    .await?;
    Ok(Json(json!({ "result_id": result_id })))
}

/// `GET /quizzes/{id}/results` → 문제별 정답/오답과 피드백
///
/// 완료되지 않은 퀴즈는 404 (보여줄 결과가 없음).
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
) -> Result<Json<QuizResultsView>, AppError> {
    let view = services::projection::get_results(&state.pool, &id, user.as_ref()).await?;
    Ok(Json(view))
}
