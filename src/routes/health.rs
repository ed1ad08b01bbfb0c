//! # 헬스체크(Health Check) 핸들러
//!
//! - `GET /api/v1/health` → `{ "status": "ok", "database": "ok" }`

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::AppError, routes::quizzes::AppState};

/// DB 연결까지 확인합니다.
///
/// # 반환값
/// - `Ok(Json)`: 서버와 DB 모두 정상
/// - `Err(AppError::Database)`: 풀에서 연결을 얻지 못함 (500)
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    // SELECT 1: 테이블에 접근하지 않는 가장 가벼운 쿼리. 연결이 살아있는지만 확인합니다.
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    // json!: JSON 리터럴을 serde_json::Value로 만듭니다.
    Ok(Json(json!({
        "status": "ok",
        "database": "ok"
    })))
}
