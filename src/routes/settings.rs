//! # 사용자 설정 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/settings/api-key` → `{ "api_key": string | null }`
//! - `PUT /api/v1/settings/api-key` → 키 저장(교체)
//!
//! 저장된 키는 퀴즈 생성과 완료 시 AI 모델 호출에 사용됩니다.

use axum::{extract::State, Json};

use crate::{
    db::users as db_users,
    error::AppError,
    middleware::auth::AuthUser,
    models::user::ApiKeyPayload,
    routes::quizzes::AppState,
};

/// `GET /settings/api-key` → 등록된 키 (없으면 `null`)
pub async fn get_api_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiKeyPayload>, AppError> {
    let api_key = db_users::get_api_key(&state.pool, &auth_user.user_id).await?;
    Ok(Json(ApiKeyPayload { api_key }))
}

/// `PUT /settings/api-key` → 키 저장(교체)
///
/// # 반환값
/// - `Ok(Json)`: 저장된 키 (앞뒤 공백 제거됨)
/// - `Err(AppError::Validation)`: 키가 없거나 공백뿐인 경우
/// - `Err(AppError::NotFound)`: 토큰의 사용자가 이미 삭제된 경우
pub async fn put_api_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<ApiKeyPayload>,
) -> Result<Json<ApiKeyPayload>, AppError> {
    // Option 체인: None이거나 공백뿐이면 ok_or에서 Validation 에러가 됩니다.
    let api_key = req
        .api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(AppError::Validation("API key must not be empty".to_string()))?;

    if !db_users::store_api_key(&state.pool, &auth_user.user_id, &api_key).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %auth_user.user_id, "api key updated");
    Ok(Json(ApiKeyPayload {
        api_key: Some(api_key),
    }))
}
