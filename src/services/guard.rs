//! # 퀴즈 권한 검사
//!
//! 퀴즈를 읽거나 바꾸는 모든 작업은 이 함수를 먼저 거칩니다.
//! 완료 흐름도 클라이언트의 이전 확인과 관계없이 매번 다시 검사합니다.
//!
//! 검사 순서:
//! 1. 퀴즈가 없으면 `NotFound`
//! 2. 현재 사용자가 없으면 `Unauthenticated`
//! 3. 소유자가 아니면 `Unauthorized`

use sqlx::SqlitePool;

use crate::{db, error::AppError, middleware::auth::AuthUser, models::Quiz};

/// 권한 검사를 통과한 퀴즈와 사용자. 호출자가 퀴즈를 다시 조회할 필요가 없습니다.
#[derive(Debug, Clone)]
pub struct QuizAccess {
    pub quiz: Quiz,
    pub user: AuthUser,
}

pub async fn authorize_quiz(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
) -> Result<QuizAccess, AppError> {
    let quiz = db::get_quiz(pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let user = user.ok_or_else(|| {
        AppError::Unauthenticated("Unauthenticated. Please login to continue.".to_string())
    })?;

    if quiz.user_id != user.user_id {
        tracing::warn!(quiz_id, user_id = %user.user_id, "rejected access to another user's quiz");
        return Err(AppError::Unauthorized(
            "Unauthorized to work on this quiz.".to_string(),
        ));
    }

    Ok(QuizAccess {
        quiz,
        user: user.clone(),
    })
}

/// 퀴즈와 무관한 작업(생성, 목록, API 키)에서 현재 사용자를 요구합니다.
pub fn require_user(user: Option<&AuthUser>) -> Result<&AuthUser, AppError> {
    user.ok_or_else(|| {
        AppError::Unauthenticated("Unauthenticated. Please login to continue.".to_string())
    })
}
