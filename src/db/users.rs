//! # 사용자 DB 모듈
//!
//! 계정 생성/조회와 사용자별 AI API 키 저장소를 담당합니다.

use crate::error::AppError;
use crate::models::user::User;
use sqlx::SqlitePool;

/// 새 사용자를 생성하고, 저장된 행을 다시 읽어 반환합니다.
///
/// # 반환값
/// - `Ok(User)`: 생성된 사용자 (DB 기본값인 `created_at` 포함)
/// - `Err(AppError::Database)`: username/email 중복 등 제약 조건 위반
pub async fn create_user(
    pool: &SqlitePool,
    id: &str,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> Result<User, AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// 사용자의 AI API 키를 조회합니다.
///
/// # 매개변수
/// - `pool`: 데이터베이스 커넥션 풀
/// - `user_id`: 조회할 사용자 ID
///
/// # 반환값
/// - `Ok(Some(key))`: 키가 등록된 경우
/// - `Ok(None)`: 사용자가 없거나 키를 등록하지 않은 경우
pub async fn get_api_key(pool: &SqlitePool, user_id: &str) -> Result<Option<String>, AppError> {
    // query_scalar: 첫 번째 컬럼 하나만 꺼내는 쿼리
    // 바깥 Option = 행이 있는지, 안쪽 Option = api_key 컬럼이 NULL인지
    let key: Option<Option<String>> =
        sqlx::query_scalar("SELECT api_key FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    // flatten: Option<Option<T>> → Option<T> (두 경우 모두 "키 없음"으로 취급)
    Ok(key.flatten())
}

/// 사용자의 AI API 키를 저장(교체)합니다.
///
/// # 매개변수
/// - `user_id`: 키를 등록할 사용자 ID
/// - `api_key`: 새 키 (기존 키는 덮어씀)
///
/// # 반환값
/// - `Ok(true)`: 저장 성공
/// - `Ok(false)`: 해당 사용자가 없음
pub async fn store_api_key(pool: &SqlitePool, user_id: &str, api_key: &str) -> Result<bool, AppError> {
    // strftime(...): SQLite에서 현재 시각을 ISO 8601 문자열로 만듭니다.
    let result = sqlx::query(
        "UPDATE users SET api_key = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(api_key)
    .bind(user_id)
    .execute(pool)
    .await?;

    // rows_affected(): UPDATE로 변경된 행 수. 0이면 WHERE 조건에 맞는 사용자가 없음
    Ok(result.rows_affected() > 0)
}
