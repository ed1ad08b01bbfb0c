//! # 인증 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/auth/register` → 회원가입 + 액세스 토큰 발급
//! - `POST /api/v1/auth/login`    → 로그인 + 액세스 토큰 발급
//! - `GET  /api/v1/auth/me`       → 현재 사용자 정보

use crate::{
    db::users as db_users,
    error::AppError,
    middleware::auth::{create_access_token, AuthUser},
    models::user::*,
    routes::quizzes::AppState,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};

/// 액세스 토큰을 발급합니다. 서명 실패는 서버 내부 오류(500)로 취급합니다.
fn issue_token(state: &AppState, user_id: &str) -> Result<String, AppError> {
    create_access_token(user_id, &state.jwt_secret, state.access_token_ttl_minutes)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// 회원가입 입력 검사
///
/// # 반환값
/// - `Ok(())`: 통과
/// - `Err(AppError::Validation)`: 아이디 3자 미만, 비밀번호 8자 미만, 잘못된 이메일 형식
fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.username.trim().len() < 3 {
        return Err(AppError::Validation("Username must be at least 3 characters".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation("Password must be at least 8 characters".to_string()));
    }
    if let Some(email) = &req.email {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
    }
    Ok(())
}

/// `POST /auth/register` → 201 Created + `{ user, access_token }`
///
/// # 반환값
/// - `Err(AppError::Validation)`: 입력 검사 실패
/// - `Err(AppError::Conflict)`: 이미 사용 중인 아이디
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    // Validate input
    validate_registration(&req)?;
    let username = req.username.trim();

    // Check if username already exists
    if db_users::find_by_username(&state.pool, username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    // Hash password with Argon2id
    // SaltString::generate: OS 난수로 사용자별 솔트를 만듭니다 (같은 비밀번호도 해시가 달라짐)
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    // Create user
    let user_id = uuid::Uuid::now_v7().to_string();
    let user = db_users::create_user(
        &state.pool,
        &user_id,
        username,
        req.email.as_deref(),
        &password_hash,
    )
    .await?;

    // Generate token
    let access_token = issue_token(&state, &user.id)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            access_token,
        }),
    ))
}

/// `POST /auth/login` → `{ user, access_token }`
///
/// 아이디가 없을 때와 비밀번호가 틀렸을 때 같은 메시지를 돌려줍니다 (계정 존재 여부 비노출).
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // 클로저: 같은 에러를 여러 곳에서 만들기 위해 함수처럼 묶어둡니다.
    let invalid = || AppError::Unauthenticated("Invalid username or password".to_string());

    // Find user by username
    let user = db_users::find_by_username(&state.pool, req.username.trim())
        .await?
        .ok_or_else(invalid)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password hash parse error: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let access_token = issue_token(&state, &user.id)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token,
    }))
}

/// `GET /auth/me` → 현재 사용자 정보
///
/// `auth_user: AuthUser`: 매개변수에 두면 토큰이 없을 때 핸들러가 실행되지 않고 401이 반환됩니다.
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}
