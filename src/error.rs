//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 모든 서버 작업은 실패 시 부분 저장 없이 중단되고, 이 타입으로 사용자에게 그대로 전달됩니다.
//! 자동 재시도는 어디에도 없습니다.

use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 409, 502 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: 커스텀 에러 타입을 쉽게 만들어주는 매크로 크레이트

// AI 모델 호출 에러. 아래 ExternalService variant가 감쌉니다.
use crate::services::ai::AiError;

// #[derive(Debug, Error)]:
// - Debug: 디버깅용 출력 ({:?})
// - Error (thiserror): std::error::Error 트레이트를 자동 구현.
//   #[error("...")] 어트리뷰트로 Display 트레이트(사람이 읽을 에러 메시지)도 자동 생성합니다.

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 `IntoResponse`를 호출하여 `{ "error": { "code", "message" } }` 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    // #[error("...")]: 이 variant의 Display 메시지를 정의합니다.
    // .to_string()이나 println!("{}", err)로 출력할 때 이 메시지가 사용됩니다.

    /// 요청한 퀴즈/결과가 존재하지 않음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 현재 사용자를 확인할 수 없음 (HTTP 401)
    /// {0}은 첫 번째 필드(String)를 참조하는 포맷 문법입니다.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 인증은 되었지만 리소스의 소유자가 아님 (HTTP 403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 잘못된 입력 (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 답안이 존재하지 않는 문제/선택지를 가리킴 (HTTP 500)
    /// 불변식이 지켜지는 한 발생하지 않아야 하며, 데이터 손상을 의미합니다.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// 사용자가 API 키를 등록하지 않음 (HTTP 400)
    #[error("No API key found. Please create an API key.")]
    MissingApiKey,

    /// AI 모델 호출 실패 (HTTP 502)
    /// #[from]: AiError → AppError::ExternalService 자동 변환.
    /// 서비스 코드에서 `ai.generate_feedback(..).await?`처럼 바로 `?`를 쓸 수 있습니다.
    #[error("External service error: {0}")]
    ExternalService(#[from] AiError),

    /// 이미 완료된 퀴즈에 대한 진행/완료 시도 (HTTP 409)
    #[error("Quiz is already completed")]
    AlreadyCompleted,

    /// 리소스 충돌 (HTTP 409)
    /// 오래된 progress 버전으로 쓰기를 시도했거나, 중복된 사용자 이름 등
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error를 AppError로 자동 변환하는 From 트레이트를 구현합니다.
    /// 이를 통해 sqlx 함수에서 반환된 에러에 `?` 연산자를 사용하면
    /// 자동으로 AppError::Database로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(DataIntegrity, Database, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        // match: 패턴 매칭. enum의 모든 variant를 빠짐없이 처리해야 합니다 (exhaustive).
        // (status, code, message) 튜플을 반환합니다.
        let (status, code, message) = match self {
            // Self::NotFound → (404, "not_found", "Resource not found")
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),

            // ref: 패턴 매칭에서 값을 이동(move)하지 않고 참조만 빌려옵니다.
            // self가 이미 match에서 사용 중이므로, 내부 값은 참조로 접근합니다.
            AppError::Unauthenticated(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg.clone())
            }
            // 401(누구인지 모름)과 403(누구인지 알지만 권한 없음)을 구분합니다.
            AppError::Unauthorized(ref msg) => {
                (StatusCode::FORBIDDEN, "unauthorized", msg.clone())
            }
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::DataIntegrity(ref msg) => {
                // 손상된 데이터의 상세 내용은 서버 로그에만 남깁니다.
                tracing::error!("Data integrity error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "data_integrity_error",
                    "Something went wrong while scoring this quiz".to_string(),
                )
            }
            AppError::MissingApiKey => {
                (StatusCode::BAD_REQUEST, "missing_api_key", self.to_string())
            }
            AppError::ExternalService(ref e) => {
                // 모델 API의 응답 본문에는 키 관련 정보가 섞일 수 있어 로그에만 기록
                tracing::warn!("External service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "external_service_error",
                    "The AI service failed to respond. Please try again.".to_string(),
                )
            }
            AppError::AlreadyCompleted => {
                (StatusCode::CONFLICT, "already_completed", self.to_string())
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                // 내부 에러는 로그에 기록 (서버 관리자용)
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    // 클라이언트에는 일반적인 메시지만 반환 (내부 구현 노출 방지)
                    "An internal error occurred".to_string(),
                )
            }
        };

        // JSON 응답 본문을 생성합니다.
        // 결과: { "error": { "code": "already_completed", "message": "Quiz is already completed" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // (StatusCode, Json) 튜플도 IntoResponse를 구현하므로 바로 응답으로 변환됩니다.
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        let cases = [
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Unauthenticated("login".into()), StatusCode::UNAUTHORIZED),
            (AppError::Unauthorized("owner".into()), StatusCode::FORBIDDEN),
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::MissingApiKey, StatusCode::BAD_REQUEST),
            (AppError::AlreadyCompleted, StatusCode::CONFLICT),
            (AppError::Conflict("stale".into()), StatusCode::CONFLICT),
            (
                AppError::DataIntegrity("dangling option".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::ExternalService(AiError::MalformedResponse("empty".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
