//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: 액세스 토큰 서명에 사용할 비밀키 (필수)
//! - `HOST` / `PORT`: 서버 바인딩 주소와 포트
//! - `AI_BASE_URL` / `AI_MODEL`: 퀴즈 생성과 피드백 작성에 쓰는 모델 API
//! - `AI_TIMEOUT_SECS`: 모델 호출 타임아웃 (피드백 생성은 수 초가 걸릴 수 있음)
//! - `ACCESS_TOKEN_TTL_MINUTES`: 액세스 토큰 유효 시간

// std::env: Rust 표준 라이브러리의 환경변수 모듈
// env::var("KEY")로 환경변수 값을 Result<String, VarError>로 가져옵니다.
use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// `AppState`를 통해 핸들러들과 공유됩니다.
// #[derive(Debug, Clone)]:
// - Debug: {:?}로 출력 가능 (시작 로그 디버깅용)
// - Clone: .clone()으로 복사 가능 (main에서 AppState를 만들 때 필요한 값만 꺼내 씁니다)
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/quizdeck.db?mode=rwc")
    pub database_url: String,
    /// JWT 서명/검증용 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// OpenAI 호환 API의 기본 URL
    pub ai_base_url: String,
    /// 사용할 모델 이름
    pub ai_model: String,
    /// 모델 호출 타임아웃(초)
    pub ai_timeout_secs: u64,
    /// 액세스 토큰 유효 시간(분)
    pub access_token_ttl_minutes: i64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 반환값
    /// - `Ok(Config)`: 모든 필수 값을 읽은 경우
    /// - `Err(VarError)`: `DATABASE_URL` 또는 `JWT_SECRET`이 설정되지 않은 경우
    ///
    /// 나머지 항목은 기본값이 있어 환경변수가 없거나 숫자로 파싱되지 않아도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            // ?: 환경변수가 없으면 즉시 Err(VarError)를 반환하고 함수를 종료합니다.
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            // unwrap_or_else: Err일 때 클로저를 실행해 기본값을 만듭니다.
            // |_|는 에러 값을 사용하지 않는다는 뜻입니다.
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            // 타입 추론: 필드 타입(u16)으로부터 parse_or::<u16>이 결정됩니다.
            port: parse_or("PORT", 3000),
            ai_base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4-turbo".to_string()),
            ai_timeout_secs: parse_or("AI_TIMEOUT_SECS", 120),
            access_token_ttl_minutes: parse_or("ACCESS_TOKEN_TTL_MINUTES", 60),
        })
    }
}

/// 숫자형 환경변수를 읽습니다. 변수가 없거나 파싱에 실패하면 `default`를 사용합니다.
///
/// 제네릭 `T: FromStr`: `str::parse()`로 변환 가능한 모든 타입(u16, u64, i64 ...)에 쓸 수 있습니다.
///
/// # 매개변수
/// - `key`: 환경변수 이름
/// - `default`: 변수가 없거나 형식이 잘못됐을 때 쓸 값
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        // .ok(): Result → Option 변환 (에러 내용은 버림)
        .ok()
        // and_then: Some일 때만 파싱을 시도하고, 실패하면 None이 됩니다.
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
