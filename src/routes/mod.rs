//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 풀어 서비스 계층(services/)을 호출하고 결과를 JSON으로 돌려줍니다.
//!
//! 각 하위 모듈:
//! - `auth`: 회원가입, 로그인, 내 정보
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `progress`: 퀴즈 풀이 (advance, retreat, complete, results)
//! - `quizzes`: 퀴즈 생성/목록/조회/초기화/삭제, 그리고 `AppState`
//! - `settings`: AI API 키 설정

pub mod auth;
pub mod health;
pub mod progress;
pub mod quizzes;
pub mod settings;

// main.rs에서 `routes::list_quizzes`처럼 바로 접근할 수 있게 재공개합니다.
pub use health::*;
pub use progress::*;
pub use quizzes::*;
pub use settings::*;
