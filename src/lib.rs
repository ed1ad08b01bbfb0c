//! # Quizdeck
//!
//! 노트로 객관식 퀴즈를 만들고, 풀고, 채점하는 학습 도우미의 핵심 로직입니다.
//! 실행 파일(main.rs)은 이 모듈들을 조립해 HTTP 서버로 띄웁니다.
//!
//! - `services::progress`: 문제 이동과 답안 기록
//! - `services::scoring`: 완료, 채점, 피드백
//! - `services::projection`: 결과 화면
//! - `services::mirror`: 클라이언트가 서버 응답 전에 보여줄 낙관적 사본

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
