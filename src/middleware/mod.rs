//! # 미들웨어 모듈
//!
//! - `auth`: Bearer 토큰에서 현재 사용자(`AuthUser`)를 추출하는 Extractor와 JWT 유틸리티

pub mod auth;
