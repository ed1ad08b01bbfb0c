//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `quiz`: 퀴즈, 문제, 선택지, 답안, 진행 상태
//! - `result`: 채점 결과와 결과 화면용 리뷰 구조체
//! - `user`: 사용자와 인증 요청/응답
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Quiz`처럼 짧게 접근할 수 있게 합니다.

pub mod quiz;
pub mod result;
pub mod user;

pub use quiz::*;
pub use result::*;
pub use user::*;
