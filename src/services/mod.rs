//! # 서비스 계층 (비즈니스 로직)
//!
//! 라우트 핸들러는 요청을 풀고 이 계층을 호출한 뒤 결과를 JSON으로 돌려줄 뿐입니다.
//!
//! 각 하위 모듈:
//! - `ai`: 퀴즈 생성/피드백 작성을 맡는 외부 모델 연동 (`QuizAi` 트레이트)
//! - `guard`: 퀴즈 권한 검사 (모든 퀴즈 작업의 관문)
//! - `progress`: 진행 상태 머신 (advance / retreat)
//! - `scoring`: 완료와 채점
//! - `projection`: 결과 화면 구성
//! - `quizzes`: 퀴즈 생성/목록/조회/초기화/삭제
//! - `mirror`: 클라이언트용 낙관적 진행 상태 미러

pub mod ai;
pub mod guard;
pub mod mirror;
pub mod progress;
pub mod projection;
pub mod quizzes;
pub mod scoring;

#[cfg(test)]
pub(crate) mod testing;
