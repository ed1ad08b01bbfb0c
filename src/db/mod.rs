//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스 계층(services/)이 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `quizzes`: 퀴즈 생성/조회/진행 상태 저장/초기화/삭제
//! - `results`: 채점 결과 저장(완료 트랜잭션)과 조회
//! - `users`: 사용자 인증과 API 키 저장소

pub mod quizzes;
pub mod results;
pub mod users;

pub use quizzes::*;
pub use results::*;

use chrono::Utc;

/// 현재 UTC 시각을 ISO 8601 문자열로 반환합니다.
///
/// SQLite의 `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`와 같은 형식(밀리초 3자리)입니다.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    //! 테스트용 인메모리 데이터베이스

    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    /// 마이그레이션이 적용된 인메모리 SQLite 풀을 만듭니다.
    ///
    /// 인메모리 DB는 연결마다 따로 생기므로 연결 수를 1로 고정합니다.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should open");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations should apply");

        pool
    }
}
