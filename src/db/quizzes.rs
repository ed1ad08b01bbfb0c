//! # 퀴즈 데이터베이스 쿼리 모듈
//!
//! `quizzes` 테이블에 대한 쿼리 함수들입니다.
//!
//! 문제 목록(`questions`)과 답안 목록(`answers`)은 JSON 텍스트 컬럼에 저장되고,
//! `sqlx::types::Json` 래퍼가 직렬화/역직렬화를 담당합니다.
//! 퀴즈 한 건의 읽기-수정-쓰기는 UPDATE 한 문장으로 끝나도록 구성되어 있으며,
//! 여러 테이블에 걸친 변경(초기화, 일괄 삭제)만 트랜잭션을 사용합니다.

use crate::error::AppError;
use crate::models::*; // 모든 모델 타입을 가져옴 (Quiz, QuizRow, NewQuiz, Progress 등)
// Json: Vec<Question> 같은 값을 JSON 텍스트로 바인딩/디코딩하는 래퍼
// SqlitePool: SQLite 커넥션 풀 (여러 요청이 커넥션을 공유)
use sqlx::{types::Json, SqlitePool};

/// 새 퀴즈를 저장하고, 저장된 퀴즈를 다시 조회하여 반환합니다.
///
/// 진행 상태는 `{0, [], now}`, `is_completed = false`로 시작합니다.
///
/// # 매개변수
/// - `pool`: 데이터베이스 커넥션 풀 (& = 참조로 빌려옴, 소유권 이동 없음)
/// - `id`: 새 퀴즈 ID (UUID v7)
/// - `quiz`: 생성할 퀴즈 데이터 (문제 목록 포함)
/// - `now`: 생성 시각 (ISO 8601)
///
/// # 반환값
/// - `Ok(Quiz)`: 생성된 퀴즈
/// - `Err(AppError)`: DB 오류 시
pub async fn insert_quiz(
    pool: &SqlitePool,
    id: &str,
    quiz: &NewQuiz,
    now: &str,
) -> Result<Quiz, AppError> {
    // sqlx::query(): SQL 쿼리를 생성합니다.
    // r#"..."#: Raw 문자열 리터럴. 이스케이프 없이 여러 줄 SQL을 그대로 쓸 수 있습니다.
    sqlx::query(
        r#"
        INSERT INTO quizzes (id, user_id, title, notes, context, num_questions,
                             options_per_question, questions, last_updated, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    // .bind(): SQL의 ? 자리에 순서대로 값을 바인딩합니다 (SQL Injection 방지)
    .bind(id)
    .bind(&quiz.user_id)
    .bind(&quiz.title)
    .bind(&quiz.notes)
    .bind(&quiz.context) // Option<String>: None이면 SQL NULL
    .bind(quiz.num_questions)
    .bind(quiz.options_per_question)
    .bind(Json(&quiz.questions)) // Vec<Question> → JSON 텍스트
    .bind(now)
    .bind(now)
    .execute(pool) // 쿼리 실행 (결과 행을 반환하지 않는 INSERT/UPDATE/DELETE용)
    .await?; // .await: 비동기 실행 완료 대기, ?: 에러 시 AppError::Database로 자동 변환

    // 방금 삽입한 퀴즈를 다시 조회하여 반환 (DB가 채운 기본값 포함)
    // ok_or: Option → Result 변환. None이면 지정한 에러를 반환
    get_quiz(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created quiz".to_string()))
}

/// ID로 퀴즈를 조회합니다. 소유자 확인은 하지 않습니다 (services::guard 담당).
///
/// # 반환값
/// - `Ok(Some(Quiz))`: 퀴즈를 찾은 경우
/// - `Ok(None)`: 해당 ID의 퀴즈가 없는 경우
pub async fn get_quiz(pool: &SqlitePool, id: &str) -> Result<Option<Quiz>, AppError> {
    // query_as::<_, QuizRow>: 쿼리 결과를 QuizRow 구조체로 매핑합니다.
    // _: DB 타입은 컴파일러가 추론 (Sqlite)
    let row = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT id, user_id, title, notes, context, num_questions, options_per_question,
               questions, current_question_index, answers, last_updated,
               progress_version, is_completed, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool) // 0개 또는 1개의 행을 가져옴 (없으면 None)
    .await?;

    // Option<QuizRow> → Option<Quiz>
    // map(Quiz::from): Some일 때만 From 변환을 적용 (JSON 컬럼을 Vec으로 풀어냄)
    Ok(row.map(Quiz::from))
}

/// 사용자의 퀴즈를 최신순으로 조회합니다.
///
/// # 매개변수
/// - `user_id`: 소유자 ID (다른 사용자의 퀴즈는 포함되지 않음)
pub async fn list_quizzes_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Quiz>, AppError> {
    let rows = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT id, user_id, title, notes, context, num_questions, options_per_question,
               questions, current_question_index, answers, last_updated,
               progress_version, is_completed, created_at
        FROM quizzes
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    // ↑ SQL 설명:
    // - WHERE user_id = ?: 본인 퀴즈만
    // - ORDER BY created_at DESC: 최신순
    // - id DESC: 같은 시각에 만든 퀴즈는 UUID v7(시간순 ID) 역순으로 정렬
    .bind(user_id)
    .fetch_all(pool) // 모든 행을 Vec으로 가져옴
    .await?;

    // into_iter(): Vec의 소유권을 가져와 하나씩 꺼냄 → Quiz로 변환 → 다시 Vec으로 수집
    Ok(rows.into_iter().map(Quiz::from).collect())
}

/// 진행 상태를 저장합니다.
///
/// - 완료된 퀴즈(`is_completed = 1`)는 갱신되지 않습니다.
/// - `expected_version`이 Some이면 저장된 버전과 같을 때만 갱신합니다.
///   None이면 마지막 쓰기가 이깁니다.
/// - 저장에 성공하면 `progress_version`이 1 증가합니다.
///
/// # 반환값
/// - `Ok(true)`: 1행 갱신
/// - `Ok(false)`: 퀴즈가 없거나, 완료되었거나, 버전이 맞지 않음 (호출자가 원인을 구분)
pub async fn update_progress(
    pool: &SqlitePool,
    id: &str,
    progress: &Progress,
    expected_version: Option<i64>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET current_question_index = ?,
            answers = ?,
            last_updated = ?,
            progress_version = progress_version + 1
        WHERE id = ?
          AND is_completed = 0
          AND (? IS NULL OR progress_version = ?)
        "#,
    )
    // ↑ SQL 설명:
    // - progress_version + 1: 저장할 때마다 버전을 올려 동시 쓰기를 감지
    // - is_completed = 0: 완료된 퀴즈는 진행 상태가 고정됨
    // - (? IS NULL OR progress_version = ?): 기대 버전이 없으면 조건을 건너뛰고,
    //   있으면 저장된 버전과 같을 때만 갱신 (같은 값을 두 번 바인딩)
    .bind(progress.current_question_index)
    .bind(Json(&progress.answers))
    .bind(&progress.last_updated)
    .bind(id)
    .bind(expected_version) // Option<i64>: None이면 NULL
    .bind(expected_version)
    .execute(pool)
    .await?;

    // rows_affected(): 실제로 갱신된 행 수
    Ok(result.rows_affected() > 0)
}

/// 퀴즈를 처음 상태로 되돌립니다.
///
/// 결과 삭제와 진행 상태 재초기화를 하나의 트랜잭션으로 처리합니다.
/// 둘 중 하나라도 실패하면 트랜잭션이 롤백되어 아무것도 바뀌지 않습니다.
///
/// # 반환값
/// - `Ok(true)`: 초기화 완료
/// - `Ok(false)`: 해당 퀴즈가 없음 (아무것도 커밋되지 않음)
pub async fn reset_quiz(pool: &SqlitePool, id: &str, now: &str) -> Result<bool, AppError> {
    // begin(): 트랜잭션 시작. commit() 전에 tx가 drop되면 자동으로 롤백됩니다.
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM quiz_results WHERE quiz_id = ?")
        .bind(id)
        // &mut *tx: 트랜잭션을 실행기(executor)로 빌려줌 (pool 대신 tx 안에서 실행)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET current_question_index = 0,
            answers = '[]',
            last_updated = ?,
            progress_version = progress_version + 1,
            is_completed = 0
        WHERE id = ?
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 대상 퀴즈가 없으면 커밋하지 않고 버립니다 (drop 시 롤백).
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

/// 여러 퀴즈를 한 번에 삭제합니다. 결과는 `ON DELETE CASCADE`로 함께 삭제됩니다.
///
/// 소유자 확인은 호출자가 먼저 끝낸 상태여야 합니다.
///
/// # 매개변수
/// - `ids`: 삭제할 퀴즈 ID 목록 (&[String] = 슬라이스 참조)
///
/// # 반환값
/// - `Ok(n)`: 실제로 삭제된 퀴즈 수
pub async fn delete_quizzes(pool: &SqlitePool, ids: &[String]) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;

    // 중간에 하나라도 실패하면 ?로 빠져나가고, tx가 drop되어 전부 롤백됩니다.
    for id in ids {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        deleted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(deleted)
}
