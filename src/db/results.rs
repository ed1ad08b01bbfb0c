//! # 채점 결과 데이터베이스 쿼리 모듈
//!
//! ## 완료 트랜잭션
//! ```text
//! BEGIN
//!   UPDATE quizzes SET progress..., is_completed = 1 WHERE id = ? AND is_completed = 0
//!   (0행이면 이미 완료된 퀴즈 → 롤백, AlreadyCompleted)
//!   INSERT INTO quiz_results ...          (quiz_id UNIQUE)
//! COMMIT
//! ```

use crate::error::AppError;
use crate::models::*;
use sqlx::{types::Json, SqlitePool};

/// 마지막 답안이 반영된 진행 상태, 채점 결과, 완료 플래그를 한 번에 저장합니다.
///
/// 하나라도 실패하면 아무것도 저장되지 않습니다.
///
/// # 매개변수
/// - `progress`: 마지막 답안까지 반영된 진행 상태 (메모리에서 계산된 값)
/// - `result`: 채점 결과와 AI 피드백
///
/// # 반환값
/// - `Ok(())`: 세 가지가 모두 커밋됨
/// - `Err(AppError::AlreadyCompleted)`: 다른 요청이 먼저 완료함
/// - `Err(AppError::Database)`: 그 밖의 DB 오류
pub async fn finalize_quiz(
    pool: &SqlitePool,
    progress: &Progress,
    result: &QuizResult,
) -> Result<(), AppError> {
    // begin(): 트랜잭션 시작. 에러로 빠져나가면 tx가 drop되면서 롤백됩니다.
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE quizzes
        SET current_question_index = ?,
            answers = ?,
            last_updated = ?,
            progress_version = progress_version + 1,
            is_completed = 1
        WHERE id = ? AND is_completed = 0
        "#,
    )
    // ↑ SQL 설명:
    // - is_completed = 1: 진행 상태 저장과 완료 표시를 한 문장에서 처리
    // - WHERE ... AND is_completed = 0: 이미 완료된 퀴즈면 0행이 갱신됨
    .bind(progress.current_question_index)
    .bind(Json(&progress.answers))
    .bind(&progress.last_updated)
    .bind(&result.quiz_id)
    .execute(&mut *tx) // &mut *tx: 풀이 아니라 트랜잭션 안에서 실행
    .await?;

    if updated.rows_affected() == 0 {
        // 그 사이 다른 요청이 먼저 완료했음
        return Err(AppError::AlreadyCompleted);
    }

    sqlx::query(
        r#"
        INSERT INTO quiz_results (id, quiz_id, user_id, completed_at, score, correct_count,
                                  answers, incorrect_question_ids, feedback)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&result.id)
    .bind(&result.quiz_id)
    .bind(&result.user_id)
    .bind(&result.completed_at)
    .bind(result.score)
    .bind(result.correct_count)
    .bind(Json(&result.answers))
    .bind(Json(&result.incorrect_question_ids))
    .bind(&result.feedback)
    .execute(&mut *tx)
    .await
    // map_err: 에러를 다른 에러로 변환합니다.
    // quiz_id UNIQUE 위반은 "이미 완료됨"이고, 나머지는 일반 DB 오류입니다.
    .map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db_error| db_error.is_unique_violation());
        if duplicate {
            AppError::AlreadyCompleted
        } else {
            AppError::Database(e)
        }
    })?;

    // commit(): 여기까지 도달해야 모든 변경이 한 번에 반영됩니다.
    tx.commit().await?;
    Ok(())
}

/// 퀴즈의 채점 결과를 조회합니다.
///
/// # 반환값
/// - `Ok(Some(QuizResult))`: 완료된 퀴즈
/// - `Ok(None)`: 아직 완료되지 않았거나 초기화된 퀴즈
pub async fn get_result_for_quiz(
    pool: &SqlitePool,
    quiz_id: &str,
) -> Result<Option<QuizResult>, AppError> {
    let row = sqlx::query_as::<_, QuizResultRow>(
        r#"
        SELECT id, quiz_id, user_id, completed_at, score, correct_count,
               answers, incorrect_question_ids, feedback
        FROM quiz_results
        WHERE quiz_id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool) // 퀴즈당 결과는 최대 1개 (quiz_id UNIQUE)
    .await?;

    // JSON 컬럼(answers, incorrect_question_ids)을 풀어 QuizResult로 변환
    Ok(row.map(QuizResult::from))
}
