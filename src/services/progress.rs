//! # 진행 상태 머신 (Progress State Machine)
//!
//! 상태는 `(current_question_index, answers)`뿐이며 숨겨진 상태는 없습니다.
//!
//! ## 전이 규칙
//! ```text
//! advance(i, option) : answers[q_i] = option (있으면 제자리 교체, 없으면 뒤에 추가)
//!                      i' = min(i + 1, last)      마지막 문제에서는 제자리
//! retreat(i)         : i' = max(i - 1, 0)         첫 문제에서는 아무 일도 없음
//!                      answers와 last_updated는 그대로
//! ```
//!
//! `advance`와 `retreat`는 순수 함수라 서버 저장 경로와 클라이언트 미러
//! (`services::mirror`)가 똑같이 사용합니다. 아래의 `advance_question` /
//! `retreat_question`이 권한 검사와 저장을 덧붙인 서버 작업입니다.

use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::guard::{authorize_quiz, QuizAccess},
};

/// 저장된 인덱스를 `0..=last` 범위로 맞춥니다. 문제가 하나도 없으면 데이터 손상입니다.
fn clamped_index(progress: &Progress, questions: &[Question]) -> Result<usize, AppError> {
    let last = questions
        .len()
        .checked_sub(1)
        .ok_or_else(|| AppError::DataIntegrity("quiz has no questions".to_string()))?;

    Ok(progress.current_question_index.clamp(0, last as i64) as usize)
}

/// 현재 문제에 답안을 기록하고 다음 문제로 이동합니다.
///
/// 같은 문제에 같은 선택으로 두 번 호출해도 저장 상태는 같습니다 (멱등).
///
/// # 에러
/// - `Validation`: 선택지 ID가 비었거나 현재 문제의 선택지가 아님
/// - `DataIntegrity`: 문제가 하나도 없음
pub fn advance(
    progress: &Progress,
    questions: &[Question],
    selected_option_id: &str,
    now: String,
) -> Result<(Progress, Answer), AppError> {
    let index = clamped_index(progress, questions)?;
    let current = &questions[index];

    if selected_option_id.trim().is_empty() {
        return Err(AppError::Validation("An option must be selected".to_string()));
    }
    if current.option(selected_option_id).is_none() {
        return Err(AppError::Validation(format!(
            "Option '{}' does not belong to the current question",
            selected_option_id
        )));
    }

    let answer = Answer {
        question_id: current.id.clone(),
        selected_option_id: Some(selected_option_id.to_string()),
    };

    let mut answers = progress.answers.clone();
    match answers.iter_mut().find(|a| a.question_id == current.id) {
        Some(existing) => *existing = answer.clone(),
        None => answers.push(answer.clone()),
    }

    let last = questions.len() - 1;
    let next = Progress {
        current_question_index: (index + 1).min(last) as i64,
        answers,
        last_updated: now,
        version: progress.version,
    };

    Ok((next, answer))
}

/// 이전 문제로 이동합니다. 이동한 문제의 ID를 함께 반환합니다.
///
/// 답안은 지우지 않으므로, 되돌아간 문제를 다시 고르면 `advance`의 교체 경로를 탑니다.
pub fn retreat(progress: &Progress, questions: &[Question]) -> Result<(Progress, String), AppError> {
    let index = clamped_index(progress, questions)?;
    let target = index.saturating_sub(1);

    let next = Progress {
        current_question_index: target as i64,
        ..progress.clone()
    };

    Ok((next, questions[target].id.clone()))
}

/// `POST /quizzes/{id}/advance`
pub async fn advance_question(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
    selected_option_id: &str,
    expected_version: Option<i64>,
) -> Result<AdvanceResponse, AppError> {
    let QuizAccess { quiz, .. } = authorize_quiz(pool, quiz_id, user).await?;
    ensure_writable(&quiz, expected_version)?;

    let (next, answer) = advance(
        &quiz.progress,
        &quiz.questions,
        selected_option_id,
        db::timestamp_now(),
    )?;
    let progress = persist(pool, &quiz.id, &next, expected_version).await?;

    tracing::debug!(
        quiz_id = %quiz.id,
        question_id = %answer.question_id,
        index = progress.current_question_index,
        "answer recorded"
    );

    Ok(AdvanceResponse { answer, progress })
}

/// `POST /quizzes/{id}/retreat`
///
/// 첫 문제에서는 아무것도 저장하지 않습니다 (버전과 last_updated도 그대로).
pub async fn retreat_question(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
    expected_version: Option<i64>,
) -> Result<RetreatResponse, AppError> {
    let QuizAccess { quiz, .. } = authorize_quiz(pool, quiz_id, user).await?;
    ensure_writable(&quiz, expected_version)?;

    let (next, question_id) = retreat(&quiz.progress, &quiz.questions)?;
    if next == quiz.progress {
        return Ok(RetreatResponse {
            question_id,
            progress: quiz.progress,
        });
    }

    let progress = persist(pool, &quiz.id, &next, expected_version).await?;
    Ok(RetreatResponse {
        question_id,
        progress,
    })
}

/// 완료된 퀴즈와 오래된 버전을 저장 전에 걸러냅니다.
fn ensure_writable(quiz: &Quiz, expected_version: Option<i64>) -> Result<(), AppError> {
    if quiz.is_completed {
        return Err(AppError::AlreadyCompleted);
    }
    match expected_version {
        Some(expected) if expected != quiz.progress.version => Err(stale(expected, quiz.progress.version)),
        _ => Ok(()),
    }
}

fn stale(expected: i64, actual: i64) -> AppError {
    tracing::warn!(expected, actual, "rejected stale progress write");
    AppError::Conflict(format!(
        "Quiz progress changed since version {} (now {})",
        expected, actual
    ))
}

/// 진행 상태를 저장하고 서버가 확정한 값(증가한 버전 포함)을 다시 읽어 반환합니다.
async fn persist(
    pool: &SqlitePool,
    quiz_id: &str,
    next: &Progress,
    expected_version: Option<i64>,
) -> Result<Progress, AppError> {
    let written = db::update_progress(pool, quiz_id, next, expected_version).await?;
    let stored = db::get_quiz(pool, quiz_id).await?.ok_or(AppError::NotFound)?;

    if written {
        return Ok(stored.progress);
    }

    // 읽은 뒤 저장하기 전 사이에 다른 요청이 끼어든 경우
    if stored.is_completed {
        Err(AppError::AlreadyCompleted)
    } else {
        Err(stale(expected_version.unwrap_or_default(), stored.progress.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{testing::memory_pool, users};
    use crate::services::testing::{seed_quiz, three_questions};

    fn start() -> Progress {
        Progress::initial("t0".to_string())
    }

    fn owner() -> AuthUser {
        AuthUser { user_id: "owner".to_string() }
    }

    #[test]
    fn advance_records_answer_and_moves_forward() {
        let questions = three_questions();
        let (next, answer) = advance(&start(), &questions, "a", "t1".to_string()).unwrap();

        assert_eq!(answer.question_id, "q1");
        assert_eq!(answer.selected_option_id.as_deref(), Some("a"));
        assert_eq!(next.current_question_index, 1);
        assert_eq!(next.answers, vec![answer]);
        assert_eq!(next.last_updated, "t1");
    }

    #[test]
    fn advance_is_sticky_on_last_question_but_still_overwrites() {
        let questions = three_questions();
        let mut progress = start();
        for option in ["a", "a", "a"] {
            progress = advance(&progress, &questions, option, "t".to_string()).unwrap().0;
        }
        assert_eq!(progress.current_question_index, 2);

        let (again, answer) = advance(&progress, &questions, "b", "t2".to_string()).unwrap();
        assert_eq!(again.current_question_index, 2);
        assert_eq!(answer.question_id, "q3");
        assert_eq!(again.answers.len(), 3);
        assert_eq!(again.answers[2].selected_option_id.as_deref(), Some("b"));
    }

    #[test]
    fn re_answering_keeps_one_entry_in_original_position() {
        let questions = three_questions();
        let (p1, _) = advance(&start(), &questions, "a", "t".to_string()).unwrap();
        let (p2, _) = advance(&p1, &questions, "b", "t".to_string()).unwrap();
        let (back, _) = retreat(&p2, &questions).unwrap();
        let (back, _) = retreat(&back, &questions).unwrap();

        let (redo, _) = advance(&back, &questions, "b", "t".to_string()).unwrap();

        assert_eq!(redo.answers.len(), 2);
        assert_eq!(redo.answers[0].question_id, "q1");
        assert_eq!(redo.answers[0].selected_option_id.as_deref(), Some("b"));
        assert_eq!(redo.answers[1].question_id, "q2");
    }

    #[test]
    fn same_selection_twice_is_idempotent() {
        let questions = three_questions();
        let (p1, _) = advance(&start(), &questions, "a", "t".to_string()).unwrap();
        let (back, _) = retreat(&p1, &questions).unwrap();
        let (p2, _) = advance(&back, &questions, "a", "t".to_string()).unwrap();

        assert_eq!(p1, p2);
    }

    #[test]
    fn retreat_at_start_is_a_true_no_op() {
        let questions = three_questions();
        let (next, question_id) = retreat(&start(), &questions).unwrap();

        assert_eq!(next, start());
        assert_eq!(question_id, "q1");
    }

    #[test]
    fn retreat_leaves_answers_and_timestamp_alone() {
        let questions = three_questions();
        let (p1, _) = advance(&start(), &questions, "a", "t1".to_string()).unwrap();
        let (back, question_id) = retreat(&p1, &questions).unwrap();

        assert_eq!(question_id, "q1");
        assert_eq!(back.current_question_index, 0);
        assert_eq!(back.answers, p1.answers);
        assert_eq!(back.last_updated, "t1");
    }

    #[test]
    fn index_and_uniqueness_hold_over_mixed_sequences() {
        let questions = three_questions();
        let mut progress = start();
        // 전진(F)과 후진(B)을 섞은 여러 시퀀스
        let script = "FFBFFFFBBBBFBFFFFFBBFF";

        for (step, op) in script.chars().enumerate() {
            let option = if step % 2 == 0 { "a" } else { "b" };
            progress = match op {
                'F' => advance(&progress, &questions, option, format!("t{}", step)).unwrap().0,
                _ => retreat(&progress, &questions).unwrap().0,
            };

            assert!(progress.current_question_index >= 0);
            assert!(progress.current_question_index <= 2);

            let mut ids: Vec<_> = progress.answers.iter().map(|a| &a.question_id).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total, "duplicate answer after step {}", step);
        }
    }

    #[test]
    fn out_of_range_stored_index_is_clamped() {
        let questions = three_questions();
        let corrupt = Progress {
            current_question_index: 9,
            ..start()
        };
        let (next, answer) = advance(&corrupt, &questions, "a", "t".to_string()).unwrap();
        assert_eq!(answer.question_id, "q3");
        assert_eq!(next.current_question_index, 2);
    }

    #[test]
    fn foreign_or_blank_option_is_rejected() {
        let questions = three_questions();
        assert!(matches!(
            advance(&start(), &questions, "z", "t".to_string()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            advance(&start(), &questions, "  ", "t".to_string()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn empty_question_list_is_integrity_error() {
        assert!(matches!(
            advance(&start(), &[], "a", "t".to_string()),
            Err(AppError::DataIntegrity(_))
        ));
        assert!(matches!(retreat(&start(), &[]), Err(AppError::DataIntegrity(_))));
    }

    #[tokio::test]
    async fn advance_through_then_retreat_twice_keeps_answers() {
        let pool = memory_pool().await;
        users::create_user(&pool, "owner", "owner", None, "hash").await.unwrap();
        let quiz = seed_quiz(&pool, "owner").await;
        let user = owner();

        for option in ["a", "b", "a"] {
            advance_question(&pool, &quiz.id, Some(&user), option, None).await.unwrap();
        }
        let before = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap().progress;
        assert_eq!(before.current_question_index, 2);

        let first = retreat_question(&pool, &quiz.id, Some(&user), None).await.unwrap();
        let second = retreat_question(&pool, &quiz.id, Some(&user), None).await.unwrap();

        assert_eq!(first.question_id, "q2");
        assert_eq!(second.question_id, "q1");
        assert_eq!(second.progress.current_question_index, 0);
        assert_eq!(second.progress.answers, before.answers);
        assert_eq!(second.progress.last_updated, before.last_updated);
    }

    #[tokio::test]
    async fn advance_on_someone_elses_quiz_changes_nothing() {
        let pool = memory_pool().await;
        users::create_user(&pool, "owner", "owner", None, "hash").await.unwrap();
        users::create_user(&pool, "intruder", "intruder", None, "hash").await.unwrap();
        let quiz = seed_quiz(&pool, "owner").await;
        let intruder = AuthUser { user_id: "intruder".to_string() };

        let result = advance_question(&pool, &quiz.id, Some(&intruder), "a", None).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        let result = retreat_question(&pool, &quiz.id, Some(&intruder), None).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, quiz.progress);
    }

    #[tokio::test]
    async fn persisted_writes_bump_version_and_reject_stale_ones() {
        let pool = memory_pool().await;
        users::create_user(&pool, "owner", "owner", None, "hash").await.unwrap();
        let quiz = seed_quiz(&pool, "owner").await;
        let user = owner();

        let first = advance_question(&pool, &quiz.id, Some(&user), "a", Some(0)).await.unwrap();
        assert_eq!(first.progress.version, 1);

        let stale = advance_question(&pool, &quiz.id, Some(&user), "b", Some(0)).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, first.progress);
    }

    #[tokio::test]
    async fn retreat_at_start_does_not_write() {
        let pool = memory_pool().await;
        users::create_user(&pool, "owner", "owner", None, "hash").await.unwrap();
        let quiz = seed_quiz(&pool, "owner").await;

        let response = retreat_question(&pool, &quiz.id, Some(&owner()), None).await.unwrap();
        assert_eq!(response.question_id, "q1");
        assert_eq!(response.progress, quiz.progress);

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(stored.progress.version, 0);
    }
}
