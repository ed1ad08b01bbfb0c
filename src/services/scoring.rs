//! # 완료/채점 엔진
//!
//! ## 완료 흐름
//! ```text
//! 1. 권한 검사 (클라이언트의 이전 확인과 무관하게 다시)
//! 2. 이미 완료된 퀴즈면 AlreadyCompleted
//! 3. API 키 확인 (없으면 아무것도 건드리지 않고 MissingApiKey)
//! 4. 마지막 답안을 메모리에서 기록 (progress::advance)
//! 5. 채점: 정답 수, 점수, 틀린 문제 목록, 문제별 내역
//! 6. 피드백 생성 (외부 모델, 수 초 소요)
//! 7. 진행 상태 + 결과 + 완료 플래그를 한 트랜잭션으로 저장
//! ```
//! 6단계까지는 DB에 아무것도 쓰지 않으므로, 피드백 생성이 실패하면 퀴즈는 호출 전 그대로입니다.

use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::{
        ai::{FeedbackContext, QuizAi},
        guard::{authorize_quiz, QuizAccess},
        progress,
    },
};

/// 문제 하나의 채점 내역. 피드백 프롬프트에 그대로 들어갑니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub question: String,
    /// 고른 선택지의 텍스트. 답하지 않았으면 None
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub correct_count: i64,
    pub score: i64,
    pub total: usize,
    pub incorrect_question_ids: BTreeMap<String, bool>,
    pub breakdown: Vec<QuestionOutcome>,
}

/// `round(100 * correct / total)`를 정수 연산으로 계산합니다 (0.5는 올림).
///
/// 7/10 → 70, 2/3 → 67, 1/8 → 13
pub fn percentage(correct: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    ((200 * correct + total) / (2 * total)) as i64
}

/// 문제의 정답 선택지. 정답이 없는 문제는 데이터 손상입니다.
fn correct_option_of(question: &Question) -> Result<&QuizOption, AppError> {
    question.correct_option().ok_or_else(|| {
        AppError::DataIntegrity(format!("question '{}' has no correct option", question.id))
    })
}

/// 답안 목록을 채점합니다.
///
/// - 답안이 없는 문제, 선택지가 비어 있는 답안은 오답으로 처리합니다.
/// - 답안이 퀴즈에 없는 문제나 선택지를 가리키면 `DataIntegrity`입니다.
/// - 정답 선택지가 없는 문제는 답했든 안 했든 `DataIntegrity`입니다.
pub fn score_answers(questions: &[Question], answers: &[Answer]) -> Result<ScoreCard, AppError> {
    let mut correct_count = 0usize;
    let mut incorrect_question_ids = BTreeMap::new();
    let mut breakdown = Vec::with_capacity(questions.len());

    for answer in answers {
        let question = questions
            .iter()
            .find(|q| q.id == answer.question_id)
            .ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "answer references unknown question '{}'",
                    answer.question_id
                ))
            })?;

        let correct_option = correct_option_of(question)?;

        let selected = match answer.selected_option_id.as_deref() {
            Some(option_id) => Some(question.option(option_id).ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "answer to '{}' references unknown option '{}'",
                    question.id, option_id
                ))
            })?),
            None => None,
        };

        let is_correct = selected.is_some_and(|option| option.is_correct);
        if is_correct {
            correct_count += 1;
        } else {
            incorrect_question_ids.insert(question.id.clone(), true);
        }

        breakdown.push(QuestionOutcome {
            question_id: question.id.clone(),
            question: question.question.clone(),
            selected_answer: selected.map(|option| option.text.clone()),
            correct_answer: correct_option.text.clone(),
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    // 한 번도 답하지 않은 문제
    for question in questions {
        if answers.iter().any(|a| a.question_id == question.id) {
            continue;
        }
        incorrect_question_ids.insert(question.id.clone(), true);
        breakdown.push(QuestionOutcome {
            question_id: question.id.clone(),
            question: question.question.clone(),
            selected_answer: None,
            correct_answer: correct_option_of(question)?.text.clone(),
            is_correct: false,
            explanation: question.explanation.clone(),
        });
    }

    Ok(ScoreCard {
        correct_count: correct_count as i64,
        score: percentage(correct_count, questions.len()),
        total: questions.len(),
        incorrect_question_ids,
        breakdown,
    })
}

/// `POST /quizzes/{id}/complete`
///
/// 새로 만든 결과의 ID를 반환합니다.
///
/// 마지막 선택은 마지막 문제가 아니라 *현재* 문제에 기록됩니다.
/// retreat 후에 완료하면 현재 문제의 이전 답안을 덮어씁니다.
pub async fn complete_quiz(
    pool: &SqlitePool,
    ai: &dyn QuizAi,
    quiz_id: &str,
    user: Option<&AuthUser>,
    selected_option_id: &str,
) -> Result<String, AppError> {
    let QuizAccess { quiz, user } = authorize_quiz(pool, quiz_id, user).await?;
    if quiz.is_completed {
        return Err(AppError::AlreadyCompleted);
    }

    let api_key = db::users::get_api_key(pool, &user.user_id)
        .await?
        .ok_or(AppError::MissingApiKey)?;

    let now = db::timestamp_now();
    let (final_progress, _) =
        progress::advance(&quiz.progress, &quiz.questions, selected_option_id, now.clone())?;

    let card = score_answers(&quiz.questions, &final_progress.answers)?;

    let feedback = ai
        .generate_feedback(
            &api_key,
            &FeedbackContext {
                title: quiz.title.clone(),
                notes: quiz.notes.clone(),
                context: quiz.context.clone(),
                score: card.score,
                correct_count: card.correct_count,
                total: card.total,
                breakdown: card.breakdown,
            },
        )
        .await?;

    let result = QuizResult {
        id: uuid::Uuid::now_v7().to_string(),
        quiz_id: quiz.id.clone(),
        user_id: user.user_id.clone(),
        completed_at: now,
        score: card.score,
        correct_count: card.correct_count,
        answers: final_progress.answers.clone(),
        incorrect_question_ids: card.incorrect_question_ids,
        feedback,
    };

    db::finalize_quiz(pool, &final_progress, &result).await?;

    tracing::info!(
        quiz_id = %quiz.id,
        result_id = %result.id,
        score = result.score,
        correct = result.correct_count,
        total = card.total,
        "quiz completed"
    );

    Ok(result.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{testing::memory_pool, users};
    use crate::services::testing::{seed_quiz, three_questions, FakeAi};

    fn answer(question_id: &str, option_id: Option<&str>) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            selected_option_id: option_id.map(str::to_string),
        }
    }

    async fn owner_with_key(pool: &SqlitePool) -> AuthUser {
        users::create_user(pool, "owner", "owner", None, "hash").await.unwrap();
        users::store_api_key(pool, "owner", "sk-test").await.unwrap();
        AuthUser { user_id: "owner".to_string() }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn scenario_a_tally() {
        let answers = vec![answer("q1", Some("a")), answer("q2", Some("b")), answer("q3", Some("a"))];
        let card = score_answers(&three_questions(), &answers).unwrap();

        assert_eq!(card.correct_count, 2);
        assert_eq!(card.score, 67);
        assert_eq!(
            card.incorrect_question_ids,
            BTreeMap::from([("q2".to_string(), true)])
        );
        assert_eq!(card.breakdown[1].selected_answer.as_deref(), Some("Option B for q2"));
        assert_eq!(card.breakdown[1].correct_answer, "Option A for q2");
        assert!(!card.breakdown[1].is_correct);
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let answers = vec![answer("q1", Some("a")), answer("q2", None)];
        let card = score_answers(&three_questions(), &answers).unwrap();

        assert_eq!(card.correct_count, 1);
        assert_eq!(card.score, 33);
        assert!(card.incorrect_question_ids.contains_key("q2"));
        assert!(card.incorrect_question_ids.contains_key("q3"));
        assert_eq!(card.breakdown.len(), 3);
    }

    #[test]
    fn dangling_references_are_integrity_errors() {
        let unknown_question = vec![answer("q9", Some("a"))];
        assert!(matches!(
            score_answers(&three_questions(), &unknown_question),
            Err(AppError::DataIntegrity(_))
        ));

        let unknown_option = vec![answer("q1", Some("z"))];
        assert!(matches!(
            score_answers(&three_questions(), &unknown_option),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[test]
    fn question_without_correct_option_is_integrity_error_even_unanswered() {
        let mut questions = three_questions();
        for option in &mut questions[2].options {
            option.is_correct = false;
        }

        // q3에는 답하지 않았지만 정답이 없는 문제는 그대로 손상으로 보고합니다.
        let answers = vec![answer("q1", Some("a")), answer("q2", Some("a"))];
        assert!(matches!(
            score_answers(&questions, &answers),
            Err(AppError::DataIntegrity(_))
        ));

        let answered = vec![answer("q3", Some("a"))];
        assert!(matches!(
            score_answers(&questions, &answered),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[tokio::test]
    async fn completing_after_retreat_overwrites_current_question() {
        let pool = memory_pool().await;
        let user = owner_with_key(&pool).await;
        let quiz = seed_quiz(&pool, "owner").await;
        let ai = FakeAi::with_feedback("ok");

        for option in ["a", "a", "a"] {
            progress::advance_question(&pool, &quiz.id, Some(&user), option, None).await.unwrap();
        }
        progress::retreat_question(&pool, &quiz.id, Some(&user), None).await.unwrap();

        complete_quiz(&pool, &ai, &quiz.id, Some(&user), "b").await.unwrap();

        let result = db::get_result_for_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(
            result.answers,
            vec![answer("q1", Some("a")), answer("q2", Some("b")), answer("q3", Some("a"))]
        );
        assert_eq!(result.score, 67);
        assert_eq!(
            result.incorrect_question_ids,
            BTreeMap::from([("q2".to_string(), true)])
        );
    }

    #[tokio::test]
    async fn scenario_a_end_to_end() {
        let pool = memory_pool().await;
        let user = owner_with_key(&pool).await;
        let quiz = seed_quiz(&pool, "owner").await;
        let ai = FakeAi::with_feedback("Nice work on the basics.");

        progress::advance_question(&pool, &quiz.id, Some(&user), "a", None).await.unwrap();
        progress::advance_question(&pool, &quiz.id, Some(&user), "b", None).await.unwrap();
        let result_id = complete_quiz(&pool, &ai, &quiz.id, Some(&user), "a").await.unwrap();

        let result = db::get_result_for_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(result.id, result_id);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.score, 67);
        assert_eq!(
            result.incorrect_question_ids,
            BTreeMap::from([("q2".to_string(), true)])
        );
        assert_eq!(result.answers.len(), 3);
        assert_eq!(result.answers[2], answer("q3", Some("a")));
        assert_eq!(result.feedback, "Nice work on the basics.");

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert!(stored.is_completed);
        assert_eq!(stored.progress.answers, result.answers);

        let calls = ai.feedback_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].score, 67);
        assert_eq!(calls[0].correct_count, 2);
        assert_eq!(calls[0].total, 3);
        assert_eq!(calls[0].title, quiz.title);
    }

    #[tokio::test]
    async fn second_completion_is_rejected() {
        let pool = memory_pool().await;
        let user = owner_with_key(&pool).await;
        let quiz = seed_quiz(&pool, "owner").await;
        let ai = FakeAi::with_feedback("ok");

        for option in ["a", "a"] {
            progress::advance_question(&pool, &quiz.id, Some(&user), option, None).await.unwrap();
        }
        let first = complete_quiz(&pool, &ai, &quiz.id, Some(&user), "a").await.unwrap();
        let second = complete_quiz(&pool, &ai, &quiz.id, Some(&user), "b").await;

        assert!(matches!(second, Err(AppError::AlreadyCompleted)));
        assert_eq!(ai.feedback_calls().len(), 1);
        let result = db::get_result_for_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(result.id, first);
        assert_eq!(result.score, 100);

        // 완료된 퀴즈는 더 이상 이동할 수 없습니다.
        let advance = progress::advance_question(&pool, &quiz.id, Some(&user), "b", None).await;
        assert!(matches!(advance, Err(AppError::AlreadyCompleted)));
        let retreat = progress::retreat_question(&pool, &quiz.id, Some(&user), None).await;
        assert!(matches!(retreat, Err(AppError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn feedback_failure_leaves_quiz_untouched() {
        let pool = memory_pool().await;
        let user = owner_with_key(&pool).await;
        let quiz = seed_quiz(&pool, "owner").await;

        for option in ["a", "b"] {
            progress::advance_question(&pool, &quiz.id, Some(&user), option, None).await.unwrap();
        }
        let before = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();

        let failing = FakeAi::failing();
        let outcome = complete_quiz(&pool, &failing, &quiz.id, Some(&user), "a").await;
        assert!(matches!(outcome, Err(AppError::ExternalService(_))));

        let after = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert!(!after.is_completed);
        assert_eq!(after.progress, before.progress);
        assert!(db::get_result_for_quiz(&pool, &quiz.id).await.unwrap().is_none());

        // 다시 시도하면 정상적으로 완료됩니다.
        let ai = FakeAi::with_feedback("second time lucky");
        complete_quiz(&pool, &ai, &quiz.id, Some(&user), "a").await.unwrap();
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_work() {
        let pool = memory_pool().await;
        users::create_user(&pool, "owner", "owner", None, "hash").await.unwrap();
        let user = AuthUser { user_id: "owner".to_string() };
        let quiz = seed_quiz(&pool, "owner").await;
        let ai = FakeAi::with_feedback("unused");

        let outcome = complete_quiz(&pool, &ai, &quiz.id, Some(&user), "a").await;
        assert!(matches!(outcome, Err(AppError::MissingApiKey)));
        assert!(ai.feedback_calls().is_empty());

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, quiz.progress);
    }

    #[tokio::test]
    async fn stranger_cannot_complete() {
        let pool = memory_pool().await;
        owner_with_key(&pool).await;
        users::create_user(&pool, "stranger", "stranger", None, "hash").await.unwrap();
        users::store_api_key(&pool, "stranger", "sk-other").await.unwrap();
        let quiz = seed_quiz(&pool, "owner").await;
        let stranger = AuthUser { user_id: "stranger".to_string() };
        let ai = FakeAi::with_feedback("unused");

        let outcome = complete_quiz(&pool, &ai, &quiz.id, Some(&stranger), "a").await;
        assert!(matches!(outcome, Err(AppError::Unauthorized(_))));

        let stored = db::get_quiz(&pool, &quiz.id).await.unwrap().unwrap();
        assert!(!stored.is_completed);
        assert!(db::get_result_for_quiz(&pool, &quiz.id).await.unwrap().is_none());
    }
}
