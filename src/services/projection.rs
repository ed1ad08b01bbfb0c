//! # 결과 화면 구성
//!
//! 저장된 결과와 퀴즈의 문제 목록을 합쳐 문제별 리뷰를 만듭니다.
//! 정답 여부는 결과의 `incorrect_question_ids`만 보고 판단하며 다시 채점하지 않습니다.

use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::guard::{authorize_quiz, QuizAccess},
};

/// 순수 함수. 문제 순서는 퀴즈의 문제 순서를 따릅니다.
pub fn project(quiz: &Quiz, result: &QuizResult) -> QuizResultsView {
    let questions = quiz
        .questions
        .iter()
        .map(|question| QuestionReview {
            id: question.id.clone(),
            question: question.question.clone(),
            explanation: question.explanation.clone(),
            user_selected_id: result.selected_option_for(&question.id).map(str::to_string),
            is_correct: !result.is_incorrect(&question.id),
            correct_answer: question.correct_option().map(|option| option.id.clone()),
        })
        .collect();

    QuizResultsView {
        result_id: result.id.clone(),
        quiz_id: quiz.id.clone(),
        title: quiz.title.clone(),
        score: result.score,
        correct_count: result.correct_count,
        total_questions: quiz.questions.len(),
        feedback: result.feedback.clone(),
        completed_at: result.completed_at.clone(),
        questions,
    }
}

/// `GET /quizzes/{id}/results`
pub async fn get_results(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
) -> Result<QuizResultsView, AppError> {
    let QuizAccess { quiz, .. } = authorize_quiz(pool, quiz_id, user).await?;

    let result = db::get_result_for_quiz(pool, &quiz.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(project(&quiz, &result))
}
