//! # 퀴즈 생성/조회/초기화/삭제
//!
//! 진행(advance/retreat)과 완료를 제외한 퀴즈 라이프사이클 작업입니다.

use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::{
        ai::{GeneratedQuiz, GenerationRequest, QuizAi},
        guard::{authorize_quiz, require_user, QuizAccess},
    },
};

pub const MAX_QUESTIONS: i64 = 20;
pub const MIN_OPTIONS: i64 = 2;
pub const MAX_OPTIONS: i64 = 6;

fn validate_request(request: &CreateQuizRequest) -> Result<(), AppError> {
    if request.notes.trim().is_empty() {
        return Err(AppError::Validation("Notes must not be empty".to_string()));
    }
    if !(1..=MAX_QUESTIONS).contains(&request.num_questions) {
        return Err(AppError::Validation(format!(
            "num_questions must be between 1 and {}",
            MAX_QUESTIONS
        )));
    }
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&request.options_per_question) {
        return Err(AppError::Validation(format!(
            "options_per_question must be between {} and {}",
            MIN_OPTIONS, MAX_OPTIONS
        )));
    }
    Ok(())
}

/// 선택지 ID: 0 → "a", 1 → "b", ...
fn option_id(index: usize) -> String {
    char::from(b'a' + index as u8).to_string()
}

/// 모델이 만든 퀴즈에 ID를 붙여 저장 가능한 문제 목록으로 바꿉니다.
fn assign_ids(generated: GeneratedQuiz) -> Vec<Question> {
    generated
        .questions
        .into_iter()
        .map(|question| Question {
            id: uuid::Uuid::now_v7().to_string(),
            question: question.question,
            options: question
                .options
                .into_iter()
                .enumerate()
                .map(|(index, option)| QuizOption {
                    id: option_id(index),
                    text: option.text,
                    is_correct: option.is_correct,
                })
                .collect(),
            explanation: question.explanation,
        })
        .collect()
}

/// `POST /quizzes`
///
/// 모델 응답은 저장 전에 요청한 모양과 비교합니다.
pub async fn create_quiz(
    pool: &SqlitePool,
    ai: &dyn QuizAi,
    user: Option<&AuthUser>,
    request: CreateQuizRequest,
) -> Result<Quiz, AppError> {
    let user = require_user(user)?;
    validate_request(&request)?;

    let api_key = db::users::get_api_key(pool, &user.user_id)
        .await?
        .ok_or(AppError::MissingApiKey)?;

    let context = request
        .context
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let generation = GenerationRequest {
        notes: request.notes.clone(),
        context: context.clone(),
        num_questions: request.num_questions as usize,
        options_per_question: request.options_per_question as usize,
    };
    let generated = ai.generate_quiz(&api_key, &generation).await?;
    generated.validate(&generation)?;

    let new_quiz = NewQuiz {
        user_id: user.user_id.clone(),
        title: generated.title.trim().to_string(),
        notes: request.notes,
        context,
        num_questions: request.num_questions,
        options_per_question: request.options_per_question,
        questions: assign_ids(generated),
    };

    let id = uuid::Uuid::now_v7().to_string();
    let quiz = db::insert_quiz(pool, &id, &new_quiz, &db::timestamp_now()).await?;

    tracing::info!(quiz_id = %quiz.id, user_id = %user.user_id, questions = quiz.questions.len(), "quiz created");
    Ok(quiz)
}

/// `GET /quizzes`
pub async fn list_quizzes(
    pool: &SqlitePool,
    user: Option<&AuthUser>,
) -> Result<Vec<QuizSummary>, AppError> {
    let user = require_user(user)?;
    let quizzes = db::list_quizzes_for_user(pool, &user.user_id).await?;
    Ok(quizzes.iter().map(QuizSummary::from).collect())
}

/// `GET /quizzes/{id}`
pub async fn get_quiz(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
) -> Result<Quiz, AppError> {
    let QuizAccess { quiz, .. } = authorize_quiz(pool, quiz_id, user).await?;
    Ok(quiz)
}

/// `POST /quizzes/{id}/reset`
///
/// 결과 삭제와 진행 상태 재초기화는 한 트랜잭션입니다.
pub async fn reset_quiz(
    pool: &SqlitePool,
    quiz_id: &str,
    user: Option<&AuthUser>,
) -> Result<(), AppError> {
    let QuizAccess { quiz, .. } = authorize_quiz(pool, quiz_id, user).await?;

    if !db::reset_quiz(pool, &quiz.id, &db::timestamp_now()).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(quiz_id = %quiz.id, "quiz reset");
    Ok(())
}

/// `POST /quizzes/delete`
///
/// 모든 ID의 권한을 먼저 확인하고, 하나라도 실패하면 아무것도 지우지 않습니다.
pub async fn delete_quizzes(
    pool: &SqlitePool,
    ids: &[String],
    user: Option<&AuthUser>,
) -> Result<u64, AppError> {
    require_user(user)?;
    if ids.is_empty() {
        return Err(AppError::Validation("No quiz ids given".to_string()));
    }

    for id in ids {
        authorize_quiz(pool, id, user).await?;
    }

    let deleted = db::delete_quizzes(pool, ids).await?;
    tracing::info!(count = deleted, "quizzes deleted");
    Ok(deleted)
}
