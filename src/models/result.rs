use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::Answer;

/// 채점 결과 엔티티. 완료 시 한 번 만들어지고, 초기화 전까지 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub completed_at: String,
    /// 정답률(%)
    pub score: i64,
    pub correct_count: i64,
    /// 완료 시점 답안 목록의 스냅샷
    pub answers: Vec<Answer>,
    /// 틀린 문제 ID → true
    pub incorrect_question_ids: BTreeMap<String, bool>,
    pub feedback: String,
}

impl QuizResult {
    pub fn is_incorrect(&self, question_id: &str) -> bool {
        self.incorrect_question_ids
            .get(question_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn selected_option_for(&self, question_id: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|answer| answer.question_id == question_id)
            .and_then(|answer| answer.selected_option_id.as_deref())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuizResultRow {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub completed_at: String,
    pub score: i64,
    pub correct_count: i64,
    pub answers: Json<Vec<Answer>>,
    pub incorrect_question_ids: Json<BTreeMap<String, bool>>,
    pub feedback: String,
}

impl From<QuizResultRow> for QuizResult {
    fn from(row: QuizResultRow) -> Self {
        Self {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            completed_at: row.completed_at,
            score: row.score,
            correct_count: row.correct_count,
            answers: row.answers.0,
            incorrect_question_ids: row.incorrect_question_ids.0,
            feedback: row.feedback,
        }
    }
}

/// 결과 화면의 문제별 리뷰 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    pub id: String,
    pub question: String,
    pub explanation: String,
    pub user_selected_id: Option<String>,
    pub is_correct: bool,
    /// 정답 선택지 ID (문제의 선택지에서 가져오며 결과에 따로 저장하지 않음)
    pub correct_answer: Option<String>,
}

/// `GET /quizzes/{id}/results` 응답
#[derive(Debug, Clone, Serialize)]
pub struct QuizResultsView {
    pub result_id: String,
    pub quiz_id: String,
    pub title: String,
    pub score: i64,
    pub correct_count: i64,
    pub total_questions: usize,
    pub feedback: String,
    pub completed_at: String,
    pub questions: Vec<QuestionReview>,
}
