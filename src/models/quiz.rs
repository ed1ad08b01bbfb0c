//! # 퀴즈 모델 정의
//!
//! 퀴즈 한 건은 생성 시점에 고정되는 정적 내용(제목, 노트, 문제 목록)과
//! 사용자가 풀면서 바뀌는 진행 상태(`Progress`)로 구성됩니다.
//!
//! ## 퀴즈 라이프사이클
//! ```text
//! [생성] progress = {0, [], now}, is_completed = false
//!   → advance / retreat 반복 (progress만 변경)
//!   → complete (결과 저장 + is_completed = true, 이후 progress 고정)
//!   → reset (결과 삭제 + progress 재초기화) → 다시 풀기
//! ```

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// 문제의 선택지. 문제마다 정확히 하나만 `is_correct = true`입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    /// 문제 안에서 고유한 ID ("a", "b", "c" ...)
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// 퀴즈에 포함된 문제. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 퀴즈 안에서 고유한 ID (UUIDv7)
    pub id: String,
    pub question: String,
    pub options: Vec<QuizOption>,
    /// 정답이 왜 정답인지에 대한 설명
    pub explanation: String,
}

impl Question {
    /// ID로 선택지를 찾습니다.
    pub fn option(&self, option_id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// 정답 선택지를 찾습니다.
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.is_correct)
    }
}

/// 사용자가 기록한 답안. 한 문제(`question_id`)당 최대 하나만 존재합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    /// None = 방문했지만 아직 고르지 않음
    pub selected_option_id: Option<String>,
}

/// 퀴즈의 진행 상태
///
/// 불변식: `0 <= current_question_index <= questions.len() - 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_question_index: i64,
    pub answers: Vec<Answer>,
    /// 마지막으로 답안이 기록된 시각 (ISO 8601)
    pub last_updated: String,
    /// 저장될 때마다 1씩 증가합니다. 클라이언트가 `expected_version`으로 보내면
    /// 그 사이에 다른 쓰기가 있었는지 감지할 수 있습니다.
    pub version: i64,
}

impl Progress {
    /// 새 퀴즈 또는 초기화된 퀴즈의 진행 상태
    pub fn initial(now: String) -> Self {
        Self {
            current_question_index: 0,
            answers: Vec::new(),
            last_updated: now,
            version: 0,
        }
    }
}

/// 퀴즈 엔티티 (API 응답 형태)
#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub notes: String,
    pub context: Option<String>,
    pub num_questions: i64,
    pub options_per_question: i64,
    pub questions: Vec<Question>,
    pub progress: Progress,
    pub is_completed: bool,
    pub created_at: String,
}

/// `quizzes` 테이블 한 행. JSON 컬럼은 `sqlx::types::Json`으로 역직렬화됩니다.
#[derive(Debug, sqlx::FromRow)]
pub struct QuizRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub notes: String,
    pub context: Option<String>,
    pub num_questions: i64,
    pub options_per_question: i64,
    pub questions: Json<Vec<Question>>,
    pub current_question_index: i64,
    pub answers: Json<Vec<Answer>>,
    pub last_updated: String,
    pub progress_version: i64,
    pub is_completed: bool,
    pub created_at: String,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            notes: row.notes,
            context: row.context,
            num_questions: row.num_questions,
            options_per_question: row.options_per_question,
            questions: row.questions.0,
            progress: Progress {
                current_question_index: row.current_question_index,
                answers: row.answers.0,
                last_updated: row.last_updated,
                version: row.progress_version,
            },
            is_completed: row.is_completed,
            created_at: row.created_at,
        }
    }
}

/// 퀴즈 목록 항목. 전체 문제 대신 진행률만 담습니다.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub context: Option<String>,
    pub created_at: String,
    pub progress_count: usize,
    pub total_questions: usize,
    pub is_completed: bool,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            context: quiz.context.clone(),
            created_at: quiz.created_at.clone(),
            progress_count: quiz.progress.answers.len(),
            total_questions: quiz.questions.len(),
            is_completed: quiz.is_completed,
        }
    }
}

/// DB에 저장할 새 퀴즈. 문제/선택지 ID는 이미 부여된 상태입니다.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub user_id: String,
    pub title: String,
    pub notes: String,
    pub context: Option<String>,
    pub num_questions: i64,
    pub options_per_question: i64,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    pub notes: String,
    pub context: Option<String>,
    pub num_questions: i64,
    pub options_per_question: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub selected_option_id: String,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetreatRequest {
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub selected_option_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuizzesRequest {
    pub ids: Vec<String>,
}

/// advance 응답: 기록된 답안과 서버가 확정한 진행 상태
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub answer: Answer,
    pub progress: Progress,
}

/// retreat 응답: 이동한 문제의 ID와 서버가 확정한 진행 상태
#[derive(Debug, Serialize)]
pub struct RetreatResponse {
    pub question_id: String,
    pub progress: Progress,
}
