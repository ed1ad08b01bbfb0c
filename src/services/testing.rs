//! 테스트 공용 픽스처: 작은 퀴즈와 네트워크 없이 동작하는 `QuizAi` 구현

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    db,
    models::*,
    services::ai::{
        AiError, FeedbackContext, GeneratedOption, GeneratedQuestion, GeneratedQuiz,
        GenerationRequest, QuizAi,
    },
};

/// q1, q2, q3. 각 문제는 선택지 "a"(정답)와 "b"를 가집니다.
pub fn three_questions() -> Vec<Question> {
    ["q1", "q2", "q3"]
        .into_iter()
        .map(|id| Question {
            id: id.to_string(),
            question: format!("Question {}?", id),
            options: vec![
                QuizOption {
                    id: "a".to_string(),
                    text: format!("Option A for {}", id),
                    is_correct: true,
                },
                QuizOption {
                    id: "b".to_string(),
                    text: format!("Option B for {}", id),
                    is_correct: false,
                },
            ],
            explanation: format!("A is right for {}", id),
        })
        .collect()
}

/// `three_questions()`로 구성된 퀴즈를 저장합니다. 사용자는 미리 만들어 두어야 합니다.
pub async fn seed_quiz(pool: &SqlitePool, user_id: &str) -> Quiz {
    let new_quiz = NewQuiz {
        user_id: user_id.to_string(),
        title: "Three little questions".to_string(),
        notes: "Some notes worth studying.".to_string(),
        context: None,
        num_questions: 3,
        options_per_question: 2,
        questions: three_questions(),
    };
    let id = uuid::Uuid::now_v7().to_string();
    db::insert_quiz(pool, &id, &new_quiz, &db::timestamp_now())
        .await
        .unwrap()
}

/// 정해진 응답을 돌려주고 호출 내역을 기록하는 가짜 모델
#[derive(Default)]
pub struct FakeAi {
    quiz: Option<GeneratedQuiz>,
    feedback: Option<String>,
    generation_calls: Mutex<Vec<GenerationRequest>>,
    feedback_calls: Mutex<Vec<FeedbackContext>>,
}

impl FakeAi {
    pub fn with_feedback(feedback: &str) -> Self {
        Self {
            feedback: Some(feedback.to_string()),
            ..Self::default()
        }
    }

    pub fn with_quiz(quiz: GeneratedQuiz) -> Self {
        Self {
            quiz: Some(quiz),
            feedback: Some("feedback".to_string()),
            ..Self::default()
        }
    }

    /// 모든 호출이 실패합니다.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn generation_calls(&self) -> Vec<GenerationRequest> {
        self.generation_calls.lock().unwrap().clone()
    }

    pub fn feedback_calls(&self) -> Vec<FeedbackContext> {
        self.feedback_calls.lock().unwrap().clone()
    }
}

/// 요청한 모양대로 첫 번째 선택지가 정답인 퀴즈를 만듭니다.
pub fn generated_quiz(num_questions: usize, options_per_question: usize) -> GeneratedQuiz {
    GeneratedQuiz {
        title: "Generated quiz".to_string(),
        questions: (0..num_questions)
            .map(|q| GeneratedQuestion {
                question: format!("Generated question {}?", q + 1),
                options: (0..options_per_question)
                    .map(|o| GeneratedOption {
                        text: format!("choice {}", o + 1),
                        is_correct: o == 0,
                    })
                    .collect(),
                explanation: "the first one".to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl QuizAi for FakeAi {
    async fn generate_quiz(
        &self,
        _api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuiz, AiError> {
        self.generation_calls.lock().unwrap().push(request.clone());
        self.quiz.clone().ok_or(AiError::Status {
            status: 503,
            body: "model unavailable".to_string(),
        })
    }

    async fn generate_feedback(
        &self,
        _api_key: &str,
        context: &FeedbackContext,
    ) -> Result<String, AiError> {
        self.feedback_calls.lock().unwrap().push(context.clone());
        self.feedback.clone().ok_or(AiError::Status {
            status: 503,
            body: "model unavailable".to_string(),
        })
    }
}
