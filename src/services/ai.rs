//! # AI 모델 연동 서비스
//!
//! 퀴즈 생성(노트 → 구조화된 퀴즈)과 피드백 작성(답안 + 노트 → 텍스트)은
//! 외부 모델에 맡깁니다. 서버 코드는 `QuizAi` 트레이트만 바라보고,
//! 실제 구현은 OpenAI 호환 chat-completions API를 호출하는 `OpenAiClient`입니다.
//! 테스트에서는 네트워크 없이 동작하는 가짜 구현으로 교체합니다.
//!
//! API 키는 사용자마다 다르므로 설정이 아니라 호출 인자로 전달됩니다.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::scoring::QuestionOutcome;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("generated quiz is invalid: {0}")]
    InvalidQuiz(String),
}

/// 퀴즈 생성 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub notes: String,
    pub context: Option<String>,
    pub num_questions: usize,
    pub options_per_question: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<GeneratedOption>,
    pub explanation: String,
}

/// 모델이 돌려준 퀴즈. 아직 ID가 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub title: String,
    pub questions: Vec<GeneratedQuestion>,
}

impl GeneratedQuiz {
    /// 요청한 모양과 일치하는지 확인합니다.
    /// 문제 수, 문제별 선택지 수, 문제마다 정답이 정확히 하나인지.
    pub fn validate(&self, request: &GenerationRequest) -> Result<(), AiError> {
        if self.title.trim().is_empty() {
            return Err(AiError::InvalidQuiz("missing title".to_string()));
        }
        if self.questions.len() != request.num_questions {
            return Err(AiError::InvalidQuiz(format!(
                "expected {} questions, got {}",
                request.num_questions,
                self.questions.len()
            )));
        }

        for (index, question) in self.questions.iter().enumerate() {
            if question.options.len() != request.options_per_question {
                return Err(AiError::InvalidQuiz(format!(
                    "question {} has {} options, expected {}",
                    index + 1,
                    question.options.len(),
                    request.options_per_question
                )));
            }
            let correct = question.options.iter().filter(|o| o.is_correct).count();
            if correct != 1 {
                return Err(AiError::InvalidQuiz(format!(
                    "question {} has {} correct options",
                    index + 1,
                    correct
                )));
            }
        }

        Ok(())
    }
}

/// 피드백 작성에 필요한 정보 묶음
#[derive(Debug, Clone)]
pub struct FeedbackContext {
    pub title: String,
    pub notes: String,
    pub context: Option<String>,
    pub score: i64,
    pub correct_count: i64,
    pub total: usize,
    pub breakdown: Vec<QuestionOutcome>,
}

#[async_trait]
pub trait QuizAi: Send + Sync {
    async fn generate_quiz(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuiz, AiError>;

    async fn generate_feedback(
        &self,
        api_key: &str,
        context: &FeedbackContext,
    ) -> Result<String, AiError>;
}

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// chat-completions를 호출하고 첫 번째 선택지의 본문을 반환합니다.
    async fn complete(&self, api_key: &str, body: Value) -> Result<String, AiError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AiError::MalformedResponse("missing message content".to_string()))
    }
}

#[async_trait]
impl QuizAi for OpenAiClient {
    async fn generate_quiz(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuiz, AiError> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": QUIZ_SYSTEM_PROMPT },
                { "role": "user", "content": quiz_prompt(request) },
            ],
        });

        let content = self.complete(api_key, body).await?;
        let quiz: GeneratedQuiz = serde_json::from_str(&content)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        quiz.validate(request)?;

        Ok(quiz)
    }

    async fn generate_feedback(
        &self,
        api_key: &str,
        context: &FeedbackContext,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": feedback_prompt(context) },
            ],
        });

        let text = self.complete(api_key, body).await?;
        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse("empty feedback".to_string()));
        }
        Ok(text)
    }
}

const QUIZ_SYSTEM_PROMPT: &str = "You write multiple-choice study quizzes. Reply with a single JSON object \
of the form {\"title\": string, \"questions\": [{\"question\": string, \"options\": \
[{\"text\": string, \"is_correct\": boolean}], \"explanation\": string}]}.";

fn quiz_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!("Generate a quiz based on the following notes:\n\n{}\n\n", request.notes);
    if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Additional context: {}\n\n", context));
    }
    prompt.push_str(&format!(
        "Create exactly {} challenging questions with exactly {} options each. \
         Exactly one option per question must be correct. \
         Give a short explanation of why the correct answer is correct. \
         Also write a catchy, descriptive title for the quiz; avoid words like \"Mastering\" or \"Exploring\".",
        request.num_questions, request.options_per_question
    ));
    prompt
}

fn feedback_prompt(context: &FeedbackContext) -> String {
    let breakdown = context
        .breakdown
        .iter()
        .map(|outcome| {
            format!(
                "Question: {}\nTheir answer: {}\nCorrect answer: {}\n{}\nExplanation: {}",
                outcome.question,
                outcome.selected_answer.as_deref().unwrap_or("(no answer)"),
                outcome.correct_answer,
                if outcome.is_correct { "Correct" } else { "Incorrect" },
                outcome.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let extra = context
        .context
        .as_deref()
        .map(|c| format!("Additional context: {}\n\n", c))
        .unwrap_or_default();

    format!(
        "The user took a quiz titled \"{title}\" based on these notes:\n\n{notes}\n\n{extra}\
         They scored {score}% ({correct}/{total} correct).\n\n\
         Here is how they did on each question:\n\n{breakdown}\n\n\
         Write feedback in markdown with clear headings covering: what they understand well, \
         which concepts to review, 2-3 targeted recommendations, and a short motivating close. \
         Talk to the user directly as \"you\" and keep the language simple and a little casual.",
        title = context.title,
        notes = context.notes,
        extra = extra,
        score = context.score,
        correct = context.correct_count,
        total = context.total,
        breakdown = breakdown,
    )
}
