//! # 낙관적 진행 상태 미러
//!
//! 클라이언트가 서버 응답을 기다리지 않고 다음 문제를 보여주기 위한 로컬 사본입니다.
//!
//! ```text
//! predict_advance / predict_retreat  →  pending = 예측값   (view는 pending을 보여줌)
//! 서버 성공                          →  confirm(서버 값)   (pending 버림, confirmed 교체)
//! 서버 실패                          →  rollback()         (pending 버림, confirmed 유지)
//! ```
//!
//! 예측은 서버와 같은 순수 전이 함수(`services::progress`)로 계산하지만,
//! 서버 값 없이 확정으로 승격되지는 않습니다.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{Answer, Progress, Question},
    services::progress,
};

#[derive(Debug, Clone)]
struct MirrorEntry {
    questions: Vec<Question>,
    confirmed: Progress,
    pending: Option<Progress>,
}

impl MirrorEntry {
    fn current(&self) -> &Progress {
        self.pending.as_ref().unwrap_or(&self.confirmed)
    }
}

/// 퀴즈 ID별 미러
#[derive(Debug, Default)]
pub struct OptimisticMirror {
    entries: HashMap<String, MirrorEntry>,
}

impl OptimisticMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서버에서 받은 퀴즈로 미러를 시작합니다. 이미 있으면 덮어씁니다.
    pub fn track(&mut self, quiz_id: &str, questions: Vec<Question>, confirmed: Progress) {
        self.entries.insert(
            quiz_id.to_string(),
            MirrorEntry {
                questions,
                confirmed,
                pending: None,
            },
        );
    }

    /// 퀴즈를 삭제했거나 화면을 떠날 때 미러에서 뺍니다.
    pub fn forget(&mut self, quiz_id: &str) {
        self.entries.remove(quiz_id);
    }

    /// 화면에 보여줄 값: 예측이 있으면 예측, 없으면 확정값
    pub fn view(&self, quiz_id: &str) -> Option<&Progress> {
        self.entries.get(quiz_id).map(MirrorEntry::current)
    }

    pub fn confirmed(&self, quiz_id: &str) -> Option<&Progress> {
        self.entries.get(quiz_id).map(|entry| &entry.confirmed)
    }

    pub fn is_pending(&self, quiz_id: &str) -> bool {
        self.entries
            .get(quiz_id)
            .is_some_and(|entry| entry.pending.is_some())
    }

    /// 요청에 실어 보낼 `expected_version`
    pub fn expected_version(&self, quiz_id: &str) -> Option<i64> {
        self.confirmed(quiz_id).map(|progress| progress.version)
    }

    /// 답안 기록을 예측합니다. 잘못된 선택이면 예측을 남기지 않습니다.
    pub fn predict_advance(
        &mut self,
        quiz_id: &str,
        selected_option_id: &str,
        now: String,
    ) -> Result<Answer, AppError> {
        let entry = self.entry_mut(quiz_id)?;
        let (next, answer) =
            progress::advance(entry.current(), &entry.questions, selected_option_id, now)?;
        entry.pending = Some(next);
        Ok(answer)
    }

    /// 이전 문제로의 이동을 예측하고 이동할 문제의 ID를 반환합니다.
    pub fn predict_retreat(&mut self, quiz_id: &str) -> Result<String, AppError> {
        let entry = self.entry_mut(quiz_id)?;
        let (next, question_id) = progress::retreat(entry.current(), &entry.questions)?;
        entry.pending = Some(next);
        Ok(question_id)
    }

    /// 서버가 돌려준 진행 상태를 확정값으로 받아들입니다.
    pub fn confirm(&mut self, quiz_id: &str, server: Progress) -> Result<(), AppError> {
        let entry = self.entry_mut(quiz_id)?;
        entry.confirmed = server;
        entry.pending = None;
        Ok(())
    }

    /// 예측을 버리고 마지막 확정값으로 돌아갑니다.
    pub fn rollback(&mut self, quiz_id: &str) -> Result<(), AppError> {
        let entry = self.entry_mut(quiz_id)?;
        if entry.pending.take().is_some() {
            tracing::debug!(quiz_id, "optimistic progress rolled back");
        }
        Ok(())
    }

    fn entry_mut(&mut self, quiz_id: &str) -> Result<&mut MirrorEntry, AppError> {
        self.entries.get_mut(quiz_id).ok_or(AppError::NotFound)
    }
}
