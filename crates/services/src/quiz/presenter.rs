use chrono::Duration;

use quiz_core::model::{Question, QuizMode};
use quiz_core::scoring::QuizResult;
use quiz_core::time::format_elapsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Quiz,
    Result,
}

/// Data for the start screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplashInfo {
    pub completions: u64,
    /// Headline "players tested" figure.
    pub players_tested: u64,
}

/// What the player sees right after choosing an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_index: usize,
    pub correct_index: usize,
    pub selected_index: usize,
    pub was_correct: bool,
    pub explanation_preview: String,
    pub is_last: bool,
}

impl AnswerFeedback {
    /// Label for the control that moves on.
    #[must_use]
    pub fn next_label(&self) -> &'static str {
        if self.is_last { "查看结果 →" } else { "下一题 →" }
    }

    /// Explanation prefixed with a correctness mark.
    #[must_use]
    pub fn explanation_line(&self) -> String {
        let mark = if self.was_correct { "✓" } else { "✗" };
        format!("{mark} {}", self.explanation_preview)
    }
}

/// Outcome of a finished session, ready for the result screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub result: QuizResult,
    pub mode: QuizMode,
    pub correct_count: u32,
    pub total: usize,
    pub elapsed: Duration,
    /// Completion count after this session, if the counter could be updated.
    pub completions: Option<u64>,
}

impl ResultSummary {
    /// e.g. `7 / 10 答对 · 用时 2:05 · AI出题`
    #[must_use]
    pub fn detail_line(&self) -> String {
        format!(
            "{} / {} 答对 · 用时 {}{}",
            self.correct_count,
            self.total,
            format_elapsed(self.elapsed),
            self.mode.tag()
        )
    }

    #[must_use]
    pub fn percentile_line(&self) -> String {
        format!("超越 {}% 玩家", self.result.percentile)
    }

    #[must_use]
    pub fn skill_line(&self) -> String {
        let tier = self.result.tier;
        format!("实力等级 · {} · {}", tier.name(), tier.label())
    }
}

/// Rendering side of the quiz. Calls are fire-and-forget.
pub trait Presenter: Send + Sync {
    fn show_screen(&self, screen: Screen);
    fn show_splash(&self, info: &SplashInfo);
    fn show_question(&self, question: &Question, index: usize, total: usize);
    fn show_answer_feedback(&self, feedback: &AnswerFeedback);
    fn show_loading(&self, loading: bool);
    fn show_result(&self, summary: &ResultSummary);
    fn show_error(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(mode: QuizMode) -> ResultSummary {
        ResultSummary {
            result: QuizResult::from_score(70),
            mode,
            correct_count: 7,
            total: 10,
            elapsed: Duration::seconds(125),
            completions: Some(3),
        }
    }

    #[test]
    fn detail_line_carries_mode_tag() {
        assert_eq!(summary(QuizMode::Classic).detail_line(), "7 / 10 答对 · 用时 2:05");
        assert_eq!(
            summary(QuizMode::Ai).detail_line(),
            "7 / 10 答对 · 用时 2:05 · AI出题"
        );
    }

    #[test]
    fn result_lines_use_tier_and_percentile() {
        let summary = summary(QuizMode::Classic);
        assert_eq!(summary.percentile_line(), "超越 73% 玩家");
        assert_eq!(summary.skill_line(), "实力等级 · 进阶 · 黄金");
    }

    #[test]
    fn feedback_label_switches_on_last_question() {
        let mut feedback = AnswerFeedback {
            question_index: 0,
            correct_index: 1,
            selected_index: 0,
            was_correct: false,
            explanation_preview: "两副牌".into(),
            is_last: false,
        };
        assert_eq!(feedback.next_label(), "下一题 →");
        assert_eq!(feedback.explanation_line(), "✗ 两副牌");
        feedback.is_last = true;
        assert_eq!(feedback.next_label(), "查看结果 →");
    }
}
