use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Question, QuestionBank, QuizMode, SessionState};
use quiz_core::scoring::QuizResult;
use storage::repository::{COMPLETIONS_KEY, CompletionCounter};

use super::presenter::{AnswerFeedback, Presenter, ResultSummary, Screen, SplashInfo};
use crate::error::QuizError;
use crate::generator::QuestionGenerator;
use crate::sources::{AI_SESSION_LENGTH, AiSource, ClassicSource, QuestionSource};

/// Baseline for the splash "players tested" figure.
pub const SPLASH_BASE_PLAYERS: u64 = 8000;
/// The daily offset on top of the baseline stays below this.
pub const SPLASH_DAILY_SPREAD: u32 = 5000;

/// Where an `advance` call landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Now showing the question at this index.
    Question(usize),
    Finished(ResultSummary),
}

struct ActiveSession {
    state: SessionState,
    source: Box<dyn QuestionSource>,
    /// Question on screen for `state.current_index()`, if it has loaded.
    current: Option<Arc<Question>>,
}

/// Drives one quiz session at a time: question flow, scoring, and the
/// result screen.
///
/// Every state-changing operation takes `&mut self`, so user events are
/// handled one after another. The only suspension points are generated
/// question loads.
pub struct QuizController {
    clock: Clock,
    bank: Arc<QuestionBank>,
    generator: Arc<dyn QuestionGenerator>,
    completions: Arc<dyn CompletionCounter>,
    presenter: Arc<dyn Presenter>,
    ai_length: usize,
    session: Option<ActiveSession>,
}

impl QuizController {
    #[must_use]
    pub fn new(
        bank: Arc<QuestionBank>,
        generator: Arc<dyn QuestionGenerator>,
        completions: Arc<dyn CompletionCounter>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            clock: Clock::system(),
            bank,
            generator,
            completions,
            presenter,
            ai_length: AI_SESSION_LENGTH,
            session: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_ai_length(mut self, ai_length: usize) -> Self {
        self.ai_length = ai_length.max(1);
        self
    }

    /// Mutable access to the clock, for moving a fixed clock forward.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Number of questions a session in `mode` runs through.
    #[must_use]
    pub fn session_length(&self, mode: QuizMode) -> usize {
        match mode {
            QuizMode::Classic => self.bank.len(),
            QuizMode::Ai => self.ai_length,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<&SessionState> {
        self.session.as_ref().map(|s| &s.state)
    }

    /// The question currently on screen.
    #[must_use]
    pub fn current_question(&self) -> Option<&Arc<Question>> {
        self.session.as_ref().and_then(|s| s.current.as_ref())
    }

    /// Show the start screen with the players-tested figure.
    pub async fn show_splash(&self) -> SplashInfo {
        let completions = match self.completions.read(COMPLETIONS_KEY).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "could not read completion counter");
                0
            }
        };
        let daily = u64::from(self.clock.day_seed() % SPLASH_DAILY_SPREAD);
        let info = SplashInfo {
            completions,
            players_tested: SPLASH_BASE_PLAYERS + daily + completions,
        };
        self.presenter.show_screen(Screen::Splash);
        self.presenter.show_splash(&info);
        info
    }

    /// Begin a fresh session and show its first question.
    ///
    /// Any previous session, including its generated-question cache, is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Source` if the first generated question cannot be
    /// loaded. The session stays active; `reload` retries.
    pub async fn start(&mut self, mode: QuizMode) -> Result<(), QuizError> {
        let length = self.session_length(mode);
        let source: Box<dyn QuestionSource> = match mode {
            QuizMode::Classic => Box::new(ClassicSource::new(Arc::clone(&self.bank))),
            QuizMode::Ai => Box::new(AiSource::new(Arc::clone(&self.generator), length)),
        };
        self.session = Some(ActiveSession {
            state: SessionState::new(mode, length, self.clock.now()),
            source,
            current: None,
        });
        tracing::info!(%mode, length, "quiz session started");

        self.presenter.show_screen(Screen::Quiz);
        self.show_index(0).await
    }

    /// Answer the current question.
    ///
    /// Returns `None` without side effects when no question is on screen, the
    /// option does not exist, or the question was already answered.
    pub fn select_option(&mut self, option_index: usize) -> Option<AnswerFeedback> {
        let session = self.session.as_mut()?;
        let question = session.current.clone()?;
        if option_index >= question.options().len() {
            return None;
        }
        let record = session.state.record_answer(&question, option_index)?;

        let feedback = AnswerFeedback {
            question_index: record.index,
            correct_index: question.answer_index(),
            selected_index: option_index,
            was_correct: record.was_correct,
            explanation_preview: question.explanation_preview(),
            is_last: session.state.is_last_question(),
        };
        tracing::debug!(
            index = record.index,
            correct = record.was_correct,
            score = session.state.score(),
            "answer recorded"
        );
        self.presenter.show_answer_feedback(&feedback);
        Some(feedback)
    }

    /// Move to the next question, or to the result screen after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSession` without an active session,
    /// `QuizError::Finished` once the result was shown, and
    /// `QuizError::Source` when the next generated question cannot be loaded.
    /// On a load failure the session stays on the current question and
    /// calling `advance` again retries. If the current question itself never
    /// loaded, `advance` retries it instead of moving past it.
    pub async fn advance(&mut self) -> Result<Advance, QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        let next = session.state.next_index().ok_or(QuizError::Finished)?;

        if session.current.is_none() {
            let index = session.state.current_index();
            tracing::debug!(index, "current question not loaded; retrying it");
            self.show_index(index).await?;
            return Ok(Advance::Question(index));
        }

        if next == session.state.length() {
            if let Some(session) = self.session.as_mut() {
                session.state.advance();
                session.current = None;
            }
            return Ok(Advance::Finished(self.finish().await?));
        }

        let question = self.load(next).await?;
        let session = self.session.as_mut().ok_or(QuizError::NoSession)?;
        session.state.advance();
        session.current = Some(Arc::clone(&question));
        let total = session.state.length();
        self.presenter.show_question(&question, next, total);
        Ok(Advance::Question(next))
    }

    /// Retry showing the current question after a failed load.
    ///
    /// # Errors
    ///
    /// Same as `advance`.
    pub async fn reload(&mut self) -> Result<(), QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        if session.state.is_finished() {
            return Err(QuizError::Finished);
        }
        let index = session.state.current_index();
        self.show_index(index).await
    }

    /// Abandon the session (if any) and go back to the start screen.
    pub async fn close(&mut self) -> SplashInfo {
        if let Some(session) = self.session.take() {
            tracing::info!(
                mode = %session.state.mode(),
                index = session.state.current_index(),
                "quiz session closed"
            );
        }
        self.show_splash().await
    }

    async fn show_index(&mut self, index: usize) -> Result<(), QuizError> {
        let question = self.load(index).await?;
        let session = self.session.as_mut().ok_or(QuizError::NoSession)?;
        session.current = Some(Arc::clone(&question));
        let total = session.state.length();
        self.presenter.show_question(&question, index, total);
        Ok(())
    }

    /// Resolve `index` from the session source, with the loading indicator
    /// up while it suspends, and keep the following question warming up.
    async fn load(&self, index: usize) -> Result<Arc<Question>, QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        let source = session.source.as_ref();

        // Skipped while another prefetch is still running; retried below.
        source.prefetch(index + 1);

        let loading = !source.is_ready(index);
        if loading {
            self.presenter.show_loading(true);
        }
        let result = source.get(index).await;
        if loading {
            self.presenter.show_loading(false);
        }

        match result {
            Ok(question) => {
                source.prefetch(index + 1);
                Ok(question)
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "could not load question");
                self.presenter.show_error(&err.user_message());
                Err(err.into())
            }
        }
    }

    async fn finish(&mut self) -> Result<ResultSummary, QuizError> {
        let completions = match self.completions.increment(COMPLETIONS_KEY).await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!(error = %err, "could not update completion counter");
                None
            }
        };

        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        let state = &session.state;
        let summary = ResultSummary {
            result: QuizResult::from_score(state.score()),
            mode: state.mode(),
            correct_count: state.correct_count(),
            total: state.length(),
            elapsed: self.clock.elapsed_since(state.started_at()),
            completions,
        };
        tracing::info!(
            mode = %summary.mode,
            score = summary.result.score,
            tier = summary.result.tier.name(),
            percentile = summary.result.percentile,
            "quiz session finished"
        );

        self.presenter.show_screen(Screen::Result);
        self.presenter.show_result(&summary);
        Ok(summary)
    }
}

