#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionBank, QuestionDraft};
use services::{
    AnswerFeedback, GenerateRequest, Presenter, QuestionGenerator, ResultSummary, Screen,
    SourceError, SplashInfo,
};
use storage::repository::{CompletionCounter, StorageError};

pub fn question(text: &str, points: u32, answer: usize, category: &str) -> Question {
    QuestionDraft {
        text: text.into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer,
        points,
        category: category.into(),
        difficulty: 2,
        explanation: format!("{text} 的解析"),
        scene: None,
    }
    .validate()
    .unwrap()
}

/// Three questions worth 40, 30 and 30 points; the answer is always option 1.
pub fn three_question_bank() -> QuestionBank {
    QuestionBank::new(vec![
        question("Q0", 40, 1, "基础规则"),
        question("Q1", 30, 1, "牌型判断"),
        question("Q2", 30, 1, "炸弹使用"),
    ])
    .unwrap()
}

/// Generator that answers every index with a deterministic question and
/// counts calls. Individual indices can be made to fail until recovered.
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
    failures: Mutex<HashMap<usize, SourceError>>,
    delay: Duration,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail(&self, index: usize, error: SourceError) {
        self.failures.lock().unwrap().insert(index, error);
    }

    pub fn recover(&self, index: usize) {
        self.failures.lock().unwrap().remove(&index);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn category_for(index: usize) -> String {
        format!("类别{index}")
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<Question, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let failure = self
            .failures
            .lock()
            .unwrap()
            .get(&request.question_index)
            .cloned();
        if let Some(err) = failure {
            return Err(err);
        }
        let index = request.question_index;
        Ok(question(
            &format!("AI{index}"),
            10,
            0,
            &Self::category_for(index),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Screen(Screen),
    Splash(SplashInfo),
    Question { index: usize, total: usize, text: String },
    Feedback(AnswerFeedback),
    Loading(bool),
    Result(ResultSummary),
    Error(String),
}

#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<Event>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn show_screen(&self, screen: Screen) {
        self.push(Event::Screen(screen));
    }

    fn show_splash(&self, info: &SplashInfo) {
        self.push(Event::Splash(*info));
    }

    fn show_question(&self, question: &Question, index: usize, total: usize) {
        self.push(Event::Question {
            index,
            total,
            text: question.text().to_string(),
        });
    }

    fn show_answer_feedback(&self, feedback: &AnswerFeedback) {
        self.push(Event::Feedback(feedback.clone()));
    }

    fn show_loading(&self, loading: bool) {
        self.push(Event::Loading(loading));
    }

    fn show_result(&self, summary: &ResultSummary) {
        self.push(Event::Result(summary.clone()));
    }

    fn show_error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }
}

/// Counter whose backend is always down.
pub struct BrokenCounter;

#[async_trait]
impl CompletionCounter for BrokenCounter {
    async fn read(&self, _key: &str) -> Result<u64, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn increment(&self, _key: &str) -> Result<u64, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}
