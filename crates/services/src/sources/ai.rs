use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use quiz_core::model::Question;

use super::QuestionSource;
use crate::error::SourceError;
use crate::generator::{GenerateRequest, QuestionGenerator};

/// Number of questions in a generated session.
pub const AI_SESSION_LENGTH: usize = 10;

/// Lazily generated questions with a per-session cache.
///
/// Every index has at most one generator request in flight: the `pending` map
/// holds a settle signal per in-flight index and later callers wait on it
/// instead of issuing their own. Only one background prefetch runs at a time.
///
/// Clones share the same cache. A new session builds a new `AiSource`, so
/// requests still running for an abandoned session land in a cache nobody
/// reads.
#[derive(Clone)]
pub struct AiSource {
    generator: Arc<dyn QuestionGenerator>,
    len: usize,
    cache: Arc<Mutex<AiCache>>,
}

#[derive(Default)]
struct AiCache {
    questions: HashMap<usize, Arc<Question>>,
    pending: HashMap<usize, watch::Receiver<bool>>,
    prefetching: Option<usize>,
    used_categories: Vec<String>,
}

fn lock(cache: &Mutex<AiCache>) -> MutexGuard<'_, AiCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ownership of the single in-flight request for `index`.
///
/// Dropping it (on success, failure or cancellation) clears the pending entry
/// and wakes every waiter.
struct PendingRequest {
    cache: Arc<Mutex<AiCache>>,
    index: usize,
    settled: watch::Sender<bool>,
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        {
            let mut cache = lock(&self.cache);
            cache.pending.remove(&self.index);
            if cache.prefetching == Some(self.index) {
                cache.prefetching = None;
            }
        }
        self.settled.send_replace(true);
    }
}

enum Step {
    Wait(watch::Receiver<bool>),
    Fetch(PendingRequest),
}

impl AiSource {
    #[must_use]
    pub fn new(generator: Arc<dyn QuestionGenerator>, len: usize) -> Self {
        Self {
            generator,
            len,
            cache: Arc::new(Mutex::new(AiCache::default())),
        }
    }

    /// Categories served so far, in order.
    #[must_use]
    pub fn used_categories(&self) -> Vec<String> {
        lock(&self.cache).used_categories.clone()
    }

    #[must_use]
    pub fn cached_count(&self) -> usize {
        lock(&self.cache).questions.len()
    }

    #[must_use]
    pub fn is_pending(&self, index: usize) -> bool {
        lock(&self.cache).pending.contains_key(&index)
    }

    fn claim(&self, cache: &mut AiCache, index: usize) -> PendingRequest {
        let (settled, waiter) = watch::channel(false);
        cache.pending.insert(index, waiter);
        PendingRequest {
            cache: Arc::clone(&self.cache),
            index,
            settled,
        }
    }

    async fn fetch(&self, pending: PendingRequest) -> Result<Arc<Question>, SourceError> {
        let request = GenerateRequest {
            question_index: pending.index,
            used_categories: self.used_categories(),
        };

        let question = Arc::new(self.generator.generate(&request).await?);
        {
            let mut cache = lock(&self.cache);
            if !question.category().is_empty() {
                cache.used_categories.push(question.category().to_string());
            }
            cache.questions.insert(pending.index, Arc::clone(&question));
        }
        tracing::debug!(index = pending.index, "generated question cached");
        drop(pending);
        Ok(question)
    }
}

#[async_trait]
impl QuestionSource for AiSource {
    fn len(&self) -> usize {
        self.len
    }

    fn is_ready(&self, index: usize) -> bool {
        lock(&self.cache).questions.contains_key(&index)
    }

    async fn get(&self, index: usize) -> Result<Arc<Question>, SourceError> {
        if index >= self.len {
            return Err(SourceError::OutOfRange {
                index,
                len: self.len,
            });
        }

        loop {
            let step = {
                let mut cache = lock(&self.cache);
                if let Some(question) = cache.questions.get(&index) {
                    return Ok(Arc::clone(question));
                }
                match cache.pending.get(&index) {
                    Some(waiter) => Step::Wait(waiter.clone()),
                    None => Step::Fetch(self.claim(&mut cache, index)),
                }
            };

            match step {
                Step::Wait(mut waiter) => {
                    tracing::debug!(index, "waiting on in-flight question request");
                    // A closed channel means the request settled as well.
                    let _ = waiter.wait_for(|settled| *settled).await;
                }
                Step::Fetch(pending) => return self.fetch(pending).await,
            }
        }
    }

    fn prefetch(&self, index: usize) {
        let pending = {
            let mut cache = lock(&self.cache);
            if index >= self.len
                || cache.questions.contains_key(&index)
                || cache.pending.contains_key(&index)
            {
                return;
            }
            if let Some(running) = cache.prefetching {
                tracing::debug!(index, running, "prefetch already running; skipped");
                return;
            }
            cache.prefetching = Some(index);
            self.claim(&mut cache, index)
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(index, "no async runtime; prefetch skipped");
            return;
        };
        let source = self.clone();
        runtime.spawn(async move {
            if let Err(err) = source.fetch(pending).await {
                tracing::warn!(index, error = %err, "prefetch failed; will retry on demand");
            }
        });
    }
}
