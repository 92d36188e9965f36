use std::sync::Arc;

use async_trait::async_trait;

use quiz_core::model::{Question, QuestionBank};

use super::QuestionSource;
use crate::error::SourceError;

/// Serves questions straight from the pre-loaded bank.
#[derive(Debug, Clone)]
pub struct ClassicSource {
    bank: Arc<QuestionBank>,
}

impl ClassicSource {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }
}

#[async_trait]
impl QuestionSource for ClassicSource {
    fn len(&self) -> usize {
        self.bank.len()
    }

    fn is_ready(&self, index: usize) -> bool {
        index < self.bank.len()
    }

    async fn get(&self, index: usize) -> Result<Arc<Question>, SourceError> {
        self.bank
            .get(index)
            .cloned()
            .ok_or(SourceError::OutOfRange {
                index,
                len: self.bank.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_bank_questions_in_order() {
        let bank = Arc::new(QuestionBank::builtin().unwrap());
        let source = ClassicSource::new(Arc::clone(&bank));

        assert_eq!(source.len(), bank.len());
        assert!(source.is_ready(0));
        let first = source.get(0).await.unwrap();
        assert!(Arc::ptr_eq(&first, bank.get(0).unwrap()));
    }

    #[tokio::test]
    async fn index_past_bank_is_out_of_range() {
        let bank = Arc::new(QuestionBank::builtin().unwrap());
        let source = ClassicSource::new(bank);
        let len = source.len();

        assert!(!source.is_ready(len));
        assert_eq!(
            source.get(len).await,
            Err(SourceError::OutOfRange { index: len, len })
        );
    }
}
