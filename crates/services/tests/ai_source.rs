mod support;

use std::sync::Arc;
use std::time::Duration;

use services::{AiSource, QuestionGenerator, QuestionSource, SourceError};
use support::ScriptedGenerator;

fn source_with(generator: &Arc<ScriptedGenerator>, len: usize) -> AiSource {
    let generator: Arc<dyn QuestionGenerator> = generator.clone();
    AiSource::new(generator, len)
}

async fn settle(source: &AiSource, index: usize) {
    for _ in 0..200 {
        if !source.is_pending(index) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("index {index} never settled");
}

#[tokio::test]
async fn get_then_prefetch_issues_one_request_per_index() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(30)));
    let source = source_with(&generator, 10);

    let (first, ()) = tokio::join!(source.get(0), async { source.prefetch(1) });
    assert_eq!(first.unwrap().text(), "AI0");

    let second = source.get(1).await.unwrap();
    assert_eq!(second.text(), "AI1");
    assert_eq!(generator.calls(), 2);
    assert_eq!(source.cached_count(), 2);
}

#[tokio::test]
async fn concurrent_gets_share_one_request() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(30)));
    let source = source_with(&generator, 10);

    let (a, b, c) = tokio::join!(source.get(3), source.get(3), source.get(3));
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(generator.calls(), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
}

#[tokio::test]
async fn cached_questions_are_served_without_new_requests() {
    let generator = Arc::new(ScriptedGenerator::new());
    let source = source_with(&generator, 10);

    let first = source.get(0).await.unwrap();
    let again = source.get(0).await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(source.is_ready(0));

    source.prefetch(0);
    assert!(!source.is_pending(0));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn rejected_request_leaves_cache_untouched() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.fail(2, SourceError::Rejected("rate limited".into()));
    let source = source_with(&generator, 10);

    let err = source.get(2).await.unwrap_err();
    assert_eq!(err, SourceError::Rejected("rate limited".into()));
    assert_eq!(source.cached_count(), 0);
    assert!(source.used_categories().is_empty());
    assert!(!source.is_pending(2));
    assert!(!source.is_ready(2));

    generator.recover(2);
    assert_eq!(source.get(2).await.unwrap().text(), "AI2");
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn out_of_range_is_rejected_without_a_request() {
    let generator = Arc::new(ScriptedGenerator::new());
    let source = source_with(&generator, 3);

    assert_eq!(
        source.get(3).await.unwrap_err(),
        SourceError::OutOfRange { index: 3, len: 3 }
    );
    source.prefetch(3);
    assert!(!source.is_pending(3));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn only_one_prefetch_runs_at_a_time() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(30)));
    let source = source_with(&generator, 10);

    source.prefetch(1);
    source.prefetch(2);
    assert!(source.is_pending(1));
    assert!(!source.is_pending(2));

    settle(&source, 1).await;
    assert!(source.is_ready(1));
    assert_eq!(generator.calls(), 1);

    source.prefetch(2);
    assert!(source.is_pending(2));
    settle(&source, 2).await;
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn failed_prefetch_is_retried_on_demand() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.fail(1, SourceError::Unavailable("offline".into()));
    let source = source_with(&generator, 10);

    source.prefetch(1);
    settle(&source, 1).await;
    assert!(!source.is_ready(1));

    generator.recover(1);
    assert_eq!(source.get(1).await.unwrap().text(), "AI1");
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn cancelled_get_releases_the_index() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(200)));
    let source = source_with(&generator, 10);

    let timed_out = tokio::time::timeout(Duration::from_millis(10), source.get(0)).await;
    assert!(timed_out.is_err());
    assert!(!source.is_pending(0));
    assert!(!source.is_ready(0));
}

#[tokio::test]
async fn served_categories_steer_later_requests() {
    let generator = Arc::new(ScriptedGenerator::new());
    let source = source_with(&generator, 10);

    source.get(0).await.unwrap();
    source.get(1).await.unwrap();
    source.get(2).await.unwrap();

    assert_eq!(
        source.used_categories(),
        vec![
            ScriptedGenerator::category_for(0),
            ScriptedGenerator::category_for(1),
            ScriptedGenerator::category_for(2),
        ]
    );
    let requests = generator.requests();
    assert!(requests[0].used_categories.is_empty());
    assert_eq!(requests[2].question_index, 2);
    assert_eq!(
        requests[2].used_categories,
        vec![
            ScriptedGenerator::category_for(0),
            ScriptedGenerator::category_for(1),
        ]
    );
}

#[tokio::test]
async fn clones_share_the_cache() {
    let generator = Arc::new(ScriptedGenerator::new());
    let source = source_with(&generator, 10);
    let clone = source.clone();

    source.get(4).await.unwrap();
    assert!(clone.is_ready(4));
    clone.get(4).await.unwrap();
    assert_eq!(generator.calls(), 1);
}
