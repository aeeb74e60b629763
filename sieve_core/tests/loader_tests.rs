mod common;

use common::{article, failure, page, urls, ScriptedRenderer};
use sieve_core::strategy::SelectorStrategy;
use sieve_core::{SieveError, StrategyRegistry, WebLoader};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const FAST: &str = "https://fast.example/";
const SLOW: &str = "https://slow.example/";
const OTHER: &str = "https://other.example/";

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// The paused clock jumps straight to timer instants, give or take one
/// millisecond of timer-wheel rounding.
fn assert_elapsed(started: Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed <= expected + Duration::from_millis(2),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_urls_returns_immediately() {
    let renderer = ScriptedRenderer::new().build();
    let loader = WebLoader::new(renderer.clone());

    let started = Instant::now();
    let pages = loader.load(&[], secs(20)).await.unwrap();
    assert!(pages.is_empty());
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(renderer.started().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_all_pages_before_deadline() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .with(SLOW, page(3, &article("Slow", "steady")))
        .with(OTHER, page(2, &article("Other", "middle")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let started = Instant::now();
    let pages = loader
        .load(&urls(&[FAST, SLOW, OTHER]), secs(20))
        .await
        .unwrap();

    // Settled at the last completion, not at the deadline.
    assert_elapsed(started, secs(3));
    let order: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(order, vec![FAST, OTHER, SLOW]);
    assert_eq!(pages[0].title, "Fast");
    assert_eq!(pages[0].content, "<p>quick</p>");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_returns_partial_results_and_cancels_the_rest() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .with(SLOW, page(25, &article("Slow", "late")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let started = Instant::now();
    let pages = loader.load(&urls(&[FAST, SLOW]), secs(20)).await.unwrap();

    assert_elapsed(started, secs(20));
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].url.as_str(), FAST);

    tokio::time::sleep(secs(30)).await;
    assert_eq!(renderer.finished(), vec![FAST.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_before_any_completion_is_empty_not_error() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(10, &article("A", "a")))
        .with(SLOW, page(12, &article("B", "b")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let pages = loader.load(&urls(&[FAST, SLOW]), secs(5)).await.unwrap();
    assert!(pages.is_empty());
    assert_eq!(renderer.started().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_fails_the_batch() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .with(OTHER, failure(2, 502))
        .with(SLOW, page(6, &article("Slow", "late")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let started = Instant::now();
    let err = loader
        .load(&urls(&[FAST, OTHER, SLOW]), secs(20))
        .await
        .unwrap_err();

    assert_elapsed(started, secs(2));
    match err {
        SieveError::Fetch { url, .. } => assert_eq!(url, OTHER),
        other => panic!("expected fetch failure, got {other:?}"),
    }

    tokio::time::sleep(secs(30)).await;
    assert!(!renderer.finished().contains(&SLOW.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_page_is_dropped() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, "   \n  "))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let pages = loader.load(&urls(&[FAST]), secs(20)).await.unwrap();
    assert!(pages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_page_does_not_hold_up_siblings() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, "\u{0}\u{0}binary"))
        .with(OTHER, page(2, &article("Other", "fine")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let started = Instant::now();
    let pages = loader.load(&urls(&[FAST, OTHER]), secs(20)).await.unwrap();
    assert_elapsed(started, secs(2));
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "Other");
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_urls_load_once() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let pages = loader.load(&urls(&[FAST, FAST]), secs(20)).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(renderer.started().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_input_url_fails_before_fetching() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let err = loader
        .load_strs(&[FAST, "not a url"], secs(20))
        .await
        .unwrap_err();
    assert!(matches!(err, SieveError::InvalidUrl(_)));
    assert!(renderer.started().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_site_strategy_miss_drops_only_that_page() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .with(OTHER, page(1, "<html><body><div id=\"story\">Scoop</div></body></html>"))
        .with(SLOW, page(1, "<html><body><p>no story here</p></body></html>"))
        .build();

    let mut strategies = StrategyRegistry::new();
    strategies
        .register(
            r"^https://(other|slow)\.example/",
            Arc::new(SelectorStrategy::new("#story", None).unwrap()),
        )
        .unwrap();
    let loader = WebLoader::new(renderer.clone()).with_strategies(strategies);

    let pages = loader
        .load(&urls(&[FAST, OTHER, SLOW]), secs(20))
        .await
        .unwrap();
    let mut loaded: Vec<(&str, &str)> = pages
        .iter()
        .map(|p| (p.url.as_str(), p.content.as_str()))
        .collect();
    loaded.sort();
    assert_eq!(loaded, vec![(FAST, "<p>quick</p>"), (OTHER, "Scoop")]);
}

#[tokio::test(start_paused = true)]
async fn test_site_ready_check_reaches_renderer() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .with(
            OTHER,
            page(1, "<html><body><div id=\"story\"><footer>end</footer></div></body></html>"),
        )
        .with(SLOW, page(1, "<html><body><div id=\"story\">still loading</div></body></html>"))
        .build();

    let mut strategies = StrategyRegistry::new();
    strategies
        .register(
            r"^https://(other|slow)\.example/",
            Arc::new(SelectorStrategy::new("#story", Some("#story footer")).unwrap()),
        )
        .unwrap();
    let loader = WebLoader::new(renderer.clone()).with_strategies(strategies);

    loader
        .load(&urls(&[FAST, OTHER, SLOW]), secs(20))
        .await
        .unwrap();

    assert_eq!(
        renderer.readiness(),
        vec![
            (FAST.to_string(), true),
            (OTHER.to_string(), true),
            (SLOW.to_string(), false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_is_rejected() {
    let renderer = ScriptedRenderer::new()
        .with(FAST, page(1, &article("Fast", "quick")))
        .build();
    let loader = WebLoader::new(renderer.clone());

    let err = loader
        .load(&urls(&[FAST]), Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, SieveError::InvalidInput(_)));
    assert!(renderer.started().is_empty());

    // No URLs settles before the timeout is looked at.
    assert!(loader.load(&[], Duration::ZERO).await.unwrap().is_empty());
}
