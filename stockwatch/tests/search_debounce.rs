//! Debounced search timing tests on a paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{search_hit, ScriptedProvider};
use stockwatch::{DebounceState, FetchError, MarketDataProvider, SearchDebouncer};
use stockwatch_common::config::SearchConfig;

const QUIET: Duration = Duration::from_millis(300);

fn debouncer(provider: &Arc<ScriptedProvider>) -> SearchDebouncer {
    let provider: Arc<dyn MarketDataProvider> = provider.clone();
    SearchDebouncer::from_config(provider, &SearchConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_issues_one_search_with_last_text() {
    let provider = Arc::new(
        ScriptedProvider::new().with_search("tesla", Ok(vec![search_hit("TSLA", "TESLA INC")])),
    );
    let mut debouncer = debouncer(&provider);
    let results = debouncer.subscribe();

    for text in ["t", "te", "tes", "tesl", "tesla"] {
        debouncer.query_changed(text);
        assert_eq!(debouncer.state(), DebounceState::Pending);
        tokio::time::sleep(Duration::from_millis(120)).await;
    }
    assert_eq!(provider.search_calls(), 0);

    tokio::time::sleep(QUIET).await;

    assert_eq!(provider.search_calls(), 1);
    assert_eq!(*provider.search_log.lock().unwrap(), vec!["tesla".to_string()]);
    assert_eq!(results.borrow().len(), 1);
    assert_eq!(results.borrow()[0].symbol, "TSLA");
    assert_eq!(debouncer.state(), DebounceState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_quiet_gaps_issue_separate_searches() {
    let provider = Arc::new(ScriptedProvider::new());
    let mut debouncer = debouncer(&provider);

    debouncer.query_changed("apple");
    tokio::time::sleep(QUIET + Duration::from_millis(1)).await;
    debouncer.query_changed("amazon");
    tokio::time::sleep(QUIET + Duration::from_millis(1)).await;

    assert_eq!(
        *provider.search_log.lock().unwrap(),
        vec!["apple".to_string(), "amazon".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_query_clears_without_fetch() {
    let provider = Arc::new(
        ScriptedProvider::new().with_search("snap", Ok(vec![search_hit("SNAP", "SNAP INC")])),
    );
    let mut debouncer = debouncer(&provider);
    let results = debouncer.subscribe();

    debouncer.query_changed("snap");
    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(results.borrow().len(), 1);

    debouncer.query_changed("   ");
    assert_eq!(debouncer.state(), DebounceState::Idle);
    assert!(results.borrow().is_empty());

    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(provider.search_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_blank_query_cancels_pending_search() {
    let provider = Arc::new(ScriptedProvider::new());
    let mut debouncer = debouncer(&provider);

    debouncer.query_changed("nvda");
    tokio::time::sleep(Duration::from_millis(100)).await;
    debouncer.query_changed("");
    tokio::time::sleep(QUIET * 2).await;

    assert_eq!(provider.search_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_clears_results() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_search("pins", Ok(vec![search_hit("PINS", "PINTEREST INC")]))
            .with_search("pinz", Err(FetchError::Transport("Request timeout".into()))),
    );
    let mut debouncer = debouncer(&provider);
    let results = debouncer.subscribe();

    debouncer.query_changed("pins");
    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(results.borrow().len(), 1);

    debouncer.query_changed("pinz");
    tokio::time::sleep(QUIET * 2).await;
    assert!(results.borrow().is_empty());
    assert_eq!(provider.search_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_in_flight_results_are_discarded() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_latency(Duration::from_millis(500))
            .with_search("goog", Ok(vec![search_hit("GOOG", "ALPHABET INC")]))
            .with_search("msft", Ok(vec![search_hit("MSFT", "MICROSOFT CORP")])),
    );
    let mut debouncer = debouncer(&provider);
    let results = debouncer.subscribe();

    debouncer.query_changed("goog");
    // Timer fired, search still in flight
    tokio::time::sleep(QUIET + Duration::from_millis(100)).await;
    assert_eq!(provider.search_calls(), 1);

    debouncer.query_changed("msft");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(provider.search_calls(), 2);
    assert_eq!(results.borrow().len(), 1);
    assert_eq!(results.borrow()[0].symbol, "MSFT");
}
