//! Awaitable response tests
//!
//! Time is paused (`tokio::time::pause`), so deadlines and poll intervals are
//! exact and the tests run instantly.
//!
//! Success Criteria:
//! 1. Resolves within one retry interval of the success callback
//! 2. Rejects with a timeout when no success callback fires
//! 3. Reset clears the solved state the poll depends on
//! 4. Distinct rejections for an empty token, a raising API and teardown

mod common;

use std::time::Duration;

use common::{Page, TEST_PASS};
use reinhardt_turnstile_core::testing::DUMMY_TOKEN;
use reinhardt_turnstile_core::{
	ApiError, DEFAULT_RESPONSE_TIMEOUT, ResponseError, TurnstileApi, TurnstileProps,
};
use tokio::time::{Instant, sleep};

const RETRY: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_resolves_immediately_when_already_solved() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	page.api.solve_all(DUMMY_TOKEN);
	let start = Instant::now();

	let token = turnstile.handle().get_response_promise().await;

	assert_eq!(token, Ok(DUMMY_TOKEN.to_string()));
	assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_resolves_within_one_interval_of_success() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	let id = turnstile.widget_id().unwrap();
	let handle = turnstile.handle();
	let start = Instant::now();
	let solve_at = Duration::from_millis(1_250);

	let (token, ()) = tokio::join!(
		handle.get_response_promise_with(Duration::from_secs(5), RETRY),
		async {
			sleep(solve_at).await;
			page.api.solve(&id, DUMMY_TOKEN);
		}
	);

	assert_eq!(token, Ok(DUMMY_TOKEN.to_string()));
	let elapsed = start.elapsed();
	assert!(elapsed >= solve_at);
	assert!(elapsed <= solve_at + RETRY);
}

#[tokio::test(start_paused = true)]
async fn test_times_out_without_success() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	let timeout = Duration::from_millis(500);
	let start = Instant::now();

	let result = turnstile
		.handle()
		.get_response_promise_with(timeout, RETRY)
		.await;

	assert_eq!(result, Err(ResponseError::Timeout(timeout)));
	let elapsed = start.elapsed();
	assert!(elapsed >= timeout);
	assert!(elapsed < timeout + RETRY);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));

	let result = turnstile.handle().get_response_promise().await;

	assert_eq!(result, Err(ResponseError::Timeout(DEFAULT_RESPONSE_TIMEOUT)));
}

/// After a reset the poll waits for the next success callback.
#[tokio::test(start_paused = true)]
async fn test_reset_clears_solved_state() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	let id = turnstile.widget_id().unwrap();
	let handle = turnstile.handle();
	page.api.solve(&id, "first");
	assert!(turnstile.is_solved());

	handle.reset().unwrap();
	assert!(!turnstile.is_solved());

	let start = Instant::now();
	let (token, ()) = tokio::join!(
		handle.get_response_promise_with(Duration::from_secs(5), RETRY),
		async {
			sleep(Duration::from_millis(700)).await;
			page.api.solve(&id, "second");
		}
	);

	assert_eq!(token, Ok("second".to_string()));
	assert!(start.elapsed() >= Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_empty_token_is_rejected() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	page.api.solve_all("");

	let result = turnstile
		.handle()
		.get_response_promise_with(Duration::from_secs(1), RETRY)
		.await;

	assert_eq!(result, Err(ResponseError::NoResponse));
}

#[tokio::test(start_paused = true)]
async fn test_raising_api_is_rejected() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	let id = turnstile.widget_id().unwrap();
	page.api.solve(&id, DUMMY_TOKEN);
	// Widget vanishes behind the component's back.
	page.api.remove(&id).unwrap();

	let result = turnstile
		.handle()
		.get_response_promise_with(Duration::from_secs(1), RETRY)
		.await;

	assert!(matches!(
		result,
		Err(ResponseError::Failed(ApiError::Exception(_)))
	));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_mid_poll() {
	let page = Page::new();
	let turnstile = page.mount_loaded(TurnstileProps::new(TEST_PASS));
	let handle = turnstile.handle();
	let start = Instant::now();

	let (result, ()) = tokio::join!(
		handle.get_response_promise_with(Duration::from_secs(5), RETRY),
		async move {
			sleep(Duration::from_millis(300)).await;
			drop(turnstile);
		}
	);

	assert_eq!(result, Err(ResponseError::Unmounted));
	assert!(start.elapsed() < Duration::from_secs(5));
	assert!(page.api.live_widgets().is_empty());
}
