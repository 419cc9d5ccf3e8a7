//! Target-specific sleeping.

use std::time::Duration;

/// Sleeps for `duration` on the browser event loop.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(duration: Duration) {
	gloo_timers::future::sleep(duration).await;
}

/// Sleeps for `duration` on the tokio timer.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(duration: Duration) {
	tokio::time::sleep(duration).await;
}
