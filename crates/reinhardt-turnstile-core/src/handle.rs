//! Imperative widget handle.
//!
//! [`TurnstileHandle`] is the capability object handed to the component's
//! owner. It holds a weak reference, so it never keeps a torn-down component
//! alive; calls on a detached handle fail with
//! [`TurnstileError::Detached`].

use std::pin::pin;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::future::{Either, select};

use crate::controller::Controller;
use crate::error::{ResponseError, TurnstileError};
use crate::host::WidgetId;
use crate::time::sleep;

/// Default deadline of [`TurnstileHandle::get_response_promise`].
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default poll interval of [`TurnstileHandle::get_response_promise`].
pub const DEFAULT_RESPONSE_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Imperative surface of a mounted [`Turnstile`](crate::component::Turnstile).
///
/// Every method except the response poll logs its failure as a warning
/// before returning it, so ignoring the `Result` is acceptable.
#[derive(Clone)]
pub struct TurnstileHandle {
	controller: Weak<Controller>,
}

impl TurnstileHandle {
	pub(crate) fn new(controller: &Rc<Controller>) -> Self {
		Self {
			controller: Rc::downgrade(controller),
		}
	}

	fn controller(&self) -> Result<Rc<Controller>, TurnstileError> {
		self.controller.upgrade().ok_or(TurnstileError::Detached)
	}

	/// Whether the owning component still exists.
	pub fn is_attached(&self) -> bool {
		self.controller.strong_count() > 0
	}

	/// Renders a new widget when none is live.
	pub fn render(&self) -> Result<WidgetId, TurnstileError> {
		self.controller()?.render()
	}

	/// Runs the challenge (execution mode `execute` only).
	pub fn execute(&self) -> Result<(), TurnstileError> {
		self.controller()?.execute()
	}

	/// Resets the live widget and clears the solved state.
	pub fn reset(&self) -> Result<(), TurnstileError> {
		self.controller()?.reset()
	}

	/// Removes the live widget.
	pub fn remove(&self) -> Result<(), TurnstileError> {
		self.controller()?.remove()
	}

	/// Current token of the live widget.
	pub fn get_response(&self) -> Result<Option<String>, TurnstileError> {
		self.controller()?.get_response()
	}

	/// Whether the live widget's token expired.
	pub fn is_expired(&self) -> Result<bool, TurnstileError> {
		self.controller()?.is_expired()
	}

	/// Waits for a token with the default 30s deadline and 100ms interval.
	pub async fn get_response_promise(&self) -> Result<String, ResponseError> {
		self.get_response_promise_with(DEFAULT_RESPONSE_TIMEOUT, DEFAULT_RESPONSE_RETRY_INTERVAL)
			.await
	}

	/// Waits until the widget is solved and a token can be read.
	///
	/// Checks immediately, then every `retry_interval`. Rejects with
	/// [`ResponseError::Timeout`] once `timeout` elapses. Both timers are
	/// owned by the returned future: when it completes or is dropped nothing
	/// keeps polling.
	pub async fn get_response_promise_with(
		&self,
		timeout: Duration,
		retry_interval: Duration,
	) -> Result<String, ResponseError> {
		let poll = pin!(poll_response(self.controller.clone(), retry_interval));
		let deadline = pin!(sleep(timeout));

		match select(poll, deadline).await {
			Either::Left((result, _)) => result,
			Either::Right(((), _)) => Err(ResponseError::Timeout(timeout)),
		}
	}
}

async fn poll_response(
	controller: Weak<Controller>,
	retry_interval: Duration,
) -> Result<String, ResponseError> {
	loop {
		let step = match controller.upgrade() {
			Some(controller) => controller.poll_response(),
			None => Some(Err(ResponseError::Unmounted)),
		};
		if let Some(result) = step {
			return result;
		}
		sleep(retry_interval).await;
	}
}

impl std::fmt::Debug for TurnstileHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TurnstileHandle")
			.field("attached", &self.is_attached())
			.finish()
	}
}
