//! Error types.
//!
//! Everything except [`ResponseError`] is recoverable: the lifecycle logs it as
//! a warning and leaves local widget state unchanged. Only the awaitable
//! response path surfaces failures to the caller as a rejection.

use std::time::Duration;

/// Failure reported by the remote widget API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
	/// The global `turnstile` object lacks the requested method.
	#[error("turnstile.{0} is not available")]
	MissingMethod(&'static str),
	/// The remote call raised an exception.
	#[error("turnstile call raised: {0}")]
	Exception(String),
	/// `render` returned without a widget identifier.
	#[error("turnstile.render returned no widget id")]
	NoWidgetId,
}

/// Failure to touch the document or the global namespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
	/// No `window`/`document` is reachable (e.g. SSR).
	#[error("document is not available")]
	NoDocument,
	/// The append target (`head` or `body`) does not exist.
	#[error("append target <{0}> not found")]
	MissingAppendTarget(&'static str),
	/// Any other DOM exception, stringified.
	#[error("DOM operation failed: {0}")]
	Operation(String),
}

/// Recoverable conditions raised by the imperative widget handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnstileError {
	/// The global widget API has not been loaded.
	#[error("Turnstile has not been loaded")]
	ApiUnavailable,
	/// The container element is not mounted.
	#[error("the container has not been rendered yet")]
	ContainerMissing,
	/// `render()` was called while a widget is live.
	#[error("widget already rendered: {0}")]
	AlreadyRendered(String),
	/// The operation needs a live widget and there is none.
	#[error("the widget has not been rendered")]
	NotRendered,
	/// `execute()` was called while the execution mode is `render`.
	#[error("execute() requires options.execution = \"execute\"")]
	ExecutionMode,
	/// No site key was provided.
	#[error("sitekey was not provided")]
	MissingSiteKey,
	/// The component owning the handle has been dropped.
	#[error("the Turnstile component is no longer mounted")]
	Detached,
	/// The remote API raised.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// The document rejected an operation.
	#[error(transparent)]
	Dom(#[from] DomError),
	/// Render parameters could not be serialized for comparison.
	#[error("failed to serialize render parameters: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for TurnstileError {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}

/// Rejections of the awaitable response path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
	/// No success callback fired before the deadline.
	#[error("Timeout after {0:?}")]
	Timeout(Duration),
	/// The widget reported solved but returned an empty token.
	#[error("No response received")]
	NoResponse,
	/// The remote API raised while reading the token.
	#[error("Failed to get response: {0}")]
	Failed(ApiError),
	/// The component was torn down while waiting.
	#[error("the Turnstile component was unmounted while waiting for a response")]
	Unmounted,
}
