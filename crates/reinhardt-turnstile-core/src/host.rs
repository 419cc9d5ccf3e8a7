//! Host abstractions.
//!
//! The lifecycle never touches browser globals directly. It talks to a
//! [`Document`], a [`Window`] and, once loaded, a [`TurnstileApi`]. The
//! `reinhardt-turnstile-web` crate implements these over `web-sys`; the
//! [`testing`](crate::testing) module provides in-memory versions.

use std::fmt;
use std::rc::Rc;

use crate::callback::Callback;
use crate::error::{ApiError, DomError};
use crate::options::AppendTarget;
use crate::params::RenderParams;
use crate::style::ContainerStyle;

/// Opaque identifier returned by the remote `render` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(String);

impl WidgetId {
	/// Wraps a raw identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WidgetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for WidgetId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// A `<script>` element to be appended to the document.
#[derive(Debug, Clone)]
pub struct ScriptElement {
	/// Element id.
	pub id: String,
	/// Full `src`, query string included.
	pub src: String,
	/// `defer` attribute.
	pub defer: bool,
	/// `async` attribute.
	pub is_async: bool,
	/// CSP nonce.
	pub nonce: Option<String>,
	/// `crossorigin` attribute.
	pub cross_origin: Option<String>,
	/// Parent element.
	pub append_to: AppendTarget,
	/// Load-failure handler.
	pub on_error: Option<Callback>,
}

/// A live mutation subscription. Dropping it disconnects the observer.
#[must_use = "dropping an Observation disconnects it immediately"]
pub struct Observation {
	disconnect: Option<Box<dyn FnOnce()>>,
}

impl Observation {
	/// Creates an observation that runs `disconnect` when dropped.
	pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
		Self {
			disconnect: Some(Box::new(disconnect)),
		}
	}

	/// An observation with nothing to disconnect.
	pub fn detached() -> Self {
		Self { disconnect: None }
	}
}

impl Drop for Observation {
	fn drop(&mut self) {
		if let Some(disconnect) = self.disconnect.take() {
			disconnect();
		}
	}
}

impl fmt::Debug for Observation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observation")
			.field("active", &self.disconnect.is_some())
			.finish()
	}
}

/// The document the widget lives in.
pub trait Document {
	/// Whether an element with `id` exists.
	fn contains_element(&self, id: &str) -> bool;

	/// Whether a `<script>` with exactly this `src` exists.
	fn contains_script_src(&self, src: &str) -> bool;

	/// Appends a script element to its target parent.
	fn append_script(&self, script: ScriptElement) -> Result<(), DomError>;

	/// Applies the reserved box to the container element.
	fn set_container_style(&self, container_id: &str, style: &ContainerStyle)
	-> Result<(), DomError>;

	/// Calls `on_mutation` after every subtree child-list mutation.
	fn observe_mutations(&self, on_mutation: Rc<dyn Fn()>) -> Result<Observation, DomError>;

	/// Calls `on_load` when the `<script>` with `script_id` finishes loading.
	///
	/// A missing element yields a detached observation.
	fn observe_script_load(&self, script_id: &str, on_load: Rc<dyn Fn()>)
	-> Result<Observation, DomError>;
}

/// The global scope: the widget API object and the callback namespace.
pub trait Window {
	/// The global `turnstile` object, once the remote script has defined it.
	fn turnstile(&self) -> Option<Rc<dyn TurnstileApi>>;

	/// Defines a global function the remote script calls on load.
	fn set_global_callback(&self, name: &str, callback: Callback) -> Result<(), DomError>;

	/// Deletes a global function defined by [`Window::set_global_callback`].
	fn remove_global_callback(&self, name: &str);
}

/// The remote widget API (`window.turnstile`).
///
/// A single, process-wide, non-reentrant object. Callers must not issue
/// overlapping mutating calls for the same widget.
pub trait TurnstileApi {
	/// Renders a widget into the container and returns its identifier.
	fn render(&self, container_id: &str, params: &RenderParams) -> Result<WidgetId, ApiError>;

	/// Runs the challenge of a widget rendered with `execution: execute`.
	fn execute(&self, container_id: &str, params: &RenderParams) -> Result<(), ApiError>;

	/// Resets a widget.
	fn reset(&self, widget_id: &WidgetId) -> Result<(), ApiError>;

	/// Removes a widget.
	fn remove(&self, widget_id: &WidgetId) -> Result<(), ApiError>;

	/// Current token of a widget, if any.
	fn get_response(&self, widget_id: &WidgetId) -> Result<Option<String>, ApiError>;

	/// Whether the widget's token has expired.
	fn is_expired(&self, widget_id: &WidgetId) -> Result<bool, ApiError>;
}
