//! Declarative component input.

use crate::callback::Callback;
use crate::host::WidgetId;
use crate::options::{ScriptOptions, TurnstileOptions};

/// Callbacks supplied by the component owner.
///
/// The first seven are forwarded to the remote widget; `on_widget_load` and
/// `on_load_script` are lifecycle notifications raised by this crate.
#[derive(Debug, Clone, Default)]
pub struct TurnstileCallbacks {
	/// Challenge solved; receives the token.
	pub on_success: Option<Callback<String>>,
	/// Widget error; receives the client-side error code.
	pub on_error: Option<Callback<String>>,
	/// Token expired without a reset.
	pub on_expire: Option<Callback>,
	/// Challenge is about to become interactive.
	pub on_before_interactive: Option<Callback>,
	/// Challenge left interactive mode.
	pub on_after_interactive: Option<Callback>,
	/// Browser not supported.
	pub on_unsupported: Option<Callback>,
	/// Interactive challenge timed out.
	pub on_timeout: Option<Callback>,
	/// A widget was rendered (first mount, explicit render, or re-render).
	pub on_widget_load: Option<Callback<WidgetId>>,
	/// The script tag became present in the document.
	pub on_load_script: Option<Callback>,
}

impl TurnstileCallbacks {
	/// Identities of the callbacks forwarded to the remote widget, in a fixed
	/// order. Absent callbacks are `0`.
	pub fn widget_identity(&self) -> Vec<usize> {
		let unit = |cb: &Option<Callback>| cb.as_ref().map_or(0, Callback::identity);
		let token = |cb: &Option<Callback<String>>| cb.as_ref().map_or(0, Callback::identity);
		vec![
			token(&self.on_success),
			token(&self.on_error),
			unit(&self.on_expire),
			unit(&self.on_before_interactive),
			unit(&self.on_after_interactive),
			unit(&self.on_unsupported),
			unit(&self.on_timeout),
		]
	}
}

/// Default container tag.
pub const DEFAULT_CONTAINER_TAG: &str = "div";

/// Props of the [`Turnstile`](crate::component::Turnstile) component.
///
/// # Example
///
/// ```ignore
/// let props = TurnstileProps::new("1x00000000000000000000AA")
///     .with_options(TurnstileOptions::default().with_theme(Theme::Dark))
///     .on_success(|token: String| info_log!("token {}", token));
/// ```
#[derive(Debug, Clone)]
pub struct TurnstileProps {
	/// Site key of the widget. An empty key logs a warning and renders nothing.
	pub site_key: String,
	/// Widget options.
	pub options: TurnstileOptions,
	/// Script injection options. Fixed at construction.
	pub script_options: ScriptOptions,
	/// Inject the script automatically (default `true`). Fixed at construction.
	pub inject_script: bool,
	/// Container element id (default `cf-turnstile`). Fixed at construction.
	pub id: Option<String>,
	/// Container tag (default `div`).
	pub tag: String,
	/// Extra attributes for the container element.
	pub attributes: Vec<(String, String)>,
	/// Also re-render when a widget callback's identity changes.
	pub rerender_on_callback_change: bool,
	/// Callbacks.
	pub callbacks: TurnstileCallbacks,
}

impl Default for TurnstileProps {
	fn default() -> Self {
		Self {
			site_key: String::new(),
			options: TurnstileOptions::default(),
			script_options: ScriptOptions::default(),
			inject_script: true,
			id: None,
			tag: DEFAULT_CONTAINER_TAG.to_string(),
			attributes: Vec::new(),
			rerender_on_callback_change: false,
			callbacks: TurnstileCallbacks::default(),
		}
	}
}

impl TurnstileProps {
	/// Props with the given site key and defaults elsewhere.
	pub fn new(site_key: impl Into<String>) -> Self {
		Self {
			site_key: site_key.into(),
			..Self::default()
		}
	}

	/// Set the widget options.
	pub fn with_options(mut self, options: TurnstileOptions) -> Self {
		self.options = options;
		self
	}

	/// Set the script options.
	pub fn with_script_options(mut self, script_options: ScriptOptions) -> Self {
		self.script_options = script_options;
		self
	}

	/// Toggle automatic script injection.
	pub fn with_inject_script(mut self, inject_script: bool) -> Self {
		self.inject_script = inject_script;
		self
	}

	/// Set the container id.
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Set the container tag.
	pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
		self.tag = tag.into();
		self
	}

	/// Add an attribute to the container element.
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push((name.into(), value.into()));
		self
	}

	/// Re-render whenever a widget callback's identity changes.
	pub fn with_rerender_on_callback_change(mut self, enabled: bool) -> Self {
		self.rerender_on_callback_change = enabled;
		self
	}

	/// Set the success callback.
	pub fn on_success(mut self, f: impl Into<Callback<String>>) -> Self {
		self.callbacks.on_success = Some(f.into());
		self
	}

	/// Set the error callback.
	pub fn on_error(mut self, f: impl Into<Callback<String>>) -> Self {
		self.callbacks.on_error = Some(f.into());
		self
	}

	/// Set the expire callback.
	pub fn on_expire(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_expire = Some(f.into());
		self
	}

	/// Set the before-interactive callback.
	pub fn on_before_interactive(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_before_interactive = Some(f.into());
		self
	}

	/// Set the after-interactive callback.
	pub fn on_after_interactive(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_after_interactive = Some(f.into());
		self
	}

	/// Set the unsupported-browser callback.
	pub fn on_unsupported(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_unsupported = Some(f.into());
		self
	}

	/// Set the interactive-timeout callback.
	pub fn on_timeout(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_timeout = Some(f.into());
		self
	}

	/// Set the widget-load notification.
	pub fn on_widget_load(mut self, f: impl Into<Callback<WidgetId>>) -> Self {
		self.callbacks.on_widget_load = Some(f.into());
		self
	}

	/// Set the script-load notification.
	pub fn on_load_script(mut self, f: impl Into<Callback>) -> Self {
		self.callbacks.on_load_script = Some(f.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let props = TurnstileProps::default();
		assert!(props.inject_script);
		assert_eq!(props.tag, "div");
		assert!(!props.rerender_on_callback_change);
	}

	#[rstest]
	fn test_widget_identity_tracks_clones() {
		let props = TurnstileProps::new("key").on_success(|_: String| {});
		let cloned = props.clone();
		assert_eq!(
			props.callbacks.widget_identity(),
			cloned.callbacks.widget_identity()
		);

		let replaced = props.clone().on_success(|_: String| {});
		assert_ne!(
			props.callbacks.widget_identity(),
			replaced.callbacks.widget_identity()
		);
	}

	#[rstest]
	fn test_lifecycle_notifications_do_not_count_as_widget_callbacks() {
		let props = TurnstileProps::new("key");
		let with_load = props.clone().on_load_script(|_: ()| {});
		assert_eq!(
			props.callbacks.widget_identity(),
			with_load.callbacks.widget_identity()
		);
	}
}
