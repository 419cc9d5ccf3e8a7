//! Widget and script configuration.
//!
//! Option enums serialize to the remote API's wire names (`kebab-case`), so
//! the same types are used for settings files and for the built render
//! parameters.

use serde::{Deserialize, Serialize};

use crate::callback::Callback;

/// Widget color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
	/// Light theme.
	Light,
	/// Dark theme.
	Dark,
	/// Follow the visitor's preference.
	#[default]
	Auto,
}

/// Widget size.
///
/// `Invisible` only exists on this side of the boundary: it controls the
/// reserved container box and is never forwarded to the remote API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetSize {
	/// 300x65 widget.
	#[default]
	Normal,
	/// 130x120 widget.
	Compact,
	/// Full container width, 65px high.
	Flexible,
	/// No visible widget.
	Invisible,
}

impl WidgetSize {
	/// Size forwarded to the remote API, `None` for library-only sizes.
	pub fn api_size(self) -> Option<Self> {
		match self {
			Self::Normal | Self::Compact | Self::Flexible => Some(self),
			Self::Invisible => None,
		}
	}
}

/// When the widget obtains its token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Execution {
	/// Run the challenge as soon as the widget renders.
	#[default]
	Render,
	/// Wait for an explicit `execute()`.
	Execute,
}

/// When the widget is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Appearance {
	/// Always visible.
	#[default]
	Always,
	/// Visible only while executing.
	Execute,
	/// Visible only when interaction is required.
	InteractionOnly,
}

/// Automatic retry policy on failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryMode {
	/// Retry after `retry-interval`.
	#[default]
	Auto,
	/// Never retry.
	Never,
}

/// Token refresh policy, used for both expiry and interactive timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshMode {
	/// Refresh automatically.
	#[default]
	Auto,
	/// Show a refresh button.
	Manual,
	/// Do not refresh.
	Never,
}

/// Default delay between automatic retries.
pub const DEFAULT_RETRY_INTERVAL_MS: u32 = 8000;

/// Default language (`auto` follows the visitor).
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Declarative widget options.
///
/// Every field is optional; the render parameter builder fills in the
/// defaults. Field names follow Rust conventions, the wire names live on
/// [`RenderParams`](crate::params::RenderParams).
///
/// # Example
///
/// ```ignore
/// let options = TurnstileOptions::default()
///     .with_theme(Theme::Dark)
///     .with_size(WidgetSize::Compact);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnstileOptions {
	/// Analytics action label (up to 32 `[A-Za-z0-9_-]` chars).
	pub action: Option<String>,
	/// Customer payload returned on validation (up to 255 chars).
	pub c_data: Option<String>,
	/// Color theme.
	pub theme: Option<Theme>,
	/// `auto` or an ISO 639-1 code (`en`, `pt-BR`, ...).
	pub language: Option<String>,
	/// Tab index of the widget iframe.
	pub tab_index: Option<i32>,
	/// Whether a hidden input with the token is created.
	pub response_field: Option<bool>,
	/// Name of that hidden input.
	pub response_field_name: Option<String>,
	/// Widget size.
	pub size: Option<WidgetSize>,
	/// Retry policy.
	pub retry: Option<RetryMode>,
	/// Milliseconds between retries when `retry` is `auto`.
	pub retry_interval: Option<u32>,
	/// What happens when the token expires.
	pub refresh_expired: Option<RefreshMode>,
	/// What happens when an interactive challenge times out.
	pub refresh_timeout: Option<RefreshMode>,
	/// Execution mode.
	pub execution: Option<Execution>,
	/// Appearance mode.
	pub appearance: Option<Appearance>,
}

impl TurnstileOptions {
	/// Creates empty options (all defaults).
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the action label.
	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// Set the customer data payload.
	pub fn with_c_data(mut self, c_data: impl Into<String>) -> Self {
		self.c_data = Some(c_data.into());
		self
	}

	/// Set the theme.
	pub fn with_theme(mut self, theme: Theme) -> Self {
		self.theme = Some(theme);
		self
	}

	/// Set the language.
	pub fn with_language(mut self, language: impl Into<String>) -> Self {
		self.language = Some(language.into());
		self
	}

	/// Set the iframe tab index.
	pub fn with_tab_index(mut self, tab_index: i32) -> Self {
		self.tab_index = Some(tab_index);
		self
	}

	/// Toggle the hidden response input and optionally rename it.
	pub fn with_response_field(mut self, enabled: bool, name: Option<String>) -> Self {
		self.response_field = Some(enabled);
		self.response_field_name = name;
		self
	}

	/// Set the widget size.
	pub fn with_size(mut self, size: WidgetSize) -> Self {
		self.size = Some(size);
		self
	}

	/// Set the retry policy and interval.
	pub fn with_retry(mut self, retry: RetryMode, interval_ms: Option<u32>) -> Self {
		self.retry = Some(retry);
		self.retry_interval = interval_ms;
		self
	}

	/// Set the refresh-on-expire policy.
	pub fn with_refresh_expired(mut self, mode: RefreshMode) -> Self {
		self.refresh_expired = Some(mode);
		self
	}

	/// Set the refresh-on-timeout policy.
	pub fn with_refresh_timeout(mut self, mode: RefreshMode) -> Self {
		self.refresh_timeout = Some(mode);
		self
	}

	/// Set the execution mode.
	pub fn with_execution(mut self, execution: Execution) -> Self {
		self.execution = Some(execution);
		self
	}

	/// Set the appearance mode.
	pub fn with_appearance(mut self, appearance: Appearance) -> Self {
		self.appearance = Some(appearance);
		self
	}

	/// Effective size.
	pub fn size(&self) -> WidgetSize {
		self.size.unwrap_or_default()
	}

	/// Effective execution mode.
	pub fn execution(&self) -> Execution {
		self.execution.unwrap_or_default()
	}

	/// Effective appearance mode.
	pub fn appearance(&self) -> Appearance {
		self.appearance.unwrap_or_default()
	}
}

/// Where the injected script element is appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendTarget {
	/// `document.head`
	#[default]
	Head,
	/// `document.body`
	Body,
}

impl AppendTarget {
	/// Tag name of the parent element.
	pub fn tag_name(self) -> &'static str {
		match self {
			Self::Head => "head",
			Self::Body => "body",
		}
	}
}

/// Options for the injected `<script>` element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
	/// Nonce for CSP.
	pub nonce: Option<String>,
	/// `defer` attribute (default `true`).
	pub defer: Option<bool>,
	/// `async` attribute (default `true`).
	#[serde(rename = "async")]
	pub is_async: Option<bool>,
	/// Parent element for the script.
	pub append_to: AppendTarget,
	/// Custom script element id.
	pub id: Option<String>,
	/// Custom base name of the global load callback.
	pub on_load_callback_name: Option<String>,
	/// `crossorigin` attribute.
	pub cross_origin: Option<String>,
	/// Invoked when the script fails to load.
	#[serde(skip)]
	pub on_error: Option<Callback>,
}

impl ScriptOptions {
	/// Creates default script options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the CSP nonce.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());
		self
	}

	/// Set the `defer` attribute.
	pub fn with_defer(mut self, defer: bool) -> Self {
		self.defer = Some(defer);
		self
	}

	/// Set the `async` attribute.
	pub fn with_async(mut self, is_async: bool) -> Self {
		self.is_async = Some(is_async);
		self
	}

	/// Set the parent element.
	pub fn with_append_to(mut self, target: AppendTarget) -> Self {
		self.append_to = target;
		self
	}

	/// Set a custom script id.
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Set a custom load-callback base name.
	pub fn with_on_load_callback_name(mut self, name: impl Into<String>) -> Self {
		self.on_load_callback_name = Some(name.into());
		self
	}

	/// Set the `crossorigin` attribute.
	pub fn with_cross_origin(mut self, cross_origin: impl Into<String>) -> Self {
		self.cross_origin = Some(cross_origin.into());
		self
	}

	/// Set the load-failure callback.
	pub fn with_on_error(mut self, on_error: impl Into<Callback>) -> Self {
		self.on_error = Some(on_error.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(WidgetSize::Normal, Some(WidgetSize::Normal))]
	#[case(WidgetSize::Compact, Some(WidgetSize::Compact))]
	#[case(WidgetSize::Flexible, Some(WidgetSize::Flexible))]
	#[case(WidgetSize::Invisible, None)]
	fn test_api_size_strips_library_sizes(
		#[case] size: WidgetSize,
		#[case] expected: Option<WidgetSize>,
	) {
		assert_eq!(size.api_size(), expected);
	}

	#[rstest]
	fn test_wire_names() {
		assert_eq!(
			serde_json::to_string(&Appearance::InteractionOnly).unwrap(),
			"\"interaction-only\""
		);
		assert_eq!(serde_json::to_string(&Theme::Auto).unwrap(), "\"auto\"");
		assert_eq!(serde_json::to_string(&Execution::Execute).unwrap(), "\"execute\"");
	}

	#[rstest]
	fn test_options_from_settings_json() {
		let options: TurnstileOptions = serde_json::from_str(
			r#"{ "theme": "dark", "size": "compact", "execution": "execute", "retry_interval": 2000 }"#,
		)
		.unwrap();

		assert_eq!(options.theme, Some(Theme::Dark));
		assert_eq!(options.size(), WidgetSize::Compact);
		assert_eq!(options.execution(), Execution::Execute);
		assert_eq!(options.appearance(), Appearance::Always);
		assert_eq!(options.retry_interval, Some(2000));
	}

	#[rstest]
	fn test_script_options_builder() {
		let options = ScriptOptions::new()
			.with_nonce("abc")
			.with_defer(false)
			.with_append_to(AppendTarget::Body)
			.with_on_error(|_: ()| {});

		assert_eq!(options.nonce.as_deref(), Some("abc"));
		assert_eq!(options.defer, Some(false));
		assert_eq!(options.append_to.tag_name(), "body");
		assert!(options.on_error.is_some());
	}
}
