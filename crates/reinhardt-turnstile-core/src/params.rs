//! Render configuration builder.
//!
//! Turns [`TurnstileProps`] into the parameter object the remote `render` and
//! `execute` calls accept. The serialized form (callbacks skipped) is the
//! fingerprint the lifecycle compares to decide whether a live widget must be
//! re-created.

use serde::Serialize;

use crate::callback::Callback;
use crate::options::{
	Appearance, DEFAULT_LANGUAGE, DEFAULT_RETRY_INTERVAL_MS, Execution, RefreshMode, RetryMode,
	Theme, WidgetSize,
};
use crate::props::TurnstileProps;
use crate::widget::SharedWidgetHandle;

/// Callbacks handed to the remote widget.
#[derive(Debug, Clone, Default)]
pub struct WidgetCallbacks {
	/// `callback`
	pub success: Option<Callback<String>>,
	/// `error-callback`
	pub error: Option<Callback<String>>,
	/// `expired-callback`
	pub expired: Option<Callback>,
	/// `before-interactive-callback`
	pub before_interactive: Option<Callback>,
	/// `after-interactive-callback`
	pub after_interactive: Option<Callback>,
	/// `unsupported-callback`
	pub unsupported: Option<Callback>,
	/// `timeout-callback`
	pub timeout: Option<Callback>,
}

/// Parameters of the remote `render`/`execute` calls, in wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct RenderParams {
	/// `sitekey`
	pub sitekey: String,
	/// `action`
	#[serde(skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	/// `cData`
	#[serde(rename = "cData", skip_serializing_if = "Option::is_none")]
	pub c_data: Option<String>,
	/// `theme`
	pub theme: Theme,
	/// `language`
	pub language: String,
	/// `tabindex`
	#[serde(rename = "tabindex", skip_serializing_if = "Option::is_none")]
	pub tab_index: Option<i32>,
	/// `response-field`
	#[serde(rename = "response-field", skip_serializing_if = "Option::is_none")]
	pub response_field: Option<bool>,
	/// `response-field-name`
	#[serde(rename = "response-field-name", skip_serializing_if = "Option::is_none")]
	pub response_field_name: Option<String>,
	/// `size`; absent for library-only sizes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<WidgetSize>,
	/// `retry`
	pub retry: RetryMode,
	/// `retry-interval`
	#[serde(rename = "retry-interval")]
	pub retry_interval: u32,
	/// `refresh-expired`
	#[serde(rename = "refresh-expired")]
	pub refresh_expired: RefreshMode,
	/// `refresh-timeout`
	#[serde(rename = "refresh-timeout")]
	pub refresh_timeout: RefreshMode,
	/// `execution`
	pub execution: Execution,
	/// `appearance`
	pub appearance: Appearance,
	/// Widget callbacks. Not part of the fingerprint.
	#[serde(skip)]
	pub callbacks: WidgetCallbacks,
	/// Identities of the caller-supplied callbacks.
	#[serde(skip)]
	callback_identity: Vec<usize>,
}

impl RenderParams {
	/// Builds the parameters for `props`.
	///
	/// Defaults: theme `auto`, language `auto`, retry `auto` every 8000ms,
	/// refresh `auto`, appearance `always`, execution `render`. The success
	/// callback is wrapped so it also marks `handle` solved.
	pub(crate) fn build(props: &TurnstileProps, handle: &SharedWidgetHandle) -> Self {
		let options = &props.options;
		let callbacks = &props.callbacks;

		let success = {
			let handle = SharedWidgetHandle::clone(handle);
			let on_success = callbacks.on_success.clone();
			Callback::new(move |token: String| {
				handle.borrow_mut().mark_solved(token.clone());
				if let Some(on_success) = &on_success {
					on_success.call(token);
				}
			})
		};

		Self {
			sitekey: props.site_key.clone(),
			action: options.action.clone(),
			c_data: options.c_data.clone(),
			theme: options.theme.unwrap_or_default(),
			language: options
				.language
				.clone()
				.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
			tab_index: options.tab_index,
			response_field: options.response_field,
			response_field_name: options.response_field_name.clone(),
			size: options.size().api_size(),
			retry: options.retry.unwrap_or_default(),
			retry_interval: options
				.retry_interval
				.filter(|&ms| ms != 0)
				.unwrap_or(DEFAULT_RETRY_INTERVAL_MS),
			refresh_expired: options.refresh_expired.unwrap_or_default(),
			refresh_timeout: options.refresh_timeout.unwrap_or_default(),
			execution: options.execution(),
			appearance: options.appearance(),
			callbacks: WidgetCallbacks {
				success: Some(success),
				error: callbacks.on_error.clone(),
				expired: callbacks.on_expire.clone(),
				before_interactive: callbacks.on_before_interactive.clone(),
				after_interactive: callbacks.on_after_interactive.clone(),
				unsupported: callbacks.on_unsupported.clone(),
				timeout: callbacks.on_timeout.clone(),
			},
			callback_identity: callbacks.widget_identity(),
		}
	}

	/// Serialized parameters without callbacks.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	/// Structural-equality key.
	///
	/// With `include_callbacks`, the identities of the caller's callbacks are
	/// appended, so replacing a callback changes the key.
	pub fn fingerprint(&self, include_callbacks: bool) -> Result<String, serde_json::Error> {
		let json = self.to_json()?;
		if !include_callbacks {
			return Ok(json);
		}
		let ids = self
			.callback_identity
			.iter()
			.map(|id| format!("{:x}", id))
			.collect::<Vec<_>>()
			.join(",");
		Ok(format!("{}#{}", json, ids))
	}
}
