//! Script injector.
//!
//! Puts the remote widget script into the document exactly once per script
//! identity. Completion of [`inject_script`] says nothing about readiness;
//! that signal comes from the [`ScriptPresence`](crate::presence::ScriptPresence)
//! observer and the [`ReadinessGate`](crate::readiness::ReadinessGate).

use crate::error::DomError;
use crate::host::{Document, ScriptElement};
use crate::options::ScriptOptions;
use crate::{debug_log, warn_log};

/// Remote script location.
pub const SCRIPT_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/api.js";

/// Default script element id.
pub const DEFAULT_SCRIPT_ID: &str = "cf-turnstile-script";

/// Default container element id.
pub const DEFAULT_CONTAINER_ID: &str = "cf-turnstile";

/// Default base name of the global load callback.
pub const DEFAULT_ONLOAD_NAME: &str = "onloadTurnstileCallback";

/// Render mode requested from the remote script. Widgets are always rendered
/// explicitly by the lifecycle.
pub const EXPLICIT_RENDER: &str = "explicit";

/// Identity of one injected script: element id plus load-callback name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptIdentity {
	/// `id` of the `<script>` element.
	pub script_id: String,
	/// Name of the global function the script calls once loaded.
	pub onload_name: String,
}

impl ScriptIdentity {
	/// Builds an identity from explicit parts.
	pub fn new(script_id: impl Into<String>, onload_name: impl Into<String>) -> Self {
		Self {
			script_id: script_id.into(),
			onload_name: onload_name.into(),
		}
	}

	/// Derives the identity for a container.
	///
	/// With library-managed injection every container gets its own script id
	/// (`cf-turnstile-script__<container>`) unless a custom id is given. With
	/// caller-managed injection the shared default id is watched instead. The
	/// load-callback name is always suffixed with the container id so that
	/// several widgets on one page never share a callback.
	pub fn for_container(container_id: &str, options: &ScriptOptions, inject_script: bool) -> Self {
		let script_id = match (&options.id, inject_script) {
			(Some(id), _) => id.clone(),
			(None, true) => format!("{}__{}", DEFAULT_SCRIPT_ID, container_id),
			(None, false) => DEFAULT_SCRIPT_ID.to_string(),
		};
		let base = options
			.on_load_callback_name
			.as_deref()
			.unwrap_or(DEFAULT_ONLOAD_NAME);

		Self {
			script_id,
			onload_name: format!("{}__{}", base, container_id),
		}
	}

	/// `src` of the script for this identity.
	pub fn src(&self) -> String {
		script_src(&self.onload_name, EXPLICIT_RENDER)
	}
}

/// Builds the script URL carrying the load-callback name and render mode.
pub fn script_src(onload_name: &str, render: &str) -> String {
	format!(
		"{}?onload={}&render={}",
		SCRIPT_URL,
		urlencoding::encode(onload_name),
		urlencoding::encode(render)
	)
}

/// Result of an injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
	/// A new element was appended.
	Injected,
	/// An element with the same id or the same `src` already exists.
	AlreadyPresent,
}

/// Ensures a script with `identity` is present in `document`.
///
/// Check and append happen without yielding, so concurrent mounts on the UI
/// thread degrade to [`InjectOutcome::AlreadyPresent`]. Load failures are
/// reported through `options.on_error`; nothing is retried.
pub fn inject_script(
	document: &dyn Document,
	identity: &ScriptIdentity,
	options: &ScriptOptions,
) -> Result<InjectOutcome, DomError> {
	if document.contains_element(&identity.script_id) {
		return Ok(InjectOutcome::AlreadyPresent);
	}

	let src = identity.src();
	if document.contains_script_src(&src) {
		debug_log!("script with src {} already present", src);
		return Ok(InjectOutcome::AlreadyPresent);
	}

	let on_error = options.on_error.clone();
	let script_id = identity.script_id.clone();
	let script = ScriptElement {
		id: identity.script_id.clone(),
		src,
		defer: options.defer.unwrap_or(true),
		is_async: options.is_async.unwrap_or(true),
		nonce: options.nonce.clone().filter(|n| !n.is_empty()),
		cross_origin: options.cross_origin.clone().filter(|c| !c.is_empty()),
		append_to: options.append_to,
		on_error: Some(crate::callback::Callback::new(move |()| {
			warn_log!("Error loading turnstile script {}", script_id);
			if let Some(on_error) = &on_error {
				on_error.call(());
			}
		})),
	};

	document.append_script(script)?;
	debug_log!("injected turnstile script {}", identity.script_id);
	Ok(InjectOutcome::Injected)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockDocument;
	use rstest::rstest;

	#[rstest]
	#[case(true, None, "cf-turnstile-script__box")]
	#[case(false, None, "cf-turnstile-script")]
	#[case(true, Some("custom"), "custom")]
	#[case(false, Some("custom"), "custom")]
	fn test_script_id_derivation(
		#[case] inject: bool,
		#[case] custom_id: Option<&str>,
		#[case] expected: &str,
	) {
		let mut options = ScriptOptions::default();
		options.id = custom_id.map(str::to_string);
		let identity = ScriptIdentity::for_container("box", &options, inject);

		assert_eq!(identity.script_id, expected);
		assert_eq!(identity.onload_name, "onloadTurnstileCallback__box");
	}

	#[rstest]
	fn test_custom_onload_name_is_suffixed() {
		let options = ScriptOptions::default().with_on_load_callback_name("myLoad");
		let identity = ScriptIdentity::for_container("w2", &options, true);
		assert_eq!(identity.onload_name, "myLoad__w2");
	}

	#[rstest]
	fn test_src_encodes_render_mode_and_callback() {
		let identity = ScriptIdentity::new("s", "onloadTurnstileCallback__cf-turnstile");
		assert_eq!(
			identity.src(),
			"https://challenges.cloudflare.com/turnstile/v0/api.js?onload=onloadTurnstileCallback__cf-turnstile&render=explicit"
		);
	}

	#[rstest]
	fn test_inject_sets_attributes() {
		let document = MockDocument::new();
		let identity = ScriptIdentity::new("s1", "cb");
		let options = ScriptOptions::default()
			.with_nonce("n0nce")
			.with_async(false)
			.with_cross_origin("anonymous");

		let outcome = inject_script(&document, &identity, &options).unwrap();

		assert_eq!(outcome, InjectOutcome::Injected);
		let scripts = document.scripts();
		assert_eq!(scripts.len(), 1);
		assert_eq!(scripts[0].id, "s1");
		assert!(scripts[0].defer);
		assert!(!scripts[0].is_async);
		assert_eq!(scripts[0].nonce.as_deref(), Some("n0nce"));
		assert_eq!(scripts[0].cross_origin.as_deref(), Some("anonymous"));
	}

	#[rstest]
	fn test_inject_is_idempotent_per_id() {
		let document = MockDocument::new();
		let identity = ScriptIdentity::new("s1", "cb");

		for _ in 0..5 {
			inject_script(&document, &identity, &ScriptOptions::default()).unwrap();
		}

		assert_eq!(document.script_count("s1"), 1);
	}

	#[rstest]
	fn test_inject_skips_duplicate_src_under_other_id() {
		let document = MockDocument::new();
		inject_script(&document, &ScriptIdentity::new("a", "cb"), &ScriptOptions::default())
			.unwrap();

		let outcome =
			inject_script(&document, &ScriptIdentity::new("b", "cb"), &ScriptOptions::default())
				.unwrap();

		assert_eq!(outcome, InjectOutcome::AlreadyPresent);
		assert_eq!(document.scripts().len(), 1);
	}

	#[rstest]
	fn test_load_failure_invokes_error_callback() {
		use std::cell::Cell;
		use std::rc::Rc;

		let document = MockDocument::new();
		let failed = Rc::new(Cell::new(false));
		let options = ScriptOptions::default().with_on_error({
			let failed = Rc::clone(&failed);
			move |_: ()| failed.set(true)
		});
		inject_script(&document, &ScriptIdentity::new("s1", "cb"), &options).unwrap();

		assert!(document.fail_script("s1"));
		assert!(failed.get());
	}
}
