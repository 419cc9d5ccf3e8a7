//! Reinhardt Turnstile Web - browser host
//!
//! Implements the `reinhardt-turnstile-core` host traits over `web-sys`:
//!
//! - [`BrowserDocument`]: element lookup, `<script>` injection, container
//!   styling and a `MutationObserver` subscription
//! - [`BrowserWindow`]: `window.turnstile` and the global load-callback
//!   properties
//! - [`BrowserTurnstile`]: the remote widget API, called through `js_sys`
//!   reflection
//!
//! Everything here only exists on `wasm32`.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_turnstile_core::{Turnstile, TurnstileProps};
//! use reinhardt_turnstile_web::browser_environment;
//!
//! let turnstile = Turnstile::new(TurnstileProps::new(SITE_KEY), browser_environment()?);
//! turnstile.mount();
//! ```

#[cfg(target_arch = "wasm32")]
mod api;
#[cfg(target_arch = "wasm32")]
mod document;
#[cfg(target_arch = "wasm32")]
mod window;

#[cfg(target_arch = "wasm32")]
pub use api::BrowserTurnstile;
#[cfg(target_arch = "wasm32")]
pub use document::BrowserDocument;
#[cfg(target_arch = "wasm32")]
pub use window::BrowserWindow;

/// Environment backed by the current page and the thread's shared gate.
#[cfg(target_arch = "wasm32")]
pub fn browser_environment()
-> Result<reinhardt_turnstile_core::Environment, reinhardt_turnstile_core::DomError> {
	use std::rc::Rc;

	let document = BrowserDocument::new()?;
	let window = BrowserWindow::new()?;
	Ok(reinhardt_turnstile_core::Environment::new(
		Rc::new(document),
		Rc::new(window),
	))
}

/// Stringifies a thrown JavaScript value.
#[cfg(target_arch = "wasm32")]
pub(crate) fn describe_js_error(value: &wasm_bindgen::JsValue) -> String {
	use wasm_bindgen::JsCast;

	if let Some(error) = value.dyn_ref::<js_sys::Error>() {
		return String::from(error.message());
	}
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
