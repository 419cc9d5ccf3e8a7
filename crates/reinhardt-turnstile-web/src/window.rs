//! `web_sys::Window` host.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use reinhardt_turnstile_core::{Callback, DomError, TurnstileApi, Window, debug_log};
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use crate::api::BrowserTurnstile;
use crate::describe_js_error;

/// The global scope.
///
/// Keeps the closures behind the global load callbacks alive until they are
/// removed, and hands out one [`BrowserTurnstile`] per `window.turnstile`
/// object so widget callbacks survive between calls.
pub struct BrowserWindow {
	window: web_sys::Window,
	callbacks: RefCell<HashMap<String, Closure<dyn FnMut()>>>,
	api: RefCell<Option<Rc<BrowserTurnstile>>>,
}

impl BrowserWindow {
	/// The current window.
	pub fn new() -> Result<Self, DomError> {
		let window = web_sys::window().ok_or(DomError::NoDocument)?;
		Ok(Self::from_window(window))
	}

	/// Wraps an existing window.
	pub fn from_window(window: web_sys::Window) -> Self {
		Self {
			window,
			callbacks: RefCell::new(HashMap::new()),
			api: RefCell::new(None),
		}
	}
}

impl Window for BrowserWindow {
	fn turnstile(&self) -> Option<Rc<dyn TurnstileApi>> {
		let object = js_sys::Reflect::get(&self.window, &JsValue::from_str("turnstile")).ok()?;
		if object.is_undefined() || object.is_null() {
			return None;
		}

		let mut cached = self.api.borrow_mut();
		let api: Rc<BrowserTurnstile> = match cached.as_ref() {
			Some(api) if api.wraps(&object) => Rc::clone(api),
			_ => {
				let api = Rc::new(BrowserTurnstile::new(object));
				*cached = Some(Rc::clone(&api));
				api
			}
		};
		Some(api as Rc<dyn TurnstileApi>)
	}

	fn set_global_callback(&self, name: &str, callback: Callback) -> Result<(), DomError> {
		let closure = Closure::<dyn FnMut()>::new(move || callback.call(()));
		js_sys::Reflect::set(&self.window, &JsValue::from_str(name), closure.as_ref())
			.map_err(|err| DomError::Operation(describe_js_error(&err)))?;
		self.callbacks.borrow_mut().insert(name.to_string(), closure);
		debug_log!("defined window.{}", name);
		Ok(())
	}

	fn remove_global_callback(&self, name: &str) {
		let _ = js_sys::Reflect::delete_property(&self.window, &JsValue::from_str(name));
		let closure = self.callbacks.borrow_mut().remove(name);
		drop(closure);
	}
}

impl std::fmt::Debug for BrowserWindow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserWindow")
			.field("callbacks", &self.callbacks.borrow().keys().collect::<Vec<_>>())
			.finish()
	}
}
