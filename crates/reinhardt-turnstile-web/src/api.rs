//! `window.turnstile` called through `js_sys` reflection.

use std::cell::RefCell;
use std::collections::HashMap;

use reinhardt_turnstile_core::{ApiError, Callback, RenderParams, TurnstileApi, WidgetId};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::describe_js_error;

type JsCallback = Closure<dyn FnMut(JsValue)>;

fn exception(value: JsValue) -> ApiError {
	ApiError::Exception(describe_js_error(&value))
}

fn selector(container_id: &str) -> JsValue {
	JsValue::from_str(&format!("#{}", container_id))
}

/// The remote widget API object.
///
/// Widget callbacks are JS closures owned here, keyed by widget id (or by
/// container for `execute`), and released when the widget is removed.
pub struct BrowserTurnstile {
	object: JsValue,
	closures: RefCell<HashMap<String, Vec<JsCallback>>>,
}

impl BrowserTurnstile {
	pub(crate) fn new(object: JsValue) -> Self {
		Self {
			object,
			closures: RefCell::new(HashMap::new()),
		}
	}

	/// Whether this wraps exactly `object`.
	pub(crate) fn wraps(&self, object: &JsValue) -> bool {
		js_sys::Object::is(&self.object, object)
	}

	fn method(&self, name: &'static str) -> Result<js_sys::Function, ApiError> {
		js_sys::Reflect::get(&self.object, &JsValue::from_str(name))
			.ok()
			.and_then(|value| value.dyn_into::<js_sys::Function>().ok())
			.ok_or(ApiError::MissingMethod(name))
	}

	fn call1(&self, name: &'static str, arg: &JsValue) -> Result<JsValue, ApiError> {
		self.method(name)?.call1(&self.object, arg).map_err(exception)
	}

	fn call2(&self, name: &'static str, a: &JsValue, b: &JsValue) -> Result<JsValue, ApiError> {
		self.method(name)?.call2(&self.object, a, b).map_err(exception)
	}

	/// Builds the JS parameter object: serialized fields plus callback closures.
	fn to_js(params: &RenderParams) -> Result<(JsValue, Vec<JsCallback>), ApiError> {
		let json = params
			.to_json()
			.map_err(|err| ApiError::Exception(err.to_string()))?;
		let object = js_sys::JSON::parse(&json).map_err(exception)?;
		let mut closures = Vec::new();

		let callbacks = &params.callbacks;
		let with_text = |cb: &Option<Callback<String>>| {
			cb.clone().map(|cb| {
				JsCallback::new(move |value: JsValue| {
					let text = value
						.as_string()
						.or_else(|| value.as_f64().map(|n| n.to_string()))
						.unwrap_or_default();
					cb.call(text);
				})
			})
		};
		let without_args = |cb: &Option<Callback>| {
			cb.clone()
				.map(|cb| JsCallback::new(move |_: JsValue| cb.call(())))
		};

		let entries = [
			("callback", with_text(&callbacks.success)),
			("error-callback", with_text(&callbacks.error)),
			("expired-callback", without_args(&callbacks.expired)),
			(
				"before-interactive-callback",
				without_args(&callbacks.before_interactive),
			),
			(
				"after-interactive-callback",
				without_args(&callbacks.after_interactive),
			),
			("unsupported-callback", without_args(&callbacks.unsupported)),
			("timeout-callback", without_args(&callbacks.timeout)),
		];
		for (name, closure) in entries {
			if let Some(closure) = closure {
				js_sys::Reflect::set(&object, &JsValue::from_str(name), closure.as_ref())
					.map_err(exception)?;
				closures.push(closure);
			}
		}
		Ok((object, closures))
	}
}

impl TurnstileApi for BrowserTurnstile {
	fn render(&self, container_id: &str, params: &RenderParams) -> Result<WidgetId, ApiError> {
		let (object, closures) = Self::to_js(params)?;
		let id = self
			.call2("render", &selector(container_id), &object)?
			.as_string()
			.ok_or(ApiError::NoWidgetId)?;
		self.closures.borrow_mut().insert(id.clone(), closures);
		Ok(WidgetId::new(id))
	}

	fn execute(&self, container_id: &str, params: &RenderParams) -> Result<(), ApiError> {
		let (object, closures) = Self::to_js(params)?;
		self.call2("execute", &selector(container_id), &object)?;
		self.closures
			.borrow_mut()
			.insert(format!("execute:{}", container_id), closures);
		Ok(())
	}

	fn reset(&self, widget_id: &WidgetId) -> Result<(), ApiError> {
		self.call1("reset", &JsValue::from_str(widget_id.as_str()))?;
		Ok(())
	}

	fn remove(&self, widget_id: &WidgetId) -> Result<(), ApiError> {
		let result = self.call1("remove", &JsValue::from_str(widget_id.as_str()));
		let closures = self.closures.borrow_mut().remove(widget_id.as_str());
		drop(closures);
		result.map(|_| ())
	}

	fn get_response(&self, widget_id: &WidgetId) -> Result<Option<String>, ApiError> {
		let value = self.call1("getResponse", &JsValue::from_str(widget_id.as_str()))?;
		Ok(value.as_string())
	}

	fn is_expired(&self, widget_id: &WidgetId) -> Result<bool, ApiError> {
		let value = self.call1("isExpired", &JsValue::from_str(widget_id.as_str()))?;
		Ok(value.as_bool().unwrap_or(false))
	}
}

impl std::fmt::Debug for BrowserTurnstile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserTurnstile")
			.field("widgets", &self.closures.borrow().keys().collect::<Vec<_>>())
			.finish()
	}
}
