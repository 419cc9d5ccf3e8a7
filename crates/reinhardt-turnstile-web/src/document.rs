//! `web_sys::Document` host.

use std::rc::Rc;

use reinhardt_turnstile_core::{
	AppendTarget, ContainerStyle, Document, DomError, Observation, ScriptElement,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlElement, HtmlScriptElement, MutationObserver, MutationObserverInit};

use crate::describe_js_error;

fn dom_error(value: wasm_bindgen::JsValue) -> DomError {
	DomError::Operation(describe_js_error(&value))
}

/// The page document.
#[derive(Debug, Clone)]
pub struct BrowserDocument {
	document: web_sys::Document,
}

impl BrowserDocument {
	/// Document of the current window.
	pub fn new() -> Result<Self, DomError> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or(DomError::NoDocument)?;
		Ok(Self { document })
	}

	/// Wraps an existing document.
	pub fn from_document(document: web_sys::Document) -> Self {
		Self { document }
	}

	fn append_target(&self, target: AppendTarget) -> Result<HtmlElement, DomError> {
		let parent = match target {
			AppendTarget::Head => self.document.head().map(HtmlElement::from),
			AppendTarget::Body => self.document.body(),
		};
		parent.ok_or(DomError::MissingAppendTarget(target.tag_name()))
	}
}

impl Document for BrowserDocument {
	fn contains_element(&self, id: &str) -> bool {
		self.document.get_element_by_id(id).is_some()
	}

	fn contains_script_src(&self, src: &str) -> bool {
		let scripts = self.document.scripts();
		(0..scripts.length())
			.filter_map(|index| scripts.item(index))
			.any(|script| script.get_attribute("src").as_deref() == Some(src))
	}

	fn append_script(&self, script: ScriptElement) -> Result<(), DomError> {
		let element: HtmlScriptElement = self
			.document
			.create_element("script")
			.map_err(dom_error)?
			.dyn_into()
			.map_err(|_| DomError::Operation("created element is not a <script>".to_string()))?;

		element.set_id(&script.id);
		element.set_src(&script.src);
		element.set_defer(script.defer);
		element.set_async(script.is_async);
		if let Some(nonce) = &script.nonce {
			element.set_attribute("nonce", nonce).map_err(dom_error)?;
		}
		if let Some(cross_origin) = &script.cross_origin {
			element.set_cross_origin(Some(cross_origin.as_str()));
		}
		if let Some(on_error) = script.on_error {
			let handler = Closure::once_into_js(move || on_error.call(()));
			element.set_onerror(Some(handler.unchecked_ref()));
		}

		self.append_target(script.append_to)?
			.append_child(&element)
			.map_err(dom_error)?;
		Ok(())
	}

	fn set_container_style(&self, container_id: &str, style: &ContainerStyle) -> Result<(), DomError> {
		let element: HtmlElement = self
			.document
			.get_element_by_id(container_id)
			.ok_or_else(|| DomError::Operation(format!("element #{} not found", container_id)))?
			.dyn_into()
			.map_err(|_| DomError::Operation(format!("#{} is not an HTML element", container_id)))?;

		let declaration = element.style();
		for (property, value) in style.properties() {
			let result = match value {
				Some(value) => declaration.set_property(property, &value),
				None => declaration.remove_property(property).map(|_| ()),
			};
			result.map_err(dom_error)?;
		}
		Ok(())
	}

	fn observe_mutations(&self, on_mutation: Rc<dyn Fn()>) -> Result<Observation, DomError> {
		let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
			move |_records: js_sys::Array, _observer: MutationObserver| on_mutation(),
		);
		let observer =
			MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(dom_error)?;

		let init = MutationObserverInit::new();
		init.set_child_list(true);
		init.set_subtree(true);
		observer
			.observe_with_options(&self.document, &init)
			.map_err(dom_error)?;

		Ok(Observation::new(move || {
			observer.disconnect();
			drop(callback);
		}))
	}

	fn observe_script_load(
		&self,
		script_id: &str,
		on_load: Rc<dyn Fn()>,
	) -> Result<Observation, DomError> {
		let Some(element) = self.document.get_element_by_id(script_id) else {
			return Ok(Observation::detached());
		};
		let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
			on_load()
		});
		element
			.add_event_listener_with_callback("load", callback.as_ref().unchecked_ref())
			.map_err(dom_error)?;

		Ok(Observation::new(move || {
			let _ = element
				.remove_event_listener_with_callback("load", callback.as_ref().unchecked_ref());
			drop(callback);
		}))
	}
}
